use chrono::{TimeZone, Utc};
use common::{OrderId, ScheduleId, TicketTypeId, UserId};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{Money, NewOrder, Order, PassengerDetails, PaymentMethod, ScheduleSnapshot};

fn sample_new_order() -> NewOrder {
    let dep = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let arr = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    NewOrder {
        user_ref: UserId::new(1),
        user_email_snapshot: Some("bench@example.com".to_string()),
        schedule_ref: ScheduleId::new(10),
        schedule_snapshot: ScheduleSnapshot::new("SE1", "Ha Noi", "Da Nang", dep, arr, 270),
        ticket_type_ref: TicketTypeId::new(5),
        ticket_type_name_snapshot: Some("Soft seat".to_string()),
        quantity: 3,
        total_amount: Money::from_cents(36000),
        payment_method: PaymentMethod::CreditCard,
        passenger_details: PassengerDetails::default(),
    }
}

fn bench_order_lifecycle(c: &mut Criterion) {
    c.bench_function("order_confirm_cancel", |b| {
        let new = sample_new_order();
        b.iter(|| {
            let mut order = Order::from_new(black_box(new.clone()), OrderId::new(1), Utc::now());
            order.confirm(Utc::now()).unwrap();
            order.cancel().unwrap();
            black_box(order)
        })
    });

    c.bench_function("money_total", |b| {
        b.iter(|| black_box(Money::from_cents(12000)).multiply(black_box(3)))
    });
}

criterion_group!(benches, bench_order_lifecycle);
criterion_main!(benches);

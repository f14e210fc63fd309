use log::*;
use settlement_engine::events::{EventHandlers, EventHooks};

pub const AUDIT_EVENT_BUFFER_SIZE: usize = 25;

/// Event handlers that write an audit line for every settlement event.
pub fn create_audit_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_succeeded(|ev| {
            let p = ev.payment;
            info!("📬️ Payment [{}] of {} for order {} succeeded ({})", p.reference, p.amount, p.order_id, p.method);
            Box::pin(async {})
        })
        .on_payment_failed(|ev| {
            let p = ev.payment;
            info!("📬️ Payment [{}] for order {} failed. {}", p.reference, p.order_id, ev.reason);
            Box::pin(async {})
        })
        .on_order_paid(|ev| {
            info!(
                "📬️ Order {} for {} is paid by [{}]. Ready for fulfilment.",
                ev.order.order_id, ev.order.user_id, ev.payment.reference
            );
            Box::pin(async {})
        });
    EventHandlers::new(AUDIT_EVENT_BUFFER_SIZE, hooks)
}

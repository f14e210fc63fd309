//! Steps that move a payment (and its order) into a final state. They are shared by the orchestrator, which finalizes
//! wallet payments synchronously, and by reconciliation, which finalizes whatever the orchestrator left behind.
use std::time::Duration;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{LedgerEntryType, Order, OrderStatusUpdate, Payment, PaymentMethod, PaymentReference, PaymentStatus},
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent, PaymentSucceededEvent},
    traits::{LedgerError, OrderUpdateResult, PaymentStatusChange, SettlementDatabase},
    SettlementError,
};

pub(crate) enum WalletFinalization {
    /// The order is paid and the payment is `Success`.
    Paid(Payment),
    /// The order could no longer accept the payment. The debit has been refunded and the payment is `Failed`.
    Compensated { payment: Payment, error: SettlementError },
    /// Another debited attempt for the same order is still in flight. Nothing was changed.
    Deferred(Payment),
}

/// Who paid an order that is already marked paid.
enum PaidBy {
    Another,
    This,
    Undecided,
}

/// Marks a pending payment as failed and notifies subscribers. Does nothing if the payment is already terminal.
pub(crate) async fn mark_failed<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    reference: &PaymentReference,
    reason: &str,
) -> Result<PaymentStatusChange, SettlementError> {
    let change = db.update_payment_status(reference, PaymentStatus::Failed).await?;
    if let PaymentStatusChange::Changed(payment) = &change {
        info!("💸️ Payment [{reference}] failed. {reason}");
        producers.publish_payment_failed(PaymentFailedEvent::new(payment.clone(), reason)).await;
    }
    Ok(change)
}

/// Applies a completed wallet debit to its order.
///
/// The order transition is requested first. If the order store rejects it (another attempt paid the order, or it was
/// cancelled in the meantime), the payment is failed and the debit is returned to the wallet.
pub(crate) async fn finalize_wallet_debit<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    payment: Payment,
) -> Result<WalletFinalization, SettlementError> {
    match db.update_order_status(&payment.order_id, OrderStatusUpdate::paid_and_processing()).await? {
        OrderUpdateResult::Applied(order) => pay_order(db, producers, &payment.reference, order).await,
        OrderUpdateResult::Rejected(order) => compensate(db, producers, payment, &order).await,
    }
}

/// Finishes a debited wallet payment that an earlier attempt left `Pending`.
///
/// This differs from [`finalize_wallet_debit`] when the order is already paid. The earlier attempt may have paid the
/// order and stopped before marking the payment. So the debit is only refunded if another payment for the order has
/// succeeded. If the only other candidates are debited wallet attempts that are still in flight, nothing is decided
/// until the next pass. Of several abandoned candidates, the oldest claims the order.
pub(crate) async fn resume_wallet_debit<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    payment: Payment,
    older_than: Duration,
) -> Result<WalletFinalization, SettlementError> {
    let reference = payment.reference.clone();
    match db.update_order_status(&payment.order_id, OrderStatusUpdate::paid_and_processing()).await? {
        OrderUpdateResult::Applied(order) => pay_order(db, producers, &reference, order).await,
        OrderUpdateResult::Rejected(order) if order.is_paid() => match paid_by(db, &payment, older_than).await? {
            PaidBy::This => {
                info!("💸️ Order {} was already paid by [{reference}]. Completing the payment.", order.order_id);
                pay_order(db, producers, &reference, order).await
            },
            PaidBy::Another => compensate(db, producers, payment, &order).await,
            PaidBy::Undecided => {
                debug!("💸️ Another debited attempt for order {} is in flight. [{reference}] waits.", order.order_id);
                Ok(WalletFinalization::Deferred(payment))
            },
        },
        OrderUpdateResult::Rejected(order) => compensate(db, producers, payment, &order).await,
    }
}

/// Credits a failed wallet payment's debit back to the wallet. A reference is only ever refunded once, so calling this
/// again is harmless.
pub(crate) async fn return_debit<B: SettlementDatabase>(db: &B, payment: &Payment) -> Result<(), SettlementError> {
    let reference = &payment.reference;
    match db.refund(&payment.user_id, payment.amount, reference.as_str()).await {
        Ok(wallet) => {
            let (amount, user_id) = (payment.amount, &payment.user_id);
            info!("💸️ Refunded {amount} to {user_id} for [{reference}]. Balance: {}", wallet.balance);
            Ok(())
        },
        Err(LedgerError::DuplicateEntry(_)) => {
            debug!("💸️ [{reference}] has already been refunded");
            Ok(())
        },
        Err(e) => {
            error!("💸️ Could not refund {} to {} for [{reference}]. {e}", payment.amount, payment.user_id);
            Err(e.into())
        },
    }
}

async fn pay_order<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    reference: &PaymentReference,
    order: Order,
) -> Result<WalletFinalization, SettlementError> {
    let payment = match db.update_payment_status(reference, PaymentStatus::Success).await? {
        PaymentStatusChange::Changed(p) => {
            producers.publish_payment_succeeded(PaymentSucceededEvent::new(p.clone())).await;
            p
        },
        PaymentStatusChange::Unchanged(p) => {
            error!(
                "💸️ Order {} was paid by [{reference}], but the payment was already {}. This needs manual attention.",
                order.order_id, p.status
            );
            p
        },
    };
    info!("💸️ Order {} paid from wallet of {} with [{reference}]", order.order_id, order.user_id);
    producers.publish_order_paid(OrderPaidEvent::new(order, payment.clone())).await;
    Ok(WalletFinalization::Paid(payment))
}

async fn compensate<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    payment: Payment,
    order: &Order,
) -> Result<WalletFinalization, SettlementError> {
    let error = if order.is_cancelled() {
        SettlementError::OrderCancelled(order.order_id.clone())
    } else {
        SettlementError::OrderAlreadyPaid(order.order_id.clone())
    };
    warn!("💸️ Order {} cannot accept wallet payment [{}]. {error}. Refunding.", order.order_id, payment.reference);
    let payment = refund_wallet_payment(db, producers, payment, &error.to_string()).await?;
    Ok(WalletFinalization::Compensated { payment, error })
}

async fn paid_by<B: SettlementDatabase>(
    db: &B,
    payment: &Payment,
    older_than: Duration,
) -> Result<PaidBy, SettlementError> {
    let others = db.fetch_payments_for_order(&payment.order_id).await?;
    let others = others.into_iter().filter(|p| p.reference != payment.reference).collect::<Vec<_>>();
    if others.iter().any(|p| p.status == PaymentStatus::Success) {
        return Ok(PaidBy::Another);
    }
    for other in others.iter().filter(|p| p.status == PaymentStatus::Pending && p.method == PaymentMethod::Wallet) {
        let age = Utc::now().signed_duration_since(other.created_at).to_std().unwrap_or_default();
        let contender = other.id < payment.id || age < older_than;
        if contender && is_debited(db, other).await? {
            return Ok(PaidBy::Undecided);
        }
    }
    Ok(PaidBy::This)
}

async fn is_debited<B: SettlementDatabase>(db: &B, payment: &Payment) -> Result<bool, SettlementError> {
    let entries = db.ledger_entries_for_reference(payment.reference.as_str()).await?;
    Ok(entries.iter().any(|e| e.entry_type == LedgerEntryType::Debit))
}

/// Fails a debited wallet payment and returns the funds. The payment status is the claim: only the caller that moves
/// it out of `Pending` issues the refund. A refund that cannot be written is picked up again by the sweep.
async fn refund_wallet_payment<B: SettlementDatabase>(
    db: &B,
    producers: &EventProducers,
    payment: Payment,
    reason: &str,
) -> Result<Payment, SettlementError> {
    let reference = payment.reference.clone();
    let change = mark_failed(db, producers, &reference, reason).await?;
    if !change.is_changed() {
        debug!("💸️ Payment [{reference}] was already finalized. No refund issued.");
        return Ok(change.into_payment());
    }
    return_debit(db, &payment).await?;
    Ok(change.into_payment())
}

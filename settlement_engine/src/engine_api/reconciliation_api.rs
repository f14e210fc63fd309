use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db_types::{
        ConfirmationStatus,
        OrderPaymentStatus,
        OrderStatusUpdate,
        Payment,
        PaymentMethod,
        PaymentReference,
        PaymentStatus,
    },
    engine_api::finalize::{mark_failed, resume_wallet_debit, return_debit, WalletFinalization},
    events::{EventProducers, OrderPaidEvent, PaymentSucceededEvent},
    traits::{
        GatewayError,
        GatewayVerification,
        OrderUpdateResult,
        PaymentGateway,
        PaymentStatusChange,
        SettlementDatabase,
    },
    ReconciliationSummary,
    SettlementConfig,
    SettlementError,
};

/// `ReconciliationApi` finalizes payments that the orchestrator could not finish synchronously.
///
/// Confirmations are delivered by the gateway, possibly more than once and possibly before the payment they refer to
/// is visible. Applying a confirmation is idempotent by reference: the first one moves the payment out of `Pending`
/// and every later one is a no-op.
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
    config: SettlementConfig,
    producers: EventProducers,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({:?})", self.config)
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(db: B, gateway: G, config: SettlementConfig, producers: EventProducers) -> Self {
        Self { db, gateway, config, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    /// Applies a gateway confirmation to the payment identified by `reference`, and then to its order.
    ///
    /// * If the payment is already `Success` or `Failed`, the stored payment is returned. A successful gateway payment
    ///   whose order was never moved to paid (the process stopped between the two writes) gets its order paid now.
    /// * On `Success`, the payment is marked `Success` and the order is moved to paid and processing. If the order was
    ///   already paid by another attempt, the payment still stands and a warning is logged, since the customer has
    ///   now paid twice.
    /// * On `Failed`, the payment is marked `Failed` and a pending order goes back to `Failed` so the customer can
    ///   retry.
    ///
    /// ## Failure modes
    /// * `PaymentNotFound` if the payment still cannot be found after the configured retries.
    /// * `UnexpectedConfirmation` if the reference belongs to a wallet payment.
    pub async fn apply_confirmation(
        &self,
        reference: &PaymentReference,
        status: ConfirmationStatus,
    ) -> Result<Payment, SettlementError> {
        debug!("🧾️ Confirmation received for [{reference}]: {status}");
        let payment = self.find_payment(reference).await?;
        if payment.status.is_terminal() {
            debug!("🧾️ Payment [{reference}] is already {}. Confirmation ignored.", payment.status);
            if payment.status == PaymentStatus::Success && payment.method == PaymentMethod::Gateway {
                self.ensure_order_paid(&payment).await?;
            }
            return Ok(payment);
        }
        if payment.method == PaymentMethod::Wallet {
            warn!("🧾️ Received a gateway confirmation for wallet payment [{reference}]. Ignoring it.");
            return Err(SettlementError::UnexpectedConfirmation(reference.clone()));
        }
        match status {
            ConfirmationStatus::Success => self.confirm_success(reference).await,
            ConfirmationStatus::Failed => self.confirm_failure(reference).await,
        }
    }

    /// Finalizes payments that have been `Pending` for at least `older_than`.
    ///
    /// Gateway payments are verified with the gateway and the verdict applied as a confirmation. Wallet payments are
    /// attempts that stopped part way: if the wallet was never debited the reference is voided and the payment failed,
    /// otherwise the debit is applied to the order as the orchestrator would have done.
    ///
    /// Failed wallet payments whose refund was never written are refunded as well.
    ///
    /// One payment failing to reconcile does not stop the sweep; it is counted and retried next time.
    pub async fn reconcile_stale_payments(
        &self,
        older_than: Duration,
    ) -> Result<ReconciliationSummary, SettlementError> {
        let stale = self.db.fetch_stale_pending_payments(older_than).await?;
        let mut summary = ReconciliationSummary::default();
        self.refund_failed_wallet_payments(&mut summary).await?;
        if stale.is_empty() {
            trace!("🧾️ No stale payments to reconcile");
            return Ok(summary);
        }
        info!("🧾️ Reconciling {} stale pending payments", stale.len());
        for payment in stale {
            let reference = payment.reference.clone();
            let result = match payment.method {
                PaymentMethod::Gateway => self.reconcile_gateway_payment(payment).await,
                PaymentMethod::Wallet => self.reconcile_wallet_payment(payment, older_than).await,
            };
            match result {
                Ok(p) => match p.status {
                    PaymentStatus::Success => summary.succeeded += 1,
                    PaymentStatus::Failed => summary.failed += 1,
                    PaymentStatus::Pending => summary.still_pending += 1,
                },
                Err(e) => {
                    warn!("🧾️ Could not reconcile [{reference}]. {e}");
                    summary.errors += 1;
                },
            }
        }
        info!(
            "🧾️ Reconciliation complete. {} succeeded, {} failed, {} still pending, {} refunded, {} errors",
            summary.succeeded, summary.failed, summary.still_pending, summary.refunded, summary.errors
        );
        Ok(summary)
    }

    async fn find_payment(&self, reference: &PaymentReference) -> Result<Payment, SettlementError> {
        let policy = self.config.confirmation_retries;
        for attempt in 1..=policy.attempts {
            if let Some(payment) = self.db.fetch_payment_by_reference(reference).await? {
                return Ok(payment);
            }
            if attempt < policy.attempts {
                trace!("🧾️ Payment [{reference}] is not visible yet ({attempt}/{}). Retrying.", policy.attempts);
                tokio::time::sleep(policy.delay).await;
            }
        }
        warn!("🧾️ No payment found for [{reference}] after {} attempts", policy.attempts);
        Err(SettlementError::PaymentNotFound(reference.clone()))
    }

    async fn confirm_success(&self, reference: &PaymentReference) -> Result<Payment, SettlementError> {
        let payment = match self.db.update_payment_status(reference, ConfirmationStatus::Success.into()).await? {
            PaymentStatusChange::Changed(p) => p,
            PaymentStatusChange::Unchanged(p) => {
                debug!("🧾️ Payment [{reference}] was finalized concurrently as {}", p.status);
                return Ok(p);
            },
        };
        self.producers.publish_payment_succeeded(PaymentSucceededEvent::new(payment.clone())).await;
        match self.db.update_order_status(&payment.order_id, OrderStatusUpdate::paid_and_processing()).await? {
            OrderUpdateResult::Applied(order) => {
                info!("🧾️ Order {} paid via gateway with [{reference}]", order.order_id);
                self.producers.publish_order_paid(OrderPaidEvent::new(order, payment.clone())).await;
            },
            OrderUpdateResult::Rejected(order) => {
                warn!(
                    "🧾️ Gateway payment [{reference}] of {} succeeded, but order {} is {} / {}. The customer must be \
                     refunded manually.",
                    payment.amount, order.order_id, order.payment_status, order.order_status
                );
            },
        }
        Ok(payment)
    }

    async fn confirm_failure(&self, reference: &PaymentReference) -> Result<Payment, SettlementError> {
        let change = mark_failed(&self.db, &self.producers, reference, "The gateway reported the transaction as failed")
            .await?;
        if let PaymentStatusChange::Changed(payment) = &change {
            let update = OrderStatusUpdate::payment_status(OrderPaymentStatus::Failed);
            if let OrderUpdateResult::Applied(order) = self.db.update_order_status(&payment.order_id, update).await? {
                debug!("🧾️ Order {} is open for payment again", order.order_id);
            }
        }
        Ok(change.into_payment())
    }

    async fn reconcile_gateway_payment(&self, payment: Payment) -> Result<Payment, SettlementError> {
        let reference = payment.reference.clone();
        let call = self.gateway.verify(&reference);
        let verdict = match tokio::time::timeout(self.config.gateway_timeout, call).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(GatewayError::Timeout)) | Err(_) => return Err(SettlementError::GatewayTimeout(reference)),
            Ok(Err(e)) => return Err(e.into()),
        };
        debug!("🧾️ Gateway reports [{reference}] as {verdict:?}");
        match verdict {
            GatewayVerification::Success => self.apply_confirmation(&reference, ConfirmationStatus::Success).await,
            GatewayVerification::Failed => self.apply_confirmation(&reference, ConfirmationStatus::Failed).await,
            GatewayVerification::Pending => Ok(payment),
        }
    }

    /// Requests the paid transition for the order of a successful gateway payment. Safe to repeat: a paid order
    /// rejects the request and stays as it is.
    async fn ensure_order_paid(&self, payment: &Payment) -> Result<(), SettlementError> {
        let reference = &payment.reference;
        match self.db.update_order_status(&payment.order_id, OrderStatusUpdate::paid_and_processing()).await? {
            OrderUpdateResult::Applied(order) => {
                info!("🧾️ Order {} paid with [{reference}] on a repeated confirmation", order.order_id);
                self.producers.publish_order_paid(OrderPaidEvent::new(order, payment.clone())).await;
            },
            OrderUpdateResult::Rejected(order) => {
                trace!("🧾️ Order {} is {} / {}. Nothing to do.", order.order_id, order.payment_status, order.order_status)
            },
        }
        Ok(())
    }

    async fn refund_failed_wallet_payments(&self, summary: &mut ReconciliationSummary) -> Result<(), SettlementError> {
        let unrefunded = self.db.fetch_unrefunded_wallet_payments().await?;
        for payment in unrefunded {
            warn!("🧾️ Wallet payment [{}] failed without a refund. Refunding it now.", payment.reference);
            match return_debit(&self.db, &payment).await {
                Ok(()) => summary.refunded += 1,
                Err(e) => {
                    warn!("🧾️ Could not refund [{}]. {e}", payment.reference);
                    summary.errors += 1;
                },
            }
        }
        Ok(())
    }

    async fn reconcile_wallet_payment(
        &self,
        payment: Payment,
        older_than: Duration,
    ) -> Result<Payment, SettlementError> {
        let reference = payment.reference.clone();
        if self.db.void_reference(&payment.user_id, reference.as_str()).await? {
            info!("🧾️ Wallet payment [{reference}] never debited the wallet. It has been voided.");
            let change = mark_failed(&self.db, &self.producers, &reference, "Abandoned before the wallet was debited")
                .await?;
            return Ok(change.into_payment());
        }
        info!("🧾️ Wallet payment [{reference}] was debited but never applied. Applying it now.");
        match resume_wallet_debit(&self.db, &self.producers, payment, older_than).await? {
            WalletFinalization::Paid(p) | WalletFinalization::Deferred(p) => Ok(p),
            WalletFinalization::Compensated { payment, .. } => Ok(payment),
        }
    }
}

use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{
        NewPayment,
        Order,
        OrderId,
        OrderPaymentStatus,
        OrderStatusUpdate,
        Payment,
        PaymentMethod,
        PaymentReference,
    },
    engine_api::finalize::{finalize_wallet_debit, mark_failed, WalletFinalization},
    events::EventProducers,
    helpers::{new_payment_reference, ReferenceGenerator},
    traits::{GatewayError, InsertPaymentResult, OrderUpdateResult, PaymentGateway, SettlementDatabase},
    SettlementConfig,
    SettlementError,
    SettlementOutcome,
    SettlementRequest,
};

const MAX_REFERENCE_ATTEMPTS: usize = 2;

/// `SettlementApi` is the payment orchestrator. It validates a payment request against its order, records the
/// attempt, and settles it from the customer's wallet or through the payment gateway.
///
/// There is no transaction spanning the wallet, the payment record and the order. Instead, every attempt is written
/// as a `Pending` payment before any money moves, each store change is a single conditional update, and anything left
/// half-done is finished by [`crate::ReconciliationApi`].
pub struct SettlementApi<B, G> {
    db: B,
    gateway: G,
    config: SettlementConfig,
    producers: EventProducers,
    reference_generator: ReferenceGenerator,
}

impl<B, G> Debug for SettlementApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.config)
    }
}

impl<B, G> SettlementApi<B, G> {
    pub fn new(db: B, gateway: G, config: SettlementConfig, producers: EventProducers) -> Self {
        let reference_generator: ReferenceGenerator = Arc::new(new_payment_reference);
        Self { db, gateway, config, producers, reference_generator }
    }

    /// Replaces the source of payment references.
    pub fn with_reference_generator(mut self, generator: ReferenceGenerator) -> Self {
        self.reference_generator = generator;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }
}

impl<B, G> SettlementApi<B, G>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    /// Settles an order.
    ///
    /// The request is validated before anything is written: the amount must be positive, and the order must exist,
    /// belong to the requesting user, still be payable, and cost exactly `amount`.
    ///
    /// A `Pending` payment is then recorded under a fresh reference, and
    /// * for wallet payments, the wallet is debited and the order marked paid and processing. The returned payment is
    ///   `Success`. If the debit fails, the payment is marked `Failed` and the ledger error is returned.
    /// * for gateway payments, a transaction is started with the gateway and the customer's redirect URL returned.
    ///   The payment stays `Pending` until the gateway confirms it. If the gateway refuses or cannot be reached the
    ///   payment is marked `Failed` and `GatewayUnavailable` returned. If it does not answer in time, the payment is
    ///   left `Pending` for reconciliation and `GatewayTimeout` is returned.
    pub async fn settle(&self, request: SettlementRequest) -> Result<SettlementOutcome, SettlementError> {
        trace!("💸️ Settlement requested: {request:?}");
        let order = self.validate(&request).await?;
        let payment = self.record_intent(&request).await?;
        debug!(
            "💸️ Payment [{}] of {} for order {} recorded as pending ({})",
            payment.reference, payment.amount, order.order_id, payment.method
        );
        match request.payment_method {
            PaymentMethod::Wallet => self.settle_from_wallet(payment).await,
            PaymentMethod::Gateway => self.settle_with_gateway(payment, &request.email).await,
        }
    }

    pub async fn fetch_payment(&self, reference: &PaymentReference) -> Result<Payment, SettlementError> {
        self.db
            .fetch_payment_by_reference(reference)
            .await?
            .ok_or_else(|| SettlementError::PaymentNotFound(reference.clone()))
    }

    pub async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, SettlementError> {
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        Ok(payments)
    }

    async fn validate(&self, request: &SettlementRequest) -> Result<Order, SettlementError> {
        if !request.amount.is_positive() {
            return Err(SettlementError::InvalidAmount(request.amount));
        }
        let order = self
            .db
            .fetch_order(&request.order_id)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(request.order_id.clone()))?;
        if order.user_id != request.user_id {
            warn!("💸️ {} tried to pay for order {}, which belongs to {}", request.user_id, order.order_id, order.user_id);
            return Err(SettlementError::OrderOwnershipMismatch {
                order_id: order.order_id,
                user_id: request.user_id.clone(),
            });
        }
        if order.is_paid() {
            return Err(SettlementError::OrderAlreadyPaid(order.order_id));
        }
        if order.is_cancelled() {
            return Err(SettlementError::OrderCancelled(order.order_id));
        }
        if order.total_price != request.amount {
            return Err(SettlementError::AmountMismatch { expected: order.total_price, actual: request.amount });
        }
        Ok(order)
    }

    /// Writes the attempt as a `Pending` payment. A reference collision is retried once with a new reference.
    async fn record_intent(&self, request: &SettlementRequest) -> Result<Payment, SettlementError> {
        let mut reference = (self.reference_generator)();
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let payment = NewPayment::new(
                reference.clone(),
                request.order_id.clone(),
                request.user_id.clone(),
                request.amount,
                request.payment_method,
            );
            match self.db.insert_payment(payment).await? {
                InsertPaymentResult::Inserted(p) => return Ok(p),
                InsertPaymentResult::AlreadyExists => {
                    warn!("💸️ Payment reference [{reference}] is already taken (attempt {attempt})");
                    if attempt < MAX_REFERENCE_ATTEMPTS {
                        reference = (self.reference_generator)();
                    }
                },
            }
        }
        Err(SettlementError::DuplicateReference(reference))
    }

    async fn settle_from_wallet(&self, payment: Payment) -> Result<SettlementOutcome, SettlementError> {
        let reference = payment.reference.clone();
        if let Err(e) = self.db.debit(&payment.user_id, payment.amount, reference.as_str()).await {
            info!("💸️ Wallet debit for [{reference}] was refused. {e}");
            mark_failed(&self.db, &self.producers, &reference, &e.to_string()).await?;
            return Err(e.into());
        }
        match finalize_wallet_debit(&self.db, &self.producers, payment).await? {
            WalletFinalization::Paid(payment) => Ok(SettlementOutcome { payment, payment_url: None }),
            WalletFinalization::Compensated { error, .. } => Err(error),
            WalletFinalization::Deferred(payment) => Ok(SettlementOutcome { payment, payment_url: None }),
        }
    }

    async fn settle_with_gateway(&self, payment: Payment, email: &str) -> Result<SettlementOutcome, SettlementError> {
        let reference = payment.reference.clone();
        let call = self.gateway.initialize(&reference, payment.amount, email);
        let authorization = match tokio::time::timeout(self.config.gateway_timeout, call).await {
            Ok(Ok(authorization)) => authorization,
            Ok(Err(GatewayError::Timeout)) | Err(_) => {
                warn!("💸️ Gateway did not answer in time for [{reference}]. Leaving it pending for reconciliation.");
                return Err(SettlementError::GatewayTimeout(reference));
            },
            Ok(Err(e)) => {
                warn!("💸️ Gateway could not start a transaction for [{reference}]. {e}");
                mark_failed(&self.db, &self.producers, &reference, &e.to_string()).await?;
                return Err(SettlementError::from(e));
            },
        };
        let update = OrderStatusUpdate::payment_status(OrderPaymentStatus::Pending);
        match self.db.update_order_status(&payment.order_id, update).await {
            Ok(OrderUpdateResult::Applied(_)) => trace!("💸️ Order {} is awaiting gateway payment", payment.order_id),
            Ok(OrderUpdateResult::Rejected(order)) => {
                trace!("💸️ Order {} stays {} while [{reference}] is pending", order.order_id, order.payment_status)
            },
            Err(e) => warn!("💸️ Could not mark order {} as pending. {e}", payment.order_id),
        }
        info!("💸️ Gateway transaction [{reference}] started for order {}", payment.order_id);
        Ok(SettlementOutcome { payment, payment_url: Some(authorization.authorization_url) })
    }
}

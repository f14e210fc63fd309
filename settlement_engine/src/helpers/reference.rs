use std::sync::Arc;

use uuid::Uuid;

use crate::db_types::PaymentReference;

pub const PAYMENT_REFERENCE_PREFIX: &str = "spg_";

/// A source of payment references. The default is [`new_payment_reference`]; tests swap in deterministic generators.
pub type ReferenceGenerator = Arc<dyn Fn() -> PaymentReference + Send + Sync>;

/// Generates a fresh payment reference from a random (v4) UUID, e.g. `spg_5f0c3b3e9a2d4c1b8e7f6a5b4c3d2e1f`.
///
/// References only contain characters the gateway accepts (alphanumerics and `_`).
pub fn new_payment_reference() -> PaymentReference {
    PaymentReference(format!("{PAYMENT_REFERENCE_PREFIX}{}", Uuid::new_v4().simple()))
}

mod reference;

pub use reference::{new_payment_reference, ReferenceGenerator, PAYMENT_REFERENCE_PREFIX};

mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, PAYSTACK_SIGNATURE_HEADER};

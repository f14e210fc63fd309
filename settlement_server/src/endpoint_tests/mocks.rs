use mockall::mock;
use settlement_engine::{
    db_types::{Kobo, PaymentReference},
    traits::{GatewayAuthorization, GatewayError, GatewayVerification},
    PaymentGateway,
};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initialize(&self, reference: &PaymentReference, amount: Kobo, email: &str) -> Result<GatewayAuthorization, GatewayError>;
        async fn verify(&self, reference: &PaymentReference) -> Result<GatewayVerification, GatewayError>;
    }
}

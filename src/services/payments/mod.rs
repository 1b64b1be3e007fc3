pub mod collector;
pub mod gateway;
pub mod verifier;

pub use collector::{PaymentCollector, PaymentConfirmation, PaymentOutcome, PaymentPrefill};
pub use gateway::{GatewayOrder, PaymentGateway};
pub use verifier::SignatureVerifier;

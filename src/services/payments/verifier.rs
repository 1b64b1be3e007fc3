use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Recomputes the gateway's payment signature and compares it against the
/// one supplied by the client callback. This is the sole integrity boundary
/// of the payment flow: nothing may be marked paid without passing here.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The signature the gateway would have produced for this
    /// (order, payment) pair: `hex(HMAC-SHA256(secret, order_id|payment_id))`.
    pub fn expected_signature(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(format!("{gateway_order_id}|{gateway_payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// True only on an exact, constant-time match.
    pub fn verify(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> bool {
        let expected = self.expected_signature(gateway_order_id, gateway_payment_id);
        constant_time_eq(&expected, gateway_signature)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

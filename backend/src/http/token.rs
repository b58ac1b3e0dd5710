//! Per-order access tokens for the public wait-time endpoint.
//!
//! A token is the lowercase hex HMAC-SHA256 of `"<merchant_code>:<order_number>"`
//! under a shared secret. Holding it grants read access to one order only.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Validates that a token was issued for this merchant+order pair.
pub trait OrderTokenVerifier: Send + Sync {
    fn verify(&self, token: &str, merchant_code: &str, order_number: &str) -> bool;
}

#[derive(Clone)]
pub struct HmacOrderTokenVerifier {
    keyed: HmacSha256,
}

impl HmacOrderTokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> anyhow::Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| anyhow::anyhow!("invalid order token secret: {e}"))?;
        Ok(Self { keyed })
    }

    /// Issues the token for a merchant+order pair.
    pub fn sign(&self, merchant_code: &str, order_number: &str) -> String {
        hex::encode(self.digest(merchant_code, order_number))
    }

    fn digest(&self, merchant_code: &str, order_number: &str) -> Vec<u8> {
        let mut mac = self.keyed.clone();
        mac.update(merchant_code.as_bytes());
        mac.update(b":");
        mac.update(order_number.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl OrderTokenVerifier for HmacOrderTokenVerifier {
    /// Constant-time over the decoded digest. Malformed hex is rejected.
    fn verify(&self, token: &str, merchant_code: &str, order_number: &str) -> bool {
        let Ok(presented) = hex::decode(token.trim()) else {
            return false;
        };
        let expected = self.digest(merchant_code, order_number);

        presented.as_slice().ct_eq(expected.as_slice()).into()
    }
}

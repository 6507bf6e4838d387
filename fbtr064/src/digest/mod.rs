//! HTTP Digest authentication (RFC 2617, `qop=auth`, MD5) as spoken by the
//! FritzBox TR-064 interface.
//!
//! The device answers an unauthenticated action call with a
//! `WWW-Authenticate: Digest realm="...", nonce="...", algorithm=MD5, qop="auth"`
//! header. [`DigestChallenge::parse`] reads it, [`compute_response`] and
//! [`authorization_header`] produce the value sent back on the second request.

mod challenge;
mod response;

pub use challenge::{DIGEST_REALM_KEY, DigestChallenge};
pub use response::{authorization_header, compute_response};

use md5::{Digest, Md5};

/// Nonce count used for the single authenticated request of a call.
pub const SINGLE_USE_NONCE_COUNT: &str = "00000001";

/// Lowercase hexadecimal MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Client side values of one authenticated exchange.
///
/// A context answers exactly one server nonce: each call builds a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestAuthContext {
    pub client_nonce: String,
    pub nonce_count: String,
}

impl DigestAuthContext {
    /// Context with a random 8 hex digit client nonce.
    pub fn fresh() -> Self {
        Self::with_client_nonce(format!("{:08x}", rand::random::<u32>()))
    }

    pub fn with_client_nonce(client_nonce: impl Into<String>) -> Self {
        Self {
            client_nonce: client_nonce.into(),
            nonce_count: SINGLE_USE_NONCE_COUNT.to_string(),
        }
    }
}

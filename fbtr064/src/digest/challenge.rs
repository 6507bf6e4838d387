use crate::errors::Tr064Error;

/// The device serialises the scheme and the realm directive as one token.
pub const DIGEST_REALM_KEY: &str = "Digest realm";
const NONCE_KEY: &str = "nonce";
const ALGORITHM_KEY: &str = "algorithm";
const QOP_KEY: &str = "qop";

const DIRECTIVES: [&str; 4] = [DIGEST_REALM_KEY, NONCE_KEY, ALGORITHM_KEY, QOP_KEY];

/// Directives of a FritzBox digest challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub algorithm: String,
    pub qop: String,
}

impl DigestChallenge {
    /// Parses a header value such as
    /// `Digest realm="HTTPS Access", nonce="0123456789abcdef", algorithm=MD5, qop="auth"`.
    ///
    /// Tokens are matched by literal prefix, in any order; the last duplicate
    /// wins. All four directives are required, `qop` must be `auth` and
    /// `algorithm` must be `MD5`.
    pub fn parse(header_value: &str) -> Result<Self, Tr064Error> {
        let mut found: [Option<String>; 4] = Default::default();

        for token in header_value.split(',') {
            let token = token.trim();
            for (slot, key) in found.iter_mut().zip(DIRECTIVES) {
                if let Some(value) = directive_value(token, key) {
                    *slot = Some(value);
                }
            }
        }

        let [realm, nonce, algorithm, qop] = found;
        let challenge = DigestChallenge {
            realm: realm.ok_or_else(|| missing(DIGEST_REALM_KEY))?,
            nonce: nonce.ok_or_else(|| missing(NONCE_KEY))?,
            algorithm: algorithm.ok_or_else(|| missing(ALGORITHM_KEY))?,
            qop: qop.ok_or_else(|| missing(QOP_KEY))?,
        };

        if challenge.qop != "auth" {
            return Err(Tr064Error::protocol(format!(
                "unsupported digest qop {:?}",
                challenge.qop
            )));
        }
        if !challenge.algorithm.eq_ignore_ascii_case("MD5") {
            return Err(Tr064Error::protocol(format!(
                "unsupported digest algorithm {:?}",
                challenge.algorithm
            )));
        }

        Ok(challenge)
    }
}

fn missing(key: &str) -> Tr064Error {
    Tr064Error::protocol(format!("digest challenge without {key:?} directive"))
}

/// `key=value` or `key="value"`, only when `token` starts with `key`.
fn directive_value(token: &str, key: &str) -> Option<String> {
    let rest = token.strip_prefix(key)?.trim_start().strip_prefix('=')?.trim_start();

    let value = match rest.strip_prefix('"') {
        Some(quoted) => quoted.strip_suffix('"').unwrap_or(quoted),
        None => rest,
    };
    Some(value.to_string())
}

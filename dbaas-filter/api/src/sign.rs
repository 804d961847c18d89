//! `EXO2-HMAC-SHA256` request signatures.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

/// How long a signature remains valid.
pub(crate) const VALIDITY: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid signing key")]
pub struct InvalidKey;

/// The parts of a request covered by its signature.
#[derive(Debug)]
pub(crate) struct Request<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
    pub query: Vec<(String, String)>,
}

impl Credentials {
    pub fn new(key: impl ToString, secret: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Builds the `Authorization` header value for a request expiring at
    /// `expires` (unix seconds).
    pub(crate) fn authorization(
        &self,
        request: &Request<'_>,
        expires: i64,
    ) -> Result<String, InvalidKey> {
        let mut message = format!("{} {}\n", request.method, request.path).into_bytes();
        message.extend_from_slice(request.body);
        message.push(b'\n');
        for (_, value) in &request.query {
            message.extend_from_slice(value.as_bytes());
        }
        // No headers are signed.
        message.extend_from_slice(b"\n\n");
        message.extend_from_slice(expires.to_string().as_bytes());

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).map_err(|_| InvalidKey)?;
        mac.update(&message);
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let mut header = format!("EXO2-HMAC-SHA256 credential={}", self.key);
        if !request.query.is_empty() {
            let names = request
                .query
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>();
            header.push_str(",signed-query-args=");
            header.push_str(&names.join(";"));
        }
        header.push_str(&format!(",expires={expires},signature={signature}"));
        Ok(header)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

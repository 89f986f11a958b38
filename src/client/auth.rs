//! LMv1 request signing
//!
//! Every call carries `Authorization: LMv1 <id>:<signature>:<epoch-ms>` where the
//! signature is `base64(hex(HMAC-SHA256(key, verb + epoch + body + path)))`.
//! The timestamp is part of the signed message, so headers are rebuilt per call.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use sha2::Sha256;

use crate::config::Credentials;
use crate::error::{ApiError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Computes LMv1 authorization headers from a set of credentials.
#[derive(Debug, Clone)]
pub struct LmV1Signer {
    credentials: Credentials,
}

impl LmV1Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Compute the base64-of-hex signature for one request.
    pub fn signature(&self, verb: &str, resource_path: &str, body: &str, epoch_ms: i64) -> String {
        // new_from_slice only fails for fixed-size keys; HMAC accepts any length
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.credentials.access_key.as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(verb.as_bytes());
        mac.update(epoch_ms.to_string().as_bytes());
        mac.update(body.as_bytes());
        mac.update(resource_path.as_bytes());

        let hex_digest = hex::encode(mac.finalize().into_bytes());
        BASE64.encode(hex_digest.as_bytes())
    }

    /// Build the `Authorization` header value for a given timestamp.
    pub fn authorization(
        &self,
        verb: &str,
        resource_path: &str,
        body: &str,
        epoch_ms: i64,
    ) -> String {
        format!(
            "LMv1 {}:{}:{}",
            self.credentials.access_id,
            self.signature(verb, resource_path, body, epoch_ms),
            epoch_ms
        )
    }

    /// Build the full header set for a request signed at the current time.
    pub fn headers(&self, verb: &str, resource_path: &str, body: &str) -> Result<HeaderMap> {
        self.headers_at(verb, resource_path, body, Utc::now().timestamp_millis())
    }

    /// Build the full header set for a request signed at `epoch_ms`.
    pub fn headers_at(
        &self,
        verb: &str,
        resource_path: &str,
        body: &str,
        epoch_ms: i64,
    ) -> Result<HeaderMap> {
        let auth = self.authorization(verb, resource_path, body, epoch_ms);
        let auth = HeaderValue::from_str(&auth).map_err(|e| ApiError::InvalidResponse {
            path: resource_path.to_string(),
            reason: format!("access id is not a valid header value: {}", e),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}

//! # API Key Gate
//!
//! Every route except `/health` requires the shared key in `X-API-Key`.
//! The presented key and the configured key are both SHA-256 hashed and the
//! digests compared in constant time, so neither content nor length leaks.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::observability::Event;

use super::errors::ApiError;

/// Header carrying the shared key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Holds the digest of the configured key; the plaintext is not retained
#[derive(Clone)]
pub struct ApiKeyGate {
    digest: [u8; 32],
}

fn digest(value: &[u8]) -> [u8; 32] {
    Sha256::digest(value).into()
}

impl ApiKeyGate {
    pub fn new(api_key: &str) -> Self {
        Self {
            digest: digest(api_key.as_bytes()),
        }
    }

    /// Constant-time check of a presented key
    pub fn verify(&self, presented: &[u8]) -> bool {
        digest(presented).ct_eq(&self.digest).into()
    }

    /// Check the request headers; absent and mismatched keys are rejected alike
    pub fn authorize(&self, headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
        match headers.get(API_KEY_HEADER) {
            Some(value) if self.verify(value.as_bytes()) => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate").finish_non_exhaustive()
    }
}

/// Axum middleware enforcing the gate before any handler runs
pub async fn require_api_key(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = gate.authorize(request.headers()) {
        tracing::warn!(
            event = %Event::AuthRejected,
            method = %request.method(),
            path = %request.uri().path(),
            key_present = request.headers().contains_key(API_KEY_HEADER)
        );
        return Err(err);
    }

    Ok(next.run(request).await)
}

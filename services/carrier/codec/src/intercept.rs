//! Decode-or-passthrough for fetched containers.
//!
//! A consumer that fetches a carrier image on behalf of a media player wants
//! either the reconstructed segment or, if anything at all goes wrong, the
//! body exactly as fetched. [`reconstruct`] never fails; it reports which of
//! the two it produced.

use crate::decoder::Decoder;
use bytes::Bytes;
use tracing::{debug, warn};

/// Media type for reconstructed segments
pub const RECONSTRUCTED_CONTENT_TYPE: &str = "video/mp2t";

/// Result of a reconstruction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payload recovered from the container
    Reconstructed(Bytes),
    /// Decoding failed; the original body, untouched
    Passthrough(Bytes),
}

impl Outcome {
    /// Whether the payload was recovered
    pub fn is_reconstructed(&self) -> bool {
        matches!(self, Outcome::Reconstructed(_))
    }

    /// Media type to serve a reconstructed body with
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Outcome::Reconstructed(_) => Some(RECONSTRUCTED_CONTENT_TYPE),
            Outcome::Passthrough(_) => None,
        }
    }

    /// Body to serve
    pub fn into_body(self) -> Bytes {
        match self {
            Outcome::Reconstructed(body) | Outcome::Passthrough(body) => body,
        }
    }
}

/// Decode `body` with default settings, passing it through on failure
pub async fn reconstruct(body: Bytes, prefix: &str) -> Outcome {
    reconstruct_with(Decoder::default(), body, prefix).await
}

/// Decode `body` with `decoder` on the blocking pool, passing it through on failure
pub async fn reconstruct_with(decoder: Decoder, body: Bytes, prefix: &str) -> Outcome {
    let input = body.clone();
    let prefix = prefix.to_string();

    let result = tokio::task::spawn_blocking(move || decoder.decode(&input, &prefix)).await;

    match result {
        Ok(Ok(payload)) => {
            debug!(
                body_len = body.len(),
                payload_len = payload.len(),
                "reconstructed payload"
            );
            Outcome::Reconstructed(payload)
        }
        Ok(Err(e)) => {
            warn!(error = %e, body_len = body.len(), "decode failed, passing body through");
            Outcome::Passthrough(body)
        }
        Err(e) => {
            warn!(error = %e, "decode task did not complete, passing body through");
            Outcome::Passthrough(body)
        }
    }
}

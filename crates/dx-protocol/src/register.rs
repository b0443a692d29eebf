//! Dataset registration bodies.

use serde::{Deserialize, Serialize};

/// Error body returned by the service when registration fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFailure {
    pub detail: String,
}

/// Extract the server's message from a failure body.
///
/// Uses `detail` when the body has that shape, otherwise the body text itself.
pub fn failure_message(body: &[u8]) -> String {
    match serde_json::from_slice::<RegisterFailure>(body) {
        Ok(failure) => failure.detail,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

//! Request metrics.
//!
//! Emitted through the `metrics` facade; nothing is recorded unless the
//! application installs a recorder.

use std::time::Instant;

use dx_common::{DxError, DxResult};
use metrics::{counter, histogram};

pub(crate) fn record(op: &'static str, started: Instant, outcome: &'static str) {
    counter!("dx_client_requests_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("dx_client_request_duration_seconds", "op" => op)
        .record(started.elapsed().as_secs_f64());
}

/// Outcome label for operations where absence is a result.
pub(crate) fn lookup_outcome<T>(result: &DxResult<Option<T>>) -> &'static str {
    match result {
        Ok(Some(_)) => "ok",
        Ok(None) => "not_found",
        Err(e) => error_outcome(e),
    }
}

pub(crate) fn outcome<T>(result: &DxResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => error_outcome(e),
    }
}

fn error_outcome(err: &DxError) -> &'static str {
    match err {
        DxError::ServerError { .. } => "server_error",
        DxError::Transport(_) => "transport_error",
        DxError::MalformedArray(_)
        | DxError::UnknownElementType(_)
        | DxError::Serialization(_) => "decode_error",
        _ => "invalid_input",
    }
}

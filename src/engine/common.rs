// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::WorkspaceError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, turning a panic into `InternalPanic` instead of unwinding
/// through the caller (or aborting a pool worker).
pub(crate) fn run_with_panic_policy<T>(
    context: &'static str,
    f: impl FnOnce() -> Result<T, WorkspaceError>,
) -> Result<T, WorkspaceError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(target: "image_workspace::engine", %context, %message, "caught panic");
            Err(WorkspaceError::internal_panic(format!("{context}: {message}")))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_results_through() {
        assert_eq!(run_with_panic_policy("test", || Ok(7)).unwrap(), 7);
        let err = run_with_panic_policy::<()>("test", || {
            Err(WorkspaceError::decode_failed("bad"))
        })
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::DecodeFailed { .. }));
    }

    #[test]
    fn converts_panics() {
        let err = run_with_panic_policy::<()>("decode:test", || panic!("kaboom")).unwrap_err();
        match err {
            WorkspaceError::InternalPanic { message } => {
                assert!(message.contains("decode:test"));
                assert!(message.contains("kaboom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

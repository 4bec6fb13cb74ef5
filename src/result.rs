//! Response envelope for session operations.
//!
//! Operations exposed to a hosting UI never raise: every outcome is a
//! `{success, data?, error?}` record, serialized with `serde`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structured outcome of one session operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Human-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Response<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    /// Back into a `Result`, for callers inside the crate.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(self.error.unwrap_or_else(|| "no data".to_string())),
        }
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_serializes_without_data() {
        let response: Response<String> = Err(Error::NoLinkFound).into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "No link found near the clicked element"})
        );
    }

    #[test]
    fn test_success_round_trips() {
        let response: Response<u32> = Ok(3).into();
        assert!(response.success);
        assert_eq!(response.into_result(), Ok(3));
    }
}

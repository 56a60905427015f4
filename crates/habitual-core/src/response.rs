//! Uniform result envelope returned by every public operation.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// `{ success, data?, error? }` envelope.
///
/// Services catch every internal fault and report it here instead of
/// returning `Err`, so callers only ever branch on `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convert an internal result, prefixing unexpected failures with `context`.
    ///
    /// Lookup misses and duplicates keep their bare message so callers can
    /// match on them (`User habits not found`, `Habit already exists`).
    pub fn from_result(result: Result<T>, context: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(CoreError::NotFound(msg)) | Err(CoreError::Duplicate(msg)) => Self::fail(msg),
            Err(err) => Self::fail(format!("{context}: {err}")),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Borrow the payload of a successful response.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Convert back into a `Result`, using the error string on failure.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(self.error.unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn success_serializes_without_error_field() {
        let json = serde_json::to_value(ApiResponse::ok(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": true }));
    }

    #[test]
    fn failure_serializes_without_data_field() {
        let json = serde_json::to_value(ApiResponse::<u32>::fail("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "nope" }));
    }

    #[test]
    fn from_result_keeps_not_found_message_bare() {
        let resp: ApiResponse<()> =
            ApiResponse::from_result(Err(CoreError::habits_not_found()), "Failed to add habit");
        assert_eq!(resp.error.as_deref(), Some("User habits not found"));
    }

    #[test]
    fn from_result_prefixes_unexpected_failures() {
        let resp: ApiResponse<()> =
            ApiResponse::from_result(Err(StoreError::Locked.into()), "Failed to save");
        assert_eq!(
            resp.error.as_deref(),
            Some("Failed to save: Store error: Database is locked")
        );
        assert!(!resp.is_success());
    }

    #[test]
    fn into_result_round_trips_payload() {
        assert_eq!(ApiResponse::ok(3).into_result(), Ok(3));
        assert_eq!(
            ApiResponse::<u8>::fail("bad").into_result(),
            Err("bad".to_string())
        );
    }
}

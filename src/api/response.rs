/// Success response envelope
use serde::{Deserialize, Serialize};

/// The shape every successful response takes:
/// `{statusCode, data, message, success}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(201, data, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::ok(serde_json::json!({"k": "v"}), "done");
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["message"], "done");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["k"], "v");
    }

    #[test]
    fn test_created_is_successful() {
        let resp = ApiResponse::created((), "made");
        assert!(resp.success);
        assert_eq!(resp.status_code, 201);
    }
}

//! Response envelope of the platform API
//!
//! Every response body is `{ success, data?, error?, code? }`; list payloads
//! wrap their entries in `{ items: [...] }`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use topology_core::{GatewayError, GatewayResult};

/// Envelope around every platform response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the platform considers the call successful
    pub success: bool,
    /// Payload
    pub data: Option<T>,
    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,
    /// Machine readable error code
    #[serde(default)]
    pub code: Option<String>,
}

/// Payload of list endpoints
#[derive(Debug, Deserialize)]
pub struct ListData<T> {
    /// Listed entries
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Payload of the create-release endpoint
#[derive(Debug, Deserialize)]
pub struct ReleaseRef {
    /// Name of the created release
    pub name: String,
}

/// Turn an HTTP status and body into the envelope's payload
///
/// An empty 2xx body yields `Ok(None)`. 404 maps to
/// [`GatewayError::NotFound`], other non-2xx statuses to
/// [`GatewayError::Status`], and a `success: false` envelope to
/// [`GatewayError::Api`].
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> GatewayResult<Option<T>> {
    if !(200..300).contains(&status) {
        let message = error_message(body);
        return Err(if status == 404 {
            GatewayError::NotFound(message)
        } else {
            GatewayError::Status { status, message }
        });
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: ApiResponse<T> = serde_json::from_str(body)?;
    if !envelope.success {
        return Err(GatewayError::Api {
            code: envelope.code,
            message: envelope
                .error
                .unwrap_or_else(|| "request was not successful".to_string()),
        });
    }
    Ok(envelope.data)
}

/// Require a payload that the endpoint always returns
pub fn required<T>(data: Option<T>, what: &str) -> GatewayResult<T> {
    data.ok_or_else(|| GatewayError::Decode(format!("response has no {}", what)))
}

// Prefer the envelope's message, then the raw body
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        if let Some(error) = envelope.error {
            return error;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "no response body".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology_core::EnvironmentRecord;

    #[test]
    fn test_decode_list() {
        let body = r#"{
            "success": true,
            "data": { "items": [
                { "uid": "1", "name": "development", "isProduction": false },
                { "uid": "2", "name": "production", "displayName": "Production", "isProduction": true }
            ] }
        }"#;

        let data: ListData<EnvironmentRecord> = decode_response(200, body).unwrap().unwrap();
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.items[1].label(), "Production");
        assert!(data.items[1].is_production);
    }

    #[test]
    fn test_empty_body() {
        let data: Option<serde_json::Value> = decode_response(204, "").unwrap();
        assert!(data.is_none());

        let data: Option<ListData<EnvironmentRecord>> =
            decode_response(200, r#"{ "success": true }"#).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let body = r#"{ "success": false, "error": "binding is locked", "code": "LOCKED" }"#;
        let err = decode_response::<serde_json::Value>(200, body).unwrap_err();
        match err {
            GatewayError::Api { code, message } => {
                assert_eq!(code.as_deref(), Some("LOCKED"));
                assert_eq!(message, "binding is locked");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_errors() {
        let err = decode_response::<serde_json::Value>(
            500,
            r#"{ "success": false, "error": "database unavailable" }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status { status: 500, ref message } if message == "database unavailable"
        ));

        let err = decode_response::<serde_json::Value>(502, "Bad Gateway\n").unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status { status: 502, ref message } if message == "Bad Gateway"
        ));

        let err = decode_response::<serde_json::Value>(404, "").unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "no response body"));
    }

    #[test]
    fn test_malformed_body() {
        let err = decode_response::<ListData<EnvironmentRecord>>(200, "<html>").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));

        let err = decode_response::<ListData<EnvironmentRecord>>(
            200,
            r#"{ "success": true, "data": { "items": [ { "name": "dev" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(1), "release").unwrap(), 1);
        let err = required::<u8>(None, "release").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(ref m) if m == "response has no release"));
    }
}

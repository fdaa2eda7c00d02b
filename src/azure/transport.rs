//! Request/response plumbing between the operations layer and ARM.

use crate::error::{ArmError, ArmResult};
use serde::Deserialize;
use std::fmt;
use std::future::Future;

/// HTTP verb of an ARM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against Resource Manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmRequest {
    pub method: Method,
    /// Resource path starting with `/subscriptions/`.
    pub path: String,
    pub api_version: String,
    pub body: Option<serde_json::Value>,
}

impl ArmRequest {
    pub fn get(path: impl Into<String>, api_version: &str) -> Self {
        ArmRequest {
            method: Method::Get,
            path: path.into(),
            api_version: api_version.to_string(),
            body: None,
        }
    }

    pub fn put(path: impl Into<String>, api_version: &str, body: serde_json::Value) -> Self {
        ArmRequest {
            method: Method::Put,
            path: path.into(),
            api_version: api_version.to_string(),
            body: Some(body),
        }
    }

    /// Action call such as `.../providers/{namespace}/register`.
    pub fn post(path: impl Into<String>, api_version: &str) -> Self {
        ArmRequest {
            method: Method::Post,
            path: path.into(),
            api_version: api_version.to_string(),
            body: None,
        }
    }

    pub fn delete(path: impl Into<String>, api_version: &str) -> Self {
        ArmRequest {
            method: Method::Delete,
            path: path.into(),
            api_version: api_version.to_string(),
            body: None,
        }
    }

    /// Path with the `api-version` query appended.
    pub fn path_and_query(&self) -> String {
        format!("{}?api-version={}", self.path, self.api_version)
    }
}

/// Answer from Resource Manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmResponse {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl ArmResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        ArmResponse {
            status: 200,
            body: Some(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx answer into an [`ArmError`], passing 2xx through.
    pub fn error_for_status(self, path: &str) -> ArmResult<ArmResponse> {
        if self.is_success() {
            return Ok(self);
        }
        if self.status == 404 {
            return Err(ArmError::NotFound {
                id: path.to_string(),
            });
        }
        let (code, message) = self
            .body
            .as_ref()
            .and_then(|b| serde_json::from_value::<ErrorEnvelope>(b.clone()).ok())
            .map(|env| (env.error.code, env.error.message))
            .unwrap_or_else(|| {
                (
                    "Unknown".to_string(),
                    self.body
                        .as_ref()
                        .map(|b| b.to_string())
                        .unwrap_or_default(),
                )
            });
        Err(ArmError::Api {
            status: self.status,
            code,
            message,
        })
    }
}

/// Decode a response body; blank text means no body.
pub fn decode_body(text: &str) -> ArmResult<Option<serde_json::Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let mut de = serde_json::Deserializer::from_str(text);
    let value: serde_json::Value =
        serde_path_to_error::deserialize(&mut de).map_err(|e| ArmError::Decode {
            path: e.path().to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(value))
}

/// ARM error body: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Something that can deliver [`ArmRequest`]s.
///
/// Implementations only move bytes; status interpretation happens in the
/// operations layer through [`ArmResponse::error_for_status`].
pub trait ArmTransport {
    fn send(&self, request: ArmRequest) -> impl Future<Output = ArmResult<ArmResponse>>;
}

impl<T: ArmTransport> ArmTransport for &T {
    fn send(&self, request: ArmRequest) -> impl Future<Output = ArmResult<ArmResponse>> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_and_query() {
        let req = ArmRequest::get("/subscriptions/s/resourceGroups/g", "2017-05-10");
        assert_eq!(
            req.path_and_query(),
            "/subscriptions/s/resourceGroups/g?api-version=2017-05-10"
        );
        assert_eq!(req.method.to_string(), "GET");
    }

    #[test]
    fn test_post_has_no_body() {
        let req = ArmRequest::post(
            "/subscriptions/s/providers/Microsoft.Network/register",
            "2017-05-10",
        );
        assert_eq!(req.method.as_str(), "POST");
        assert_eq!(req.body, None);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body("").unwrap(), None);
        assert_eq!(decode_body("  \n").unwrap(), None);
        assert_eq!(
            decode_body(r#"{"name":"x","properties":{"provisioningState":"Succeeded"}}"#).unwrap(),
            Some(json!({"name": "x", "properties": {"provisioningState": "Succeeded"}}))
        );
    }

    #[test]
    fn test_decode_body_reports_position() {
        let err = decode_body(r#"{"name": "x", "properties": {"#).unwrap_err();
        assert!(matches!(err, ArmError::Decode { .. }));
    }

    #[test]
    fn test_error_envelope_is_parsed() {
        let resp = ArmResponse {
            status: 400,
            body: Some(json!({
                "error": {"code": "InvalidResourceReference", "message": "Subnet missing"}
            })),
        };
        match resp.error_for_status("/x").unwrap_err() {
            ArmError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "InvalidResourceReference");
                assert_eq!(message, "Subnet missing");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_404_is_not_found() {
        let resp = ArmResponse {
            status: 404,
            body: None,
        };
        assert!(resp.error_for_status("/x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_unstructured_error_body() {
        let resp = ArmResponse {
            status: 500,
            body: Some(json!("boom")),
        };
        let err = resp.error_for_status("/x").unwrap_err();
        assert_eq!(err.to_string(), "ARM returned 500 (Unknown): \"boom\"");
    }
}

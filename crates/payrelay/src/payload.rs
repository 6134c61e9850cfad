//! Callback payload normalization.
//!
//! Providers deliver the base64 `response` blob in different transport
//! shapes, and the decoded JSON places the transaction id and status under
//! different field names depending on the integration. Both steps are driven
//! by ordered strategy tables: the first strategy that yields a non-empty
//! string wins, and new shapes are supported by appending an entry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;

use crate::constants::RESPONSE_FIELD;
use crate::error::CallbackError;

/// Transport shape of an incoming callback, derived from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `application/json` with a `response` field.
    Json,
    /// `application/x-www-form-urlencoded` with a `response` field.
    Form,
    /// `text/plain` whose whole body is the response blob.
    Text,
}

impl Transport {
    /// Map a `Content-Type` header value to a transport.
    /// Parameters such as `charset` are ignored.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, CallbackError> {
        let raw = content_type.unwrap_or("");
        let mime = raw
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/json" => Ok(Transport::Json),
            "application/x-www-form-urlencoded" => Ok(Transport::Form),
            "text/plain" => Ok(Transport::Text),
            "" => Err(CallbackError::UnsupportedTransport(
                "missing content type".to_string(),
            )),
            _ => Err(CallbackError::UnsupportedTransport(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Json => "json",
            Transport::Form => "form",
            Transport::Text => "text",
        }
    }
}

/// A field lookup tried against a JSON document.
#[derive(Debug, Clone, Copy)]
pub struct FieldStrategy {
    pub name: &'static str,
    pub path: &'static [&'static str],
}

impl FieldStrategy {
    const fn new(name: &'static str, path: &'static [&'static str]) -> Self {
        Self { name, path }
    }

    /// Resolve the path to a non-empty string value.
    pub fn extract<'a>(&self, doc: &'a Value) -> Option<&'a str> {
        let mut cursor = doc;
        for key in self.path {
            cursor = cursor.get(key)?;
        }
        cursor.as_str().filter(|s| !s.is_empty())
    }
}

/// Where the response blob may sit inside a JSON callback body.
pub const RESPONSE_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy::new("response", &[RESPONSE_FIELD]),
    FieldStrategy::new("data.response", &["data", RESPONSE_FIELD]),
];

/// Transaction id fields, merchant-assigned id first.
pub const TRANSACTION_ID_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy::new("merchantTransactionId", &["merchantTransactionId"]),
    FieldStrategy::new("transactionId", &["transactionId"]),
    FieldStrategy::new(
        "data.merchantTransactionId",
        &["data", "merchantTransactionId"],
    ),
    FieldStrategy::new("data.transactionId", &["data", "transactionId"]),
];

/// Status fields, top-level status first.
pub const STATUS_STRATEGIES: &[FieldStrategy] = &[
    FieldStrategy::new("status", &["status"]),
    FieldStrategy::new("data.paymentState", &["data", "paymentState"]),
    FieldStrategy::new("data.state", &["data", "state"]),
    FieldStrategy::new("code", &["code"]),
];

/// Run strategies in order, returning the first match and its name.
pub fn first_match<'a>(
    strategies: &[FieldStrategy],
    doc: &'a Value,
) -> Option<(&'static str, &'a str)> {
    strategies
        .iter()
        .find_map(|s| s.extract(doc).map(|v| (s.name, v)))
}

/// Transaction outcome extracted from a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCallback {
    pub transaction_id: String,
    pub status: String,
}

/// Locate the raw (still base64) response string in a callback body.
///
/// The returned string is exactly what the provider signed.
pub fn extract_response(transport: Transport, body: &[u8]) -> Result<String, CallbackError> {
    let found = match transport {
        Transport::Json => {
            let doc: Value = serde_json::from_slice(body).map_err(|e| {
                CallbackError::MalformedRequest(format!("body is not valid JSON: {e}"))
            })?;
            first_match(RESPONSE_STRATEGIES, &doc).map(|(_, v)| v.to_string())
        }
        Transport::Form => url::form_urlencoded::parse(body)
            .find(|(key, _)| key == RESPONSE_FIELD)
            .map(|(_, value)| value.into_owned())
            .filter(|v| !v.is_empty()),
        Transport::Text => std::str::from_utf8(body)
            .ok()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    };

    found.ok_or_else(|| {
        CallbackError::MalformedRequest(format!(
            "no {RESPONSE_FIELD} field in {} body",
            transport.as_str()
        ))
    })
}

/// Decode a base64 response blob and pull out the transaction id and status.
pub fn normalize(response: &str) -> Result<NormalizedCallback, CallbackError> {
    let decoded = STANDARD
        .decode(response.trim())
        .map_err(|e| CallbackError::MalformedPayload(format!("invalid base64: {e}")))?;

    let doc: Value = serde_json::from_slice(&decoded)
        .map_err(|e| CallbackError::MalformedPayload(format!("invalid JSON: {e}")))?;

    if !doc.is_object() {
        return Err(CallbackError::MalformedPayload(
            "decoded payload is not a JSON object".to_string(),
        ));
    }

    let (id_field, transaction_id) = first_match(TRANSACTION_ID_STRATEGIES, &doc).ok_or_else(
        || CallbackError::MalformedPayload("no transaction id in payload".to_string()),
    )?;
    let (status_field, status) = first_match(STATUS_STRATEGIES, &doc)
        .ok_or_else(|| CallbackError::MalformedPayload("no status in payload".to_string()))?;

    tracing::trace!(id_field, status_field, "normalized callback payload");

    Ok(NormalizedCallback {
        transaction_id: transaction_id.to_string(),
        status: status.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn test_merchant_transaction_id_with_top_level_status() {
        let blob = encode(r#"{"merchantTransactionId":"T1","status":"SUCCESS"}"#);
        let n = normalize(&blob).unwrap();
        assert_eq!(n.transaction_id, "T1");
        assert_eq!(n.status, "SUCCESS");
    }

    #[test]
    fn test_transaction_id_with_nested_payment_state() {
        let blob = encode(r#"{"transactionId":"T2","data":{"paymentState":"FAILED"}}"#);
        let n = normalize(&blob).unwrap();
        assert_eq!(n.transaction_id, "T2");
        assert_eq!(n.status, "FAILED");
    }

    #[test]
    fn test_prefers_merchant_id_and_top_level_status() {
        let blob = encode(
            r#"{"transactionId":"PROVIDER-9","merchantTransactionId":"M-1",
                "status":"COMPLETED","data":{"paymentState":"PENDING"}}"#,
        );
        let n = normalize(&blob).unwrap();
        assert_eq!(n.transaction_id, "M-1");
        assert_eq!(n.status, "COMPLETED");
    }

    #[test]
    fn test_full_provider_shape_nests_everything_under_data() {
        let blob = encode(
            r#"{"success":true,"code":"PAYMENT_SUCCESS","message":"ok",
                "data":{"merchantId":"M","merchantTransactionId":"MT-7",
                        "transactionId":"P-7","state":"COMPLETED"}}"#,
        );
        let n = normalize(&blob).unwrap();
        assert_eq!(n.transaction_id, "MT-7");
        assert_eq!(n.status, "COMPLETED");
    }

    #[test]
    fn test_code_is_last_resort_status() {
        let blob = encode(r#"{"merchantTransactionId":"T3","code":"PAYMENT_ERROR"}"#);
        assert_eq!(normalize(&blob).unwrap().status, "PAYMENT_ERROR");
    }

    #[test]
    fn test_empty_strings_fall_through() {
        let blob = encode(
            r#"{"merchantTransactionId":"","transactionId":"T4",
                "status":"","data":{"paymentState":"OK"}}"#,
        );
        let n = normalize(&blob).unwrap();
        assert_eq!(n.transaction_id, "T4");
        assert_eq!(n.status, "OK");
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let err = normalize("%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, CallbackError::MalformedPayload(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = normalize(&encode("{not json")).unwrap_err();
        assert!(matches!(err, CallbackError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let err = normalize(&encode(r#"["T1","SUCCESS"]"#)).unwrap_err();
        assert!(matches!(err, CallbackError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let no_id = normalize(&encode(r#"{"status":"SUCCESS"}"#)).unwrap_err();
        assert_eq!(
            no_id,
            CallbackError::MalformedPayload("no transaction id in payload".to_string())
        );

        let no_status = normalize(&encode(r#"{"transactionId":"T1"}"#)).unwrap_err();
        assert_eq!(
            no_status,
            CallbackError::MalformedPayload("no status in payload".to_string())
        );
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        let err = normalize(&encode(r#"{"transactionId":42,"status":true}"#)).unwrap_err();
        assert!(matches!(err, CallbackError::MalformedPayload(_)));
    }

    #[test]
    fn test_transport_from_content_type() {
        assert_eq!(
            Transport::from_content_type(Some("application/json")).unwrap(),
            Transport::Json
        );
        assert_eq!(
            Transport::from_content_type(Some("Application/JSON; charset=utf-8")).unwrap(),
            Transport::Json
        );
        assert_eq!(
            Transport::from_content_type(Some("application/x-www-form-urlencoded")).unwrap(),
            Transport::Form
        );
        assert_eq!(
            Transport::from_content_type(Some("text/plain")).unwrap(),
            Transport::Text
        );
        assert!(matches!(
            Transport::from_content_type(Some("multipart/form-data")),
            Err(CallbackError::UnsupportedTransport(_))
        ));
        assert!(matches!(
            Transport::from_content_type(None),
            Err(CallbackError::UnsupportedTransport(_))
        ));
    }

    #[test]
    fn test_extract_response_from_json() {
        let body = br#"{"response":"abc=="}"#;
        assert_eq!(extract_response(Transport::Json, body).unwrap(), "abc==");

        let nested = br#"{"data":{"response":"def="}}"#;
        assert_eq!(extract_response(Transport::Json, nested).unwrap(), "def=");
    }

    #[test]
    fn test_extract_response_from_form() {
        let body = b"foo=bar&response=eyJhIjoxfQ%3D%3D";
        assert_eq!(
            extract_response(Transport::Form, body).unwrap(),
            "eyJhIjoxfQ=="
        );
    }

    #[test]
    fn test_extract_response_from_text() {
        assert_eq!(
            extract_response(Transport::Text, b"  eyJhIjoxfQ==\n").unwrap(),
            "eyJhIjoxfQ=="
        );
    }

    #[test]
    fn test_extract_response_missing_is_malformed_request() {
        let cases: [(Transport, &[u8]); 5] = [
            (Transport::Json, br#"{"other":"x"}"#),
            (Transport::Json, br#"{"response":7}"#),
            (Transport::Json, b"not json"),
            (Transport::Form, b"other=x"),
            (Transport::Text, b"   "),
        ];
        for (transport, body) in cases {
            let err = extract_response(transport, body).unwrap_err();
            assert!(
                matches!(err, CallbackError::MalformedRequest(_)),
                "{transport:?} {err:?}"
            );
        }
    }
}

//! Raw response → JSON mapping.

use serde_json::{Map, Value};

use crate::context::RateLimit;
use crate::error::{ApiError, Result};
use crate::http::HttpResponse;

pub const RATELIMIT_LIMIT: &str = "X-RateLimit-Limit";
pub const RATELIMIT_REMAINING: &str = "X-RateLimit-Remaining";
pub const RATELIMIT_RESET: &str = "X-RateLimit-Reset";

/// Read the rate-limit headers. Missing headers leave the field empty.
pub fn ratelimit(response: &HttpResponse) -> RateLimit {
    let header = |name: &str| response.header(name).map(str::to_string);
    RateLimit::new(
        header(RATELIMIT_LIMIT),
        header(RATELIMIT_REMAINING),
        header(RATELIMIT_RESET),
    )
}

/// Parse the body as a JSON object and inject the rate limit under
/// `ratelimit`.
pub fn decode_response(response: &HttpResponse) -> Result<Map<String, Value>> {
    let text = std::str::from_utf8(&response.body)
        .map_err(|e| ApiError::Decode(format!("body is not UTF-8: {e}")))?;
    let value: Value = serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(ApiError::Decode(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    };

    let ratelimit = serde_json::to_value(ratelimit(response)).map_err(|e| ApiError::Decode(e.to_string()))?;
    fields.insert("ratelimit".to_string(), ratelimit);
    Ok(fields)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str, headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn injects_ratelimit() {
        let res = response(
            r#"{"status_code":200,"message":"ok","data":null}"#,
            &[
                ("x-ratelimit-limit", "90"),
                ("X-RATELIMIT-REMAINING", "12"),
                ("X-RateLimit-Reset", "soon"),
            ],
        );
        let fields = decode_response(&res).unwrap();
        assert_eq!(fields["status_code"], 200);
        assert_eq!(
            fields["ratelimit"],
            serde_json::json!({"limit": "90", "remaining": "12", "reset": "soon"})
        );
    }

    #[test]
    fn missing_ratelimit_headers_are_empty() {
        let limit = ratelimit(&response("{}", &[("content-type", "application/json")]));
        assert_eq!(limit, RateLimit::default());
        assert_eq!(limit.limit(), None);
        assert_eq!(limit.remaining(), None);
        assert_eq!(limit.reset(), None);
    }

    #[test]
    fn non_json_body_fails() {
        let err = decode_response(&response("<html>502 Bad Gateway</html>", &[])).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn empty_body_fails() {
        let err = decode_response(&response("", &[])).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn non_object_json_fails() {
        let err = decode_response(&response("[1,2]", &[])).unwrap_err();
        match err {
            ApiError::Decode(msg) => assert!(msg.contains("an array"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_fails() {
        let res = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: vec![0xff, 0xfe, b'{', b'}'],
        };
        assert!(matches!(decode_response(&res), Err(ApiError::Decode(_))));
    }
}

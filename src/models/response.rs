//! 错误响应模型

use serde::Serialize;

/// 错误响应体
///
/// `details` 仅在 500 错误时返回
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omitted_when_absent() {
        let body = serde_json::to_string(&ErrorBody::new("bad")).unwrap();
        assert_eq!(body, r#"{"error":"bad"}"#);

        let body = serde_json::to_string(&ErrorBody::with_details("bad", "why")).unwrap();
        assert_eq!(body, r#"{"error":"bad","details":"why"}"#);
    }
}

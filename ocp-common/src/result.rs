//! 面向路由层的统一返回结构

use serde::{Deserialize, Serialize};

use crate::error::{OpError, Outcome};

/// 操作结果三元组
///
/// - 成功：`success = true`，`payload` 为返回数据，`error_code` 必为 `None`
/// - 失败：`success = false`，`error_code` 为错误码；有诊断信息时 `payload` 为消息文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub payload: Option<serde_json::Value>,
    pub error_code: Option<u16>,
}

impl OperationResult {
    pub fn ok(payload: serde_json::Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error_code: None,
        }
    }

    pub fn failure(err: &OpError) -> Self {
        let payload = if err.message().is_empty() {
            None
        } else {
            Some(serde_json::Value::String(err.message().to_string()))
        };

        Self {
            success: false,
            payload,
            error_code: Some(err.code()),
        }
    }

    /// 以元组形式返回
    pub fn into_parts(self) -> (bool, Option<serde_json::Value>, Option<u16>) {
        (self.success, self.payload, self.error_code)
    }
}

impl<T: Serialize> From<Outcome<T>> for OperationResult {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Ok(value) => match serde_json::to_value(value) {
                Ok(payload) => Self::ok(payload),
                Err(e) => Self::failure(&OpError::transport(format!("序列化返回数据失败: {}", e))),
            },
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_success_has_no_error_code() {
        let result = OperationResult::from(Ok::<_, OpError>(vec!["site.yml"]));
        assert!(result.success);
        assert_eq!(result.payload, Some(json!(["site.yml"])));
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn test_not_found_carries_message_and_code() {
        let outcome: Outcome<String> = Err(OpError::not_found("Playbook does not exist."));
        let (success, payload, code) = OperationResult::from(outcome).into_parts();
        assert!(!success);
        assert_eq!(payload, Some(json!("Playbook does not exist.")));
        assert_eq!(code, Some(404));
    }

    #[test]
    fn test_bare_upstream_error_has_no_payload() {
        let outcome: Outcome<serde_json::Value> = Err(OpError::from_kind(ErrorKind::Upstream(500)));
        let (success, payload, code) = OperationResult::from(outcome).into_parts();
        assert!(!success);
        assert_eq!(payload, None);
        assert_eq!(code, Some(500));
    }
}

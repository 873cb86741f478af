//! Proxmox 客户端错误定义

use ocp_common::{ErrorKind, OpError};
use thiserror::Error;

/// Proxmox 客户端错误类型
#[derive(Error, Debug)]
pub enum ProxmoxError {
    #[error("HTTP 错误: {0}")]
    HttpError(String),

    #[error("认证错误: {0}")]
    AuthError(String),

    #[error("API 错误 [{0}]: {1}")]
    ApiError(u16, String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// Proxmox 客户端结果类型
pub type Result<T> = std::result::Result<T, ProxmoxError>;

impl From<ProxmoxError> for OpError {
    fn from(err: ProxmoxError) -> Self {
        match err {
            // 上游 HTTP 错误只透传状态码
            ProxmoxError::ApiError(status, _) => OpError::from_kind(ErrorKind::Upstream(status)),
            ProxmoxError::AuthError(msg) => OpError::new(ErrorKind::Unauthorized, msg),
            ProxmoxError::HttpError(_) | ProxmoxError::ParseError(_) | ProxmoxError::ConfigError(_) => {
                OpError::from_kind(ErrorKind::Transport)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_passes_status_through() {
        let err: OpError = ProxmoxError::ApiError(403, "Permission check failed".into()).into();
        assert_eq!(err.kind(), ErrorKind::Upstream(403));
        assert_eq!(err.code(), 403);
        assert!(err.message().is_empty());
    }

    #[test]
    fn test_network_error_is_generic_500() {
        let err: OpError = ProxmoxError::HttpError("connection refused".into()).into();
        assert_eq!(err.code(), 500);
        assert!(err.message().is_empty());
    }
}

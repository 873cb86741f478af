//! 统一错误分类

use std::fmt;

use thiserror::Error;

/// 所有编排操作的结果类型
pub type Outcome<T> = std::result::Result<T, OpError>;

/// 错误类别
///
/// 路由层只需要根据类别决定 HTTP 语义，不需要了解底层传输细节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 目标（playbook、inventory 文件）在远程主机上不存在
    NotFound,
    /// 未登录或认证失败
    Unauthorized,
    /// 上游 HTTP 返回非 2xx，状态码原样透传
    Upstream(u16),
    /// 外部进程退出码非 0，或远程命令写入了标准错误
    Process,
    /// 连接/网络/序列化等传输层错误
    Transport,
    /// 结构化文档（YAML）解析失败
    Malformed,
    /// 调用参数非法（例如 playbook 名称包含路径分隔符）
    InvalidInput,
}

impl ErrorKind {
    /// 映射到路由层使用的整数错误码
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Unauthorized => 401,
            Self::Upstream(status) => *status,
            Self::InvalidInput => 400,
            Self::Process | Self::Transport | Self::Malformed => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "资源不存在"),
            Self::Unauthorized => write!(f, "认证错误"),
            Self::Upstream(status) => write!(f, "上游错误 [{}]", status),
            Self::Process => write!(f, "进程错误"),
            Self::Transport => write!(f, "传输错误"),
            Self::Malformed => write!(f, "内容格式错误"),
            Self::InvalidInput => write!(f, "参数错误"),
        }
    }
}

/// 编排操作错误
///
/// `message` 为空表示没有可以展示给调用方的诊断信息（例如 Proxmox 的 HTTP 错误只透传状态码）。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct OpError {
    kind: ErrorKind,
    message: String,
}

impl OpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 只携带类别、不携带消息的错误
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, String::new())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Process, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 路由层错误码
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::NotFound.code(), 404);
        assert_eq!(ErrorKind::Unauthorized.code(), 401);
        assert_eq!(ErrorKind::Upstream(503).code(), 503);
        assert_eq!(ErrorKind::InvalidInput.code(), 400);
        assert_eq!(ErrorKind::Process.code(), 500);
        assert_eq!(ErrorKind::Transport.code(), 500);
        assert_eq!(ErrorKind::Malformed.code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = OpError::not_found("Playbook does not exist.");
        assert_eq!(err.to_string(), "资源不存在: Playbook does not exist.");
        assert!(err.is_not_found());
        assert_eq!(err.code(), 404);
    }
}

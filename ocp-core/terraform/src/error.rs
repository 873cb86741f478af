//! Terraform 执行器错误定义

use ocp_common::OpError;
use thiserror::Error;

/// Terraform 执行结果类型
pub type Result<T> = std::result::Result<T, TerraformError>;

/// Terraform 执行错误
///
/// 进程正常结束但退出码非 0 不属于错误，见 [`crate::RunOutput`]。
#[derive(Error, Debug)]
pub enum TerraformError {
    /// 无法启动进程（可执行文件不存在、工作目录不可访问等）
    #[error("启动 terraform 失败: {0}")]
    Spawn(String),

    /// 命令执行超时
    #[error("terraform 执行超时: {0}")]
    Timeout(String),

    /// 等待进程时出错
    #[error("等待 terraform 进程失败: {0}")]
    Wait(String),
}

impl From<TerraformError> for OpError {
    fn from(err: TerraformError) -> Self {
        match err {
            TerraformError::Spawn(_) => OpError::transport(err.to_string()),
            TerraformError::Timeout(_) | TerraformError::Wait(_) => OpError::process(err.to_string()),
        }
    }
}

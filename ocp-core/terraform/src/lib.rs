//! OCP Terraform 执行器
//!
//! 在固定工作目录中以子进程方式运行 terraform：
//! - `init`
//! - `apply -auto-approve`
//! - `destroy -auto-approve`
//! - `plan -no-color`
//!
//! 退出码为 0 视为成功（返回 stdout），否则失败（返回 stderr）。
//! 进程无法启动或超时属于 [`TerraformError`]，与正常的非 0 退出区分。

mod config;
mod error;
mod runner;

pub use config::TerraformConfig;
pub use error::{Result, TerraformError};
pub use runner::{ProvisioningApi, RunOutput, TerraformRunner};

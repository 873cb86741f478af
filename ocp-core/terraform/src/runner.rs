//! Terraform 子进程执行

use std::process::Stdio;

use async_trait::async_trait;
use ocp_common::{OpError, Outcome};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::TerraformConfig;
use crate::error::{Result, TerraformError};

/// 一次 terraform 命令的结果
///
/// `output` 在成功时为 stdout，失败时为 stderr。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub success: bool,
    pub output: String,
    /// 被信号终止时为 None
    pub exit_code: Option<i32>,
}

impl RunOutput {
    /// 转换为统一结果：失败时诊断文本作为进程错误返回
    pub fn into_outcome(self) -> Outcome<String> {
        if self.success {
            Ok(self.output)
        } else {
            Err(OpError::process(self.output))
        }
    }
}

/// 基础设施编排能力集合
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// `terraform init`
    async fn init(&self) -> Result<RunOutput>;

    /// `terraform apply -auto-approve`
    async fn apply(&self) -> Result<RunOutput>;

    /// `terraform destroy -auto-approve`
    async fn destroy(&self) -> Result<RunOutput>;

    /// `terraform plan -no-color`
    async fn plan(&self) -> Result<RunOutput>;
}

/// Terraform 执行器
///
/// 工作目录在构造时确定，生命周期内不变；不做任何重试。
pub struct TerraformRunner {
    config: TerraformConfig,
}

impl TerraformRunner {
    pub fn new(config: TerraformConfig) -> Self {
        Self { config }
    }

    /// 获取配置
    pub fn config(&self) -> &TerraformConfig {
        &self.config
    }

    /// 查询 terraform 版本
    pub async fn version(&self) -> Result<RunOutput> {
        self.run(&["version"]).await
    }

    /// 在工作目录中运行 terraform 子命令
    pub async fn run(&self, args: &[&str]) -> Result<RunOutput> {
        let label = args.join(" ");
        info!("执行 terraform {} (目录: {})", label, self.config.working_dir.display());

        let mut cmd = Command::new(&self.config.binary);
        cmd.args(args)
            .current_dir(&self.config.working_dir)
            // 非交互模式，避免等待输入
            .env("TF_INPUT", "0")
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()
            .map_err(|e| TerraformError::Spawn(format!("{}: {}", self.config.binary.display(), e)))?;

        let output = timeout(self.config.timeout_duration(), child.wait_with_output())
            .await
            .map_err(|_| TerraformError::Timeout(label.clone()))?
            .map_err(|e| TerraformError::Wait(e.to_string()))?;

        let success = output.status.success();
        let text = if success {
            String::from_utf8_lossy(&output.stdout).to_string()
        } else {
            String::from_utf8_lossy(&output.stderr).to_string()
        };

        if success {
            debug!("terraform {} 完成, 输出长度: {}", label, text.len());
        } else {
            warn!("terraform {} 失败 (退出码 {:?}): {}", label, output.status.code(), text.trim());
        }

        Ok(RunOutput {
            success,
            output: text,
            exit_code: output.status.code(),
        })
    }
}

#[async_trait]
impl ProvisioningApi for TerraformRunner {
    async fn init(&self) -> Result<RunOutput> {
        self.run(&["init"]).await
    }

    async fn apply(&self) -> Result<RunOutput> {
        self.run(&["apply", "-auto-approve"]).await
    }

    async fn destroy(&self) -> Result<RunOutput> {
        self.run(&["destroy", "-auto-approve"]).await
    }

    async fn plan(&self) -> Result<RunOutput> {
        self.run(&["plan", "-no-color"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocp_common::ErrorKind;

    #[test]
    fn test_failed_output_into_outcome() {
        let output = RunOutput {
            success: false,
            output: "Error: No configuration files".to_string(),
            exit_code: Some(1),
        };
        let err = output.into_outcome().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Process);
        assert_eq!(err.message(), "Error: No configuration files");
    }

    #[test]
    fn test_spawn_error_is_transport() {
        let err: OpError = TerraformError::Spawn("terraform: not found".into()).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}

//! Terraform 执行器配置

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Terraform 执行器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// 工作目录（包含 .tf 文件）
    pub working_dir: PathBuf,

    /// terraform 可执行文件
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// 单条命令超时（秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_binary() -> PathBuf {
    PathBuf::from("terraform")
}

fn default_timeout() -> u64 {
    1800
}

impl TerraformConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            binary: default_binary(),
            timeout: default_timeout(),
        }
    }

    /// 设置 terraform 可执行文件
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// 设置超时
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_secs();
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TerraformConfig::new("/srv/terraform");
        assert_eq!(config.binary, PathBuf::from("terraform"));
        assert_eq!(config.timeout_duration(), Duration::from_secs(1800));
    }

    #[test]
    fn test_builder() {
        let config = TerraformConfig::new("/srv/terraform")
            .binary("/usr/local/bin/tofu")
            .timeout(Duration::from_secs(60));
        assert_eq!(config.binary, PathBuf::from("/usr/local/bin/tofu"));
        assert_eq!(config.timeout, 60);
    }
}

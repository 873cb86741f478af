//! Playbook 编排配置

use ocp_ssh_executor::CommandOutput;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 远程命令失败判定策略
///
/// ansible-playbook 在成功时也可能向 stderr 输出警告，部署方可以按需选择判定方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 仅以退出码判定
    ExitStatus,
    /// 仅以 stderr 是否有内容判定
    Stderr,
    /// 退出码非 0 或 stderr 有内容均视为失败
    #[default]
    Either,
}

impl FailurePolicy {
    /// 判断命令输出是否应视为失败
    pub fn is_failure(&self, output: &CommandOutput) -> bool {
        match self {
            Self::ExitStatus => !output.is_success(),
            Self::Stderr => output.has_stderr(),
            Self::Either => !output.is_success() || output.has_stderr(),
        }
    }
}

/// Playbook 编排配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookConfig {
    /// 远程主机上的 playbook 目录（绝对路径）
    pub remote_dir: String,

    /// 远程主机上的 inventory 文件（绝对路径）
    pub inventory_path: String,

    /// 本地暂存目录，未设置时使用系统临时目录
    #[serde(default)]
    pub local_staging_dir: Option<PathBuf>,

    /// 远程命令失败判定策略
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl PlaybookConfig {
    pub fn new(remote_dir: impl Into<String>, inventory_path: impl Into<String>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            inventory_path: inventory_path.into(),
            local_staging_dir: None,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// 设置本地暂存目录
    pub fn local_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_staging_dir = Some(dir.into());
        self
    }

    /// 设置失败判定策略
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// playbook 在远程主机上的完整路径
    pub fn playbook_path(&self, name: &str) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stderr: &str, exit_code: u32) -> CommandOutput {
        CommandOutput {
            stdout: "PLAY RECAP".to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
        }
    }

    #[test]
    fn test_failure_policy() {
        let warning = output("[WARNING]: No inventory was parsed\n", 0);
        let failed = output("", 2);
        let clean = output("", 0);

        assert!(!FailurePolicy::ExitStatus.is_failure(&warning));
        assert!(FailurePolicy::ExitStatus.is_failure(&failed));

        assert!(FailurePolicy::Stderr.is_failure(&warning));
        assert!(!FailurePolicy::Stderr.is_failure(&failed));

        assert!(FailurePolicy::Either.is_failure(&warning));
        assert!(FailurePolicy::Either.is_failure(&failed));
        assert!(!FailurePolicy::Either.is_failure(&clean));
    }

    #[test]
    fn test_default_policy_from_toml_like_json() {
        let config: PlaybookConfig = serde_json::from_str(
            r#"{ "remote_dir": "/etc/ansible/playbooks/", "inventory_path": "/etc/ansible/hosts" }"#,
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Either);
        assert_eq!(config.playbook_path("site.yml"), "/etc/ansible/playbooks/site.yml");
    }

    #[test]
    fn test_policy_names() {
        let policy: FailurePolicy = serde_json::from_str(r#""exit_status""#).unwrap();
        assert_eq!(policy, FailurePolicy::ExitStatus);
    }
}

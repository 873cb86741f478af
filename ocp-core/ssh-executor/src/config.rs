//! SSH 配置

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// SSH 认证方式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthMethod {
    /// 密码认证（通过 sshpass）
    Password(String),
    /// 密钥认证
    Key {
        /// 私钥路径
        key_path: PathBuf,
    },
    /// 使用默认密钥（~/.ssh/id_rsa, ~/.ssh/id_ed25519 等）
    DefaultKey,
}

/// SSH 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// 主机地址
    pub host: String,
    /// 端口（默认 22）
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证方式
    pub auth: AuthMethod,
    /// 连接超时
    #[serde(with = "duration_secs", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// 命令执行超时
    #[serde(with = "duration_secs", default = "default_command_timeout")]
    pub command_timeout: Duration,
    /// 文件传输超时
    #[serde(with = "duration_secs", default = "default_transfer_timeout")]
    pub transfer_timeout: Duration,
    /// 主连接空闲保持时间，进程异常退出时由 ssh 自行回收
    #[serde(with = "duration_secs", default = "default_control_persist")]
    pub control_persist: Duration,
    /// ssh 可执行文件
    #[serde(default = "default_ssh_program")]
    pub ssh_program: PathBuf,
    /// scp 可执行文件
    #[serde(default = "default_scp_program")]
    pub scp_program: PathBuf,
    /// sshpass 可执行文件（仅密码认证使用）
    #[serde(default = "default_sshpass_program")]
    pub sshpass_program: PathBuf,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_transfer_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_control_persist() -> Duration {
    Duration::from_secs(300)
}

fn default_ssh_program() -> PathBuf {
    PathBuf::from("ssh")
}

fn default_scp_program() -> PathBuf {
    PathBuf::from("scp")
}

fn default_sshpass_program() -> PathBuf {
    PathBuf::from("sshpass")
}

impl SshConfig {
    fn with_auth(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            transfer_timeout: default_transfer_timeout(),
            control_persist: default_control_persist(),
            ssh_program: default_ssh_program(),
            scp_program: default_scp_program(),
            sshpass_program: default_sshpass_program(),
        }
    }

    /// 使用密码认证创建配置
    ///
    /// # Arguments
    /// * `host` - 主机地址
    /// * `username` - 用户名
    /// * `password` - 密码
    pub fn with_password(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_auth(host, username, AuthMethod::Password(password.into()))
    }

    /// 使用密钥认证创建配置
    pub fn with_key(host: impl Into<String>, username: impl Into<String>, key_path: impl Into<PathBuf>) -> Self {
        Self::with_auth(host, username, AuthMethod::Key { key_path: key_path.into() })
    }

    /// 使用默认密钥认证创建配置
    pub fn with_default_key(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self::with_auth(host, username, AuthMethod::DefaultKey)
    }

    /// 设置端口
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 设置命令执行超时
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 设置文件传输超时
    pub fn transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// 设置主连接空闲保持时间
    pub fn control_persist(mut self, persist: Duration) -> Self {
        self.control_persist = persist;
        self
    }

    /// 替换 ssh/scp 可执行文件（默认从 PATH 查找）
    pub fn programs(mut self, ssh: impl Into<PathBuf>, scp: impl Into<PathBuf>) -> Self {
        self.ssh_program = ssh.into();
        self.scp_program = scp.into();
        self
    }

    /// 替换 sshpass 可执行文件
    pub fn sshpass_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.sshpass_program = program.into();
        self
    }

    /// 获取 SSH 地址字符串（host:port 格式）
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取 ssh 目标（user@host 格式）
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// 以秒为单位序列化 Duration
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_config() {
        let config = SshConfig::with_password("192.168.1.100", "root", "password123");
        assert_eq!(config.host, "192.168.1.100");
        assert_eq!(config.port, 22);
        assert_eq!(config.username, "root");
        assert_eq!(config.destination(), "root@192.168.1.100");
        assert!(matches!(config.auth, AuthMethod::Password(_)));
    }

    #[test]
    fn test_key_config() {
        let config = SshConfig::with_key("192.168.1.100", "root", "/home/user/.ssh/id_rsa");
        assert!(matches!(config.auth, AuthMethod::Key { .. }));
    }

    #[test]
    fn test_config_builder() {
        let config = SshConfig::with_password("host", "user", "pass")
            .port(2222)
            .connect_timeout(Duration::from_secs(10))
            .transfer_timeout(Duration::from_secs(5))
            .control_persist(Duration::from_secs(60))
            .programs("/opt/ssh/bin/ssh", "/opt/ssh/bin/scp");
        assert_eq!(config.port, 2222);
        assert_eq!(config.address(), "host:2222");
        assert_eq!(config.connect_timeout.as_secs(), 10);
        assert_eq!(config.transfer_timeout.as_secs(), 5);
        assert_eq!(config.control_persist.as_secs(), 60);
        assert_eq!(config.scp_program, PathBuf::from("/opt/ssh/bin/scp"));
    }

    #[test]
    fn test_timeouts_default_when_missing() {
        let json = r#"{
            "host": "10.0.0.5",
            "port": 2200,
            "username": "ansible",
            "auth": { "Password": "secret" },
            "command_timeout": 42
        }"#;
        let config: SshConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port, 2200);
        assert_eq!(config.command_timeout, Duration::from_secs(42));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.control_persist, Duration::from_secs(300));
        assert_eq!(config.ssh_program, PathBuf::from("ssh"));
        assert_eq!(config.scp_program, PathBuf::from("scp"));
    }
}

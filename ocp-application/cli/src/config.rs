//! CLI 配置管理
//!
//! **数据来源**: TOML 文件 (~/.config/ocp/config.toml)，随后由环境变量覆盖。
//!
//! 环境变量与部署脚本保持一致：
//! `PROXMOX_URL`, `PROXMOX_USER`, `PROXMOX_PASSWORD`, `TERRAFORM_WORKING_DIR`,
//! `SSH_HOSTNAME`, `SSH_USERNAME`, `SSH_PASSWORD`, `SSH_PORT`,
//! `LOCAL_PLAYBOOKS_DIR`, `REMOTE_PLAYBOOKS_DIR`, `INVENTORY_PATH`。

use anyhow::{Context, Result};
use ocp_ansible::{FailurePolicy, PlaybookConfig};
use ocp_proxmox::{Credentials, ProxmoxClient, ProxmoxConfig};
use ocp_ssh_executor::SshConfig;
use ocp_terraform::{TerraformConfig, TerraformRunner};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcpConfig {
    #[serde(default)]
    pub proxmox: ProxmoxSection,

    #[serde(default)]
    pub terraform: TerraformSection,

    #[serde(default)]
    pub ssh: SshSection,

    #[serde(default)]
    pub ansible: AnsibleSection,
}

/// Proxmox 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxmoxSection {
    /// API 基础 URL，例如 https://pve:8006/api2/json
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,

    /// 超时与证书校验
    #[serde(flatten)]
    pub client: ProxmoxConfig,
}

/// Terraform 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerraformSection {
    pub working_dir: Option<PathBuf>,

    /// terraform 可执行文件，默认从 PATH 查找
    pub binary: Option<PathBuf>,

    /// 单条命令超时（秒）
    pub timeout: Option<u64>,
}

/// SSH 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshSection {
    pub hostname: Option<String>,
    pub username: Option<String>,

    /// 未设置密码时使用 key_path，二者都未设置时使用默认密钥
    pub password: Option<String>,
    pub key_path: Option<PathBuf>,
    pub port: Option<u16>,

    /// 连接超时（秒）
    pub connect_timeout: Option<u64>,
    /// 命令超时（秒）
    pub command_timeout: Option<u64>,
    /// 文件传输超时（秒）
    pub transfer_timeout: Option<u64>,
    /// 主连接空闲保持时间（秒）
    pub control_persist: Option<u64>,
}

/// Ansible 配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnsibleSection {
    /// 本地暂存目录
    pub local_playbooks_dir: Option<PathBuf>,
    pub remote_playbooks_dir: Option<String>,
    pub inventory_path: Option<String>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// 子命令需要的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Proxmox,
    Terraform,
    Ansible,
}

impl OcpConfig {
    /// 获取默认配置文件路径
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("无法获取用户主目录")?;
        Ok(home.join(".config").join("ocp").join("config.toml"))
    }

    /// 加载配置文件并应用环境变量
    ///
    /// 显式指定的文件必须存在；默认路径不存在时使用空配置。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;

        toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 用环境变量覆盖配置文件中的值
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(v) = var("PROXMOX_URL") {
            self.proxmox.url = Some(v);
        }
        if let Some(v) = var("PROXMOX_USER") {
            self.proxmox.user = Some(v);
        }
        if let Some(v) = var("PROXMOX_PASSWORD") {
            self.proxmox.password = Some(v);
        }
        if let Some(v) = var("TERRAFORM_WORKING_DIR") {
            self.terraform.working_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("SSH_HOSTNAME") {
            self.ssh.hostname = Some(v);
        }
        if let Some(v) = var("SSH_USERNAME") {
            self.ssh.username = Some(v);
        }
        if let Some(v) = var("SSH_PASSWORD") {
            self.ssh.password = Some(v);
        }
        if let Some(v) = var("SSH_PORT") {
            let port = v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("SSH_PORT 不是合法端口: {:?}", v))?;
            self.ssh.port = Some(port);
        }
        if let Some(v) = var("LOCAL_PLAYBOOKS_DIR") {
            self.ansible.local_playbooks_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("REMOTE_PLAYBOOKS_DIR") {
            self.ansible.remote_playbooks_dir = Some(v);
        }
        if let Some(v) = var("INVENTORY_PATH") {
            self.ansible.inventory_path = Some(v);
        }

        Ok(())
    }

    /// 检查组件需要的配置项，一次性报告所有缺失项
    pub fn validate(&self, component: Component) -> Result<()> {
        let mut missing = Vec::new();
        let mut require = |present: bool, name: &'static str| {
            if !present {
                missing.push(name);
            }
        };

        match component {
            Component::Proxmox => {
                require(self.proxmox.url.is_some(), "proxmox.url (PROXMOX_URL)");
                require(self.proxmox.user.is_some(), "proxmox.user (PROXMOX_USER)");
                require(self.proxmox.password.is_some(), "proxmox.password (PROXMOX_PASSWORD)");
            }
            Component::Terraform => {
                require(
                    self.terraform.working_dir.is_some(),
                    "terraform.working_dir (TERRAFORM_WORKING_DIR)",
                );
            }
            Component::Ansible => {
                require(self.ssh.hostname.is_some(), "ssh.hostname (SSH_HOSTNAME)");
                require(self.ssh.username.is_some(), "ssh.username (SSH_USERNAME)");
                require(
                    self.ansible.remote_playbooks_dir.is_some(),
                    "ansible.remote_playbooks_dir (REMOTE_PLAYBOOKS_DIR)",
                );
                require(
                    self.ansible.inventory_path.is_some(),
                    "ansible.inventory_path (INVENTORY_PATH)",
                );
            }
        }

        if !missing.is_empty() {
            anyhow::bail!("缺少配置项: {}", missing.join(", "));
        }
        Ok(())
    }

    /// 构造 Proxmox 客户端
    pub fn proxmox_client(&self) -> Result<ProxmoxClient> {
        let section = &self.proxmox;
        let url = section.url.as_deref().context("缺少 PROXMOX_URL")?;
        let credentials = Credentials::new(
            section.user.as_deref().context("缺少 PROXMOX_USER")?,
            section.password.as_deref().context("缺少 PROXMOX_PASSWORD")?,
        );

        ProxmoxClient::new(url, credentials, section.client.clone())
            .context("创建 Proxmox 客户端失败")
    }

    /// 构造 Terraform 执行器
    pub fn terraform_runner(&self) -> Result<TerraformRunner> {
        let section = &self.terraform;
        let working_dir = section
            .working_dir
            .as_ref()
            .context("缺少 TERRAFORM_WORKING_DIR")?;

        let mut config = TerraformConfig::new(working_dir);
        if let Some(binary) = &section.binary {
            config = config.binary(binary);
        }
        if let Some(secs) = section.timeout {
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(TerraformRunner::new(config))
    }

    /// 构造 SSH 配置
    pub fn ssh_config(&self) -> Result<SshConfig> {
        let section = &self.ssh;
        let host = section.hostname.as_deref().context("缺少 SSH_HOSTNAME")?;
        let username = section.username.as_deref().context("缺少 SSH_USERNAME")?;

        let mut config = match (&section.password, &section.key_path) {
            (Some(password), _) => SshConfig::with_password(host, username, password),
            (None, Some(key_path)) => SshConfig::with_key(host, username, key_path),
            (None, None) => SshConfig::with_default_key(host, username),
        };

        if let Some(port) = section.port {
            config = config.port(port);
        }
        if let Some(secs) = section.connect_timeout {
            config = config.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = section.command_timeout {
            config = config.command_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = section.transfer_timeout {
            config = config.transfer_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = section.control_persist {
            config = config.control_persist(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// 构造 Playbook 配置
    pub fn playbook_config(&self) -> Result<PlaybookConfig> {
        let section = &self.ansible;
        let mut config = PlaybookConfig::new(
            section
                .remote_playbooks_dir
                .as_deref()
                .context("缺少 REMOTE_PLAYBOOKS_DIR")?,
            section.inventory_path.as_deref().context("缺少 INVENTORY_PATH")?,
        )
        .failure_policy(section.failure_policy);

        if let Some(dir) = &section.local_playbooks_dir {
            config = config.local_staging_dir(dir);
        }
        Ok(config)
    }
}

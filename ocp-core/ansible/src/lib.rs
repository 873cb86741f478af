//! OCP Ansible 编排
//!
//! 通过远程会话管理 Ansible 控制节点上的 playbook 与 inventory：
//!
//! - **部署/修改**: 内容先写入本地暂存文件，再上传到远程 playbook 目录
//! - **执行**: 在远程 playbook 目录中运行 `ansible-playbook`
//! - **查询**: 列表、详情（YAML 解析为结构化数据）
//! - **删除**: 删除前检查远程文件是否存在
//!
//! 每个操作都在独立的会话中完成，会话在所有分支上都会关闭。
//!
//! # 示例
//!
//! ```ignore
//! use ocp_ansible::{PlaybookApi, PlaybookConfig, PlaybookManager};
//! use ocp_ssh_executor::{SshClient, SshConfig};
//!
//! let shell = SshClient::new(SshConfig::with_password("10.0.0.5", "root", "password"));
//! let mut manager = PlaybookManager::new(
//!     shell,
//!     PlaybookConfig::new("/etc/ansible/playbooks", "/etc/ansible/hosts"),
//! );
//! let names = manager.list().await?;
//! ```

pub mod commands;
pub mod config;
pub mod manager;

pub use config::{FailurePolicy, PlaybookConfig};
pub use manager::{PlaybookApi, PlaybookDetail, PlaybookManager, INVENTORY_NOT_FOUND, PLAYBOOK_NOT_FOUND};

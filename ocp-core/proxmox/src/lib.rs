//! OCP Proxmox 客户端
//!
//! 提供与 Proxmox VE REST API 交互的客户端实现：
//!
//! - **认证**: `login` 获取 ticket 与 CSRF token，之后的请求自动携带
//! - **虚拟机管理** (`HypervisorApi`): 列表、创建、删除、修改配置、状态查询、启停
//! - **节点管理**: 节点列表、节点统计信息
//! - **会话作用域**: `with_session` 登录、执行、登出
//!
//! 所有操作返回 [`ocp_common::Outcome`]：HTTP 非 2xx 透传状态码，其他失败统一为 500。
//!
//! # 示例
//!
//! ```ignore
//! use ocp_proxmox::{paths, Credentials, HypervisorApi, ProxmoxClient, ProxmoxConfig};
//!
//! let client = ProxmoxClient::new(
//!     "https://pve:8006/api2/json",
//!     Credentials::new("root@pam", "password"),
//!     ProxmoxConfig::default(),
//! )?;
//!
//! let status = client
//!     .with_session(paths::LOGIN_PATH, |c| async move {
//!         c.get_vm_status(&paths::vm_status_current("pve1", 101)).await
//!     })
//!     .await;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod paths;

pub use api::HypervisorApi;
pub use client::{Credentials, ProxmoxClient, ProxmoxConfig};
pub use error::{ProxmoxError, Result};

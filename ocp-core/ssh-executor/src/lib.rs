//! OCP SSH 执行器
//!
//! 提供远程主机的会话能力，支持：
//! - 密码认证（sshpass）
//! - SSH 密钥认证
//! - 基于 ControlMaster 的单连接复用：命令执行和 scp 文件上传共用一条连接
//! - 显式的连接、命令、传输超时
//!
//! # 示例
//!
//! ```ignore
//! use ocp_ssh_executor::{SshClient, SshConfig};
//!
//! let config = SshConfig::with_password("192.168.1.100", "root", "password").port(2222);
//! let mut client = SshClient::new(config);
//! client.connect().await?;
//! let output = client.execute("ls -la").await;
//! client.disconnect().await?;
//! println!("{}", output?.stdout);
//! ```

mod client;
mod config;
mod error;
mod shell;

pub use client::{CommandOutput, SshClient};
pub use config::{AuthMethod, SshConfig};
pub use error::{Result, SshError};
pub use shell::RemoteShell;

//! OCP 通用类型定义
//!
//! 此 crate 包含各编排客户端（Proxmox、Terraform、Ansible）共享的类型：
//! - [`OpError`] / [`ErrorKind`]：带标签的错误分类（未找到、上游错误、进程错误、传输错误…）
//! - [`Outcome`]：所有编排操作的返回类型
//! - [`OperationResult`]：面向路由层的三元组 `(success, payload, error_code)`

mod error;
mod result;
mod shell;

pub use error::{ErrorKind, OpError, Outcome};
pub use result::OperationResult;
pub use shell::{is_plain_file_name, shell_quote};

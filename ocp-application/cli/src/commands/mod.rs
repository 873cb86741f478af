//! CLI 命令处理模块

pub mod output;
pub mod playbook;
pub mod terraform;
pub mod vm;

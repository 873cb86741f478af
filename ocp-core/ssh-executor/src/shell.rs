//! 远程会话抽象
//!
//! 编排层只依赖 [`RemoteShell`]，生产环境使用 [`SshClient`]，测试中可以替换为内存实现。

use std::path::Path;

use async_trait::async_trait;

use crate::client::{CommandOutput, SshClient};
use crate::error::Result;

/// 远程会话：连接 / 执行命令 / 上传文件 / 断开
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// 建立 shell 连接和文件传输通道
    async fn connect(&mut self) -> Result<()>;

    /// 执行命令，返回 stdout/stderr，不解释退出码
    async fn run_command(&self, command: &str) -> Result<CommandOutput>;

    /// 上传本地文件到远程路径
    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// 关闭文件传输通道和 shell 连接，部分连接失败后调用也必须安全
    async fn disconnect(&mut self) -> Result<()>;
}

#[async_trait]
impl RemoteShell for SshClient {
    async fn connect(&mut self) -> Result<()> {
        SshClient::connect(self).await
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        self.execute(command).await
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        self.upload(local_path, remote_path).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        SshClient::disconnect(self).await
    }
}

//! SSH 客户端实现
//!
//! 使用系统 ssh/sshpass/scp 命令。`connect` 建立一条 OpenSSH 主连接（ControlMaster），
//! 之后的命令执行和 scp 文件传输都复用该控制套接字，`disconnect` 关闭主连接。

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{AuthMethod, SshConfig};
use crate::error::{Result, SshError};

/// 命令执行输出
///
/// 输出按 UTF-8 解码，非法字节被替换为 U+FFFD。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
    /// 退出码（被信号终止时为 None）
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// 检查命令是否成功执行
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 标准错误是否有内容（忽略空白）
    pub fn has_stderr(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// 主连接控制套接字
struct ControlSocket {
    /// 私有临时目录，drop 时删除
    dir: TempDir,
}

impl ControlSocket {
    fn path(&self) -> PathBuf {
        self.dir.path().join("ctl")
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("master.log")
    }
}

/// SSH 客户端（使用系统 ssh 命令）
///
/// 每个实例只对应一次会话：`connect` → 若干操作 → `disconnect`。
pub struct SshClient {
    config: SshConfig,
    control: Option<ControlSocket>,
}

impl SshClient {
    /// 创建未连接的客户端
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            control: None,
        }
    }

    /// 是否已建立主连接
    pub fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    /// 连接到 SSH 服务器
    ///
    /// 未知主机密钥直接信任（目标为预先配置的内网主机）。
    pub async fn connect(&mut self) -> Result<()> {
        if self.control.is_some() {
            debug!("SSH 主连接已存在: {}", self.config.address());
            return Ok(());
        }

        info!("正在连接 SSH: {}@{}", self.config.username, self.config.address());

        let control = ControlSocket {
            dir: tempfile::Builder::new().prefix("ocp-ssh-").tempdir()?,
        };

        let mut cmd = self.auth_command();
        self.common_options(&mut cmd);
        cmd.arg("-o").arg("NumberOfPasswordPrompts=1")
            .arg("-o").arg("ControlMaster=yes")
            .arg("-o").arg(format!("ControlPath={}", control.path().display()))
            .arg("-o").arg(format!("ControlPersist={}", self.config.control_persist.as_secs().max(1)))
            .arg("-E").arg(control.log_path())
            .arg("-f")
            .arg("-N")
            .arg("-p").arg(self.config.port.to_string())
            .arg(self.config.destination());

        // ssh -f 在后台保留 stdout/stderr，必须丢弃，诊断信息写入 -E 日志
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn()
            .map_err(|e| SshError::ConnectionError(format!("启动 SSH 进程失败: {}", e)))?;

        let wait_for = self.config.connect_timeout + Duration::from_secs(5);
        let status = timeout(wait_for, child.wait())
            .await
            .map_err(|_| SshError::TimeoutError(format!("连接 {} 超时", self.config.address())))?
            .map_err(|e| SshError::ConnectionError(format!("等待 SSH 进程失败: {}", e)))?;

        if !status.success() {
            let log = std::fs::read_to_string(control.log_path()).unwrap_or_default();
            let log = log.trim().to_string();
            if status.code() == Some(5)
                || log.contains("Permission denied")
                || log.contains("Authentication failed")
            {
                return Err(SshError::AuthenticationError(log));
            }
            return Err(SshError::ConnectionError(format!(
                "退出码 {:?}: {}",
                status.code(),
                log
            )));
        }

        self.control = Some(control);

        // 验证连接（执行简单命令）
        debug!("验证 SSH 连接...");
        let output = match self.execute("echo connected").await {
            Ok(output) => output,
            Err(e) => {
                self.close_master().await;
                return Err(e);
            }
        };

        if output.stdout.trim() != "connected" {
            self.close_master().await;
            return Err(SshError::ConnectionError(format!(
                "SSH 连接验证失败: {}",
                output.stderr.trim()
            )));
        }

        info!("SSH 连接成功: {}@{}", self.config.username, self.config.address());
        Ok(())
    }

    /// 执行命令
    ///
    /// 只负责采集 stdout/stderr/退出码，是否失败由调用方判断。
    pub async fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!("执行命令: {}", command);

        timeout(self.config.command_timeout, self.execute_internal(command))
            .await
            .map_err(|_| SshError::TimeoutError(format!("命令执行超时: {}", command)))?
    }

    async fn execute_internal(&self, command: &str) -> Result<CommandOutput> {
        let control = self.control.as_ref().ok_or(SshError::NotConnected)?;

        let mut cmd = Command::new(&self.config.ssh_program);
        self.multiplexed_options(&mut cmd, control);
        cmd.arg("-p").arg(self.config.port.to_string())
            .arg(self.config.destination())
            .arg(command);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await
            .map_err(|e| SshError::ExecutionError(format!("启动 SSH 进程失败: {}", e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().map(|c| c as u32),
        };

        // ssh 自身失败（主连接断开等）时退出码为 255
        if result.exit_code == Some(255) && !control.path().exists() {
            return Err(SshError::ConnectionError(result.stderr.trim().to_string()));
        }

        debug!(
            "命令执行完成, 退出码: {:?}, stdout 长度: {}, stderr 长度: {}",
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }

    /// 上传本地文件到远程路径（覆盖已有文件）
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let control = self.control.as_ref().ok_or(SshError::NotConnected)?;
        debug!("上传文件: {} -> {}:{}", local_path.display(), self.config.host, remote_path);

        let mut cmd = Command::new(&self.config.scp_program);
        self.multiplexed_options(&mut cmd, control);
        cmd.arg("-q")
            .arg("-P").arg(self.config.port.to_string())
            .arg(local_path)
            .arg(format!("{}:{}", self.config.destination(), remote_path));

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.config.transfer_timeout, cmd.output())
            .await
            .map_err(|_| SshError::TimeoutError(format!("文件传输超时: {}", remote_path)))?
            .map_err(|e| SshError::TransferError(format!("启动 scp 进程失败: {}", e)))?;

        if !output.status.success() {
            return Err(SshError::TransferError(format!(
                "{} -> {}: {}",
                local_path.display(),
                remote_path,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }

    /// 关闭连接
    ///
    /// 未连接或连接建立一半时调用同样安全。
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.control.is_some() {
            info!("断开 SSH 连接: {}", self.config.address());
        }
        self.close_master().await;
        Ok(())
    }

    /// 获取配置
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    async fn close_master(&mut self) {
        let Some(control) = self.control.take() else {
            return;
        };

        if control.path().exists() {
            let mut cmd = self.exit_command(&control);
            cmd.stderr(Stdio::piped()).kill_on_drop(true);

            match timeout(self.config.connect_timeout, cmd.output()).await {
                Ok(Ok(output)) if output.status.success() => {}
                Ok(Ok(output)) => warn!(
                    "关闭 SSH 主连接失败: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                Ok(Err(e)) => warn!("关闭 SSH 主连接失败: {}", e),
                Err(_) => warn!("关闭 SSH 主连接超时"),
            }
        }
        // control 在此 drop，删除临时目录
    }

    /// 向主连接发送 `-O exit`
    fn exit_command(&self, control: &ControlSocket) -> Command {
        let mut cmd = Command::new(&self.config.ssh_program);
        cmd.arg("-o").arg(format!("ControlPath={}", control.path().display()))
            .arg("-O").arg("exit")
            .arg("-p").arg(self.config.port.to_string())
            .arg(self.config.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// 按认证方式构造主连接命令
    fn auth_command(&self) -> Command {
        match &self.config.auth {
            AuthMethod::Password(password) => {
                // 使用 sshpass 进行密码认证，密码通过环境变量传递避免出现在进程列表
                let mut cmd = Command::new(&self.config.sshpass_program);
                cmd.arg("-e").env("SSHPASS", password);
                cmd.arg(&self.config.ssh_program);
                cmd
            }
            AuthMethod::Key { key_path } => {
                let mut cmd = Command::new(&self.config.ssh_program);
                let expanded_path = expand_path(key_path);
                cmd.arg("-i").arg(expanded_path);
                cmd
            }
            AuthMethod::DefaultKey => Command::new(&self.config.ssh_program),
        }
    }

    /// 通用 SSH 参数
    fn common_options(&self, cmd: &mut Command) {
        cmd.arg("-o").arg("StrictHostKeyChecking=no")
            .arg("-o").arg("UserKnownHostsFile=/dev/null")
            // 避免 "Permanently added ..." 之类的提示写入 stderr
            .arg("-o").arg("LogLevel=ERROR")
            .arg("-o").arg(format!("ConnectTimeout={}", self.config.connect_timeout.as_secs().max(1)));
    }

    /// 复用主连接的参数，主连接失效时直接失败而不是重新认证
    fn multiplexed_options(&self, cmd: &mut Command, control: &ControlSocket) {
        cmd.arg("-o").arg(format!("ControlPath={}", control.path().display()))
            .arg("-o").arg("ControlMaster=no")
            .arg("-o").arg("BatchMode=yes");
        self.common_options(cmd);
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        let Some(control) = self.control.take() else {
            return;
        };
        warn!("SSH 客户端未显式断开，关闭主连接: {}", self.config.address());

        let mut cmd = self.exit_command(&control);
        match tokio::runtime::Handle::try_current() {
            // 不阻塞运行时线程；控制目录在命令结束后才删除
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = cmd.status().await {
                        warn!("关闭 SSH 主连接失败: {}", e);
                    }
                    drop(control);
                });
            }
            Err(_) => {
                let _ = cmd.as_std_mut().status();
            }
        }
    }
}

/// 展开路径（处理 ~ 等）
fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            let expanded = path_str.replacen('~', &home.to_string_lossy(), 1);
            return PathBuf::from(expanded);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output() {
        let output = CommandOutput {
            stdout: "hello".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert!(output.is_success());
        assert!(!output.has_stderr());
    }

    #[test]
    fn test_command_output_with_stderr() {
        let output = CommandOutput {
            stdout: "partial".to_string(),
            stderr: "warning: deprecated\n".to_string(),
            exit_code: Some(0),
        };
        assert!(output.is_success());
        assert!(output.has_stderr());

        let signalled = CommandOutput { exit_code: None, ..output };
        assert!(!signalled.is_success());
    }

    #[test]
    fn test_expand_path() {
        let path = PathBuf::from("/etc/hosts");
        assert_eq!(expand_path(&path), path);
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let client = SshClient::new(SshConfig::with_password("127.0.0.1", "root", "pw"));
        assert!(!client.is_connected());
        assert!(matches!(client.execute("true").await, Err(SshError::NotConnected)));
        assert!(matches!(
            client.upload(Path::new("/etc/hosts"), "/tmp/hosts").await,
            Err(SshError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_noop() {
        let mut client = SshClient::new(SshConfig::with_default_key("127.0.0.1", "root"));
        assert!(client.disconnect().await.is_ok());
        assert!(client.disconnect().await.is_ok());
    }
}

//! Playbook 生命周期管理
//!
//! 远程文件系统是唯一的数据来源，本地不保留任何缓存。每个操作都在一次独立的
//! 远程会话中完成：连接 → 存在性检查 → 操作 → 断开，任何分支都会断开连接。

use std::io::Write;

use async_trait::async_trait;
use ocp_common::{is_plain_file_name, OpError, Outcome};
use ocp_ssh_executor::{CommandOutput, RemoteShell};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::commands;
use crate::config::PlaybookConfig;

pub const PLAYBOOK_NOT_FOUND: &str = "Playbook does not exist.";
pub const INVENTORY_NOT_FOUND: &str = "Inventory file does not exist.";

/// Playbook 详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookDetail {
    /// 文件名
    pub name: String,
    /// 解析后的结构化内容
    pub content: serde_json::Value,
    /// 原始文本（必须是合法 UTF-8）
    pub raw: String,
}

/// Playbook 编排能力集合
#[async_trait]
pub trait PlaybookApi: Send {
    /// 上传新的 playbook（已存在则覆盖）
    async fn deploy(&mut self, name: &str, content: &str) -> Outcome<String>;

    /// 在远程 playbook 目录中执行 `ansible-playbook -i <inventory> <name>`，返回 stdout
    async fn execute(&mut self, name: &str) -> Outcome<String>;

    /// 覆盖已存在的 playbook
    async fn modify(&mut self, name: &str, new_content: &str) -> Outcome<String>;

    /// 列出远程目录中的 *.yml 文件名
    async fn list(&mut self) -> Outcome<Vec<String>>;

    /// 删除已存在的 playbook
    async fn delete(&mut self, name: &str) -> Outcome<String>;

    /// 读取并解析 playbook
    async fn detail(&mut self, name: &str) -> Outcome<PlaybookDetail>;

    /// 覆盖已存在的 inventory 文件
    async fn modify_hosts(&mut self, new_content: &str) -> Outcome<String>;
}

/// 在一次远程会话中执行表达式，无论结果如何都会断开连接
macro_rules! in_session {
    ($manager:expr, $op:expr) => {{
        let outcome = match $manager.open().await {
            Ok(()) => $op.await,
            Err(e) => Err(e),
        };
        $manager.close().await;
        outcome
    }};
}

/// Playbook 管理器
///
/// 按请求构造，持有独占的远程会话，不在请求之间共享。
pub struct PlaybookManager<S: RemoteShell> {
    shell: S,
    config: PlaybookConfig,
}

impl<S: RemoteShell> PlaybookManager<S> {
    pub fn new(shell: S, config: PlaybookConfig) -> Self {
        Self { shell, config }
    }

    /// 获取配置
    pub fn config(&self) -> &PlaybookConfig {
        &self.config
    }

    /// 取回底层会话
    pub fn into_shell(self) -> S {
        self.shell
    }

    async fn open(&mut self) -> Outcome<()> {
        self.shell.connect().await.map_err(|e| {
            warn!("远程会话连接失败: {}", e);
            OpError::from(e)
        })
    }

    async fn close(&mut self) {
        if let Err(e) = self.shell.disconnect().await {
            warn!("远程会话断开失败: {}", e);
        }
    }

    async fn run(&self, command: &str) -> Outcome<CommandOutput> {
        debug!("远程命令: {}", command);
        Ok(self.shell.run_command(command).await?)
    }

    /// 按配置的策略检查命令输出
    fn check(&self, output: CommandOutput) -> Outcome<CommandOutput> {
        if !self.config.failure_policy.is_failure(&output) {
            return Ok(output);
        }

        let diagnostic = if output.has_stderr() {
            output.stderr.trim().to_string()
        } else if !output.stdout.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            format!("退出码 {:?}", output.exit_code)
        };
        warn!("远程命令失败: {}", diagnostic);
        Err(OpError::process(diagnostic))
    }

    /// 只有明确的 1/0 应答才算存在性结论，其他输出按失败处理
    async fn file_exists(&self, path: &str) -> Outcome<bool> {
        let output = self.run(&commands::file_exists(path)).await?;
        let clean = output.is_success() && !output.has_stderr();

        match output.stdout.trim() {
            "1" if clean => Ok(true),
            "0" if clean => Ok(false),
            _ => {
                let diagnostic = if output.has_stderr() {
                    output.stderr.trim().to_string()
                } else {
                    format!("存在性检查无效应答 (退出码 {:?}): {:?}", output.exit_code, output.stdout)
                };
                warn!("远程存在性检查失败: {} - {}", path, diagnostic);
                Err(OpError::process(diagnostic))
            }
        }
    }

    async fn require_file(&self, path: &str, missing: &str) -> Outcome<()> {
        if self.file_exists(path).await? {
            Ok(())
        } else {
            info!("远程文件不存在: {}", path);
            Err(OpError::not_found(missing))
        }
    }

    /// 写入本地临时文件后上传，临时文件在返回时删除
    async fn upload_content(&self, content: &str, remote_path: &str) -> Outcome<()> {
        let staged = self.stage(content)?;
        self.shell.upload_file(staged.path(), remote_path).await?;
        debug!("已上传: {}", remote_path);
        Ok(())
    }

    fn stage(&self, content: &str) -> Outcome<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ocp-playbook-").suffix(".yml");

        let mut file = match &self.config.local_staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| OpError::transport(format!("创建本地暂存文件失败: {}", e)))?;

        file.write_all(content.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| OpError::transport(format!("写入本地暂存文件失败: {}", e)))?;

        Ok(file)
    }

    async fn deploy_in_session(&self, name: &str, content: &str) -> Outcome<String> {
        self.upload_content(content, &self.config.playbook_path(name)).await?;
        Ok(format!("Playbook {} deployed successfully.", name))
    }

    async fn execute_in_session(&self, name: &str) -> Outcome<String> {
        self.require_file(&self.config.playbook_path(name), PLAYBOOK_NOT_FOUND).await?;

        let command = commands::run_playbook(&self.config.remote_dir, &self.config.inventory_path, name);
        let output = self.check(self.run(&command).await?)?;
        Ok(output.stdout)
    }

    async fn modify_in_session(&self, name: &str, new_content: &str) -> Outcome<String> {
        let path = self.config.playbook_path(name);
        self.require_file(&path, PLAYBOOK_NOT_FOUND).await?;
        self.upload_content(new_content, &path).await?;
        Ok("Playbook updated successfully.".to_string())
    }

    async fn list_in_session(&self) -> Outcome<Vec<String>> {
        let output = self.check(self.run(&commands::list_playbooks(&self.config.remote_dir)).await?)?;

        let names: Vec<String> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.rsplit('/').next().unwrap_or(line).to_string())
            .collect();

        if names.is_empty() {
            return Err(OpError::process("No playbooks found."));
        }
        Ok(names)
    }

    async fn delete_in_session(&self, name: &str) -> Outcome<String> {
        let path = self.config.playbook_path(name);
        self.require_file(&path, PLAYBOOK_NOT_FOUND).await?;
        self.check(self.run(&commands::remove_file(&path)).await?)?;
        Ok("Playbook deleted successfully.".to_string())
    }

    async fn detail_in_session(&self, name: &str) -> Outcome<PlaybookDetail> {
        let path = self.config.playbook_path(name);
        self.require_file(&path, PLAYBOOK_NOT_FOUND).await?;

        let output = self.check(self.run(&commands::read_file(&path)).await?)?;
        if output.stdout.contains(char::REPLACEMENT_CHARACTER) {
            return Err(OpError::malformed(format!("{} 不是合法的 UTF-8 文本", name)));
        }
        let content = parse_yaml(&output.stdout)?;

        Ok(PlaybookDetail {
            name: name.to_string(),
            content,
            raw: output.stdout,
        })
    }

    async fn modify_hosts_in_session(&self, new_content: &str) -> Outcome<String> {
        let path = self.config.inventory_path.as_str();
        self.require_file(path, INVENTORY_NOT_FOUND).await?;
        self.upload_content(new_content, path).await?;
        Ok("Inventory file updated successfully.".to_string())
    }
}

#[async_trait]
impl<S: RemoteShell> PlaybookApi for PlaybookManager<S> {
    async fn deploy(&mut self, name: &str, content: &str) -> Outcome<String> {
        info!("部署 playbook: {}", name);
        validate_name(name)?;
        parse_yaml(content)?;
        in_session!(self, self.deploy_in_session(name, content))
    }

    async fn execute(&mut self, name: &str) -> Outcome<String> {
        info!("执行 playbook: {}", name);
        validate_name(name)?;
        in_session!(self, self.execute_in_session(name))
    }

    async fn modify(&mut self, name: &str, new_content: &str) -> Outcome<String> {
        info!("修改 playbook: {}", name);
        validate_name(name)?;
        parse_yaml(new_content)?;
        in_session!(self, self.modify_in_session(name, new_content))
    }

    async fn list(&mut self) -> Outcome<Vec<String>> {
        info!("查询 playbook 列表: {}", self.config.remote_dir);
        in_session!(self, self.list_in_session())
    }

    async fn delete(&mut self, name: &str) -> Outcome<String> {
        info!("删除 playbook: {}", name);
        validate_name(name)?;
        in_session!(self, self.delete_in_session(name))
    }

    async fn detail(&mut self, name: &str) -> Outcome<PlaybookDetail> {
        info!("查询 playbook 详情: {}", name);
        validate_name(name)?;
        in_session!(self, self.detail_in_session(name))
    }

    async fn modify_hosts(&mut self, new_content: &str) -> Outcome<String> {
        info!("修改 inventory: {}", self.config.inventory_path);
        in_session!(self, self.modify_hosts_in_session(new_content))
    }
}

/// playbook 名称只能是远程目录下的普通文件名，且不能以 `-` 开头（会被当作命令行选项）
fn validate_name(name: &str) -> Outcome<()> {
    if is_plain_file_name(name) && name.trim() == name && !name.starts_with('-') {
        Ok(())
    } else {
        Err(OpError::invalid_input(format!("非法的 playbook 名称: {:?}", name)))
    }
}

/// 解析 YAML 文档并转换为 JSON 值
fn parse_yaml(text: &str) -> Outcome<serde_json::Value> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| OpError::malformed(format!("YAML 解析失败: {}", e)))?;
    serde_json::to_value(value)
        .map_err(|e| OpError::malformed(format!("YAML 内容无法转换: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocp_common::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("site.yml").is_ok());
        assert!(validate_name("nginx-install.yaml").is_ok());
        assert_eq!(validate_name("../hosts").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(validate_name("roles/site.yml").unwrap_err().code(), 400);
        assert!(validate_name(" site.yml").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("--syntax-check").is_err());
        assert!(validate_name("-e@vars.yml").is_err());
        assert!(validate_name("site-v2.yml").is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let value = parse_yaml("---\n- hosts: all\n  tasks: []\n").unwrap();
        assert_eq!(value, json!([{ "hosts": "all", "tasks": [] }]));

        let err = parse_yaml("- hosts: all\n  tasks: [\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.message().starts_with("YAML 解析失败"));
    }
}

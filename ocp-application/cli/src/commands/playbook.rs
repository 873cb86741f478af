//! Ansible playbook 管理命令
//!
//! 每条命令使用新建的 SSH 会话，命令结束时会话已关闭。

use crate::config::OcpConfig;
use crate::PlaybookAction;
use anyhow::{Context, Result};
use ocp_ansible::{PlaybookApi, PlaybookManager};
use ocp_common::OperationResult;
use ocp_ssh_executor::SshClient;
use std::fs;
use std::path::Path;

pub async fn handle(action: PlaybookAction, config: &OcpConfig) -> Result<OperationResult> {
    let shell = SshClient::new(config.ssh_config()?);
    let mut manager = PlaybookManager::new(shell, config.playbook_config()?);

    let result: OperationResult = match action {
        PlaybookAction::Deploy { name, file } => {
            let content = read_content(&file)?;
            manager.deploy(&name, &content).await.into()
        }
        PlaybookAction::Execute { name } => manager.execute(&name).await.into(),
        PlaybookAction::Modify { name, file } => {
            let content = read_content(&file)?;
            manager.modify(&name, &content).await.into()
        }
        PlaybookAction::List => manager.list().await.into(),
        PlaybookAction::Delete { name } => manager.delete(&name).await.into(),
        PlaybookAction::Detail { name } => manager.detail(&name).await.into(),
        PlaybookAction::Hosts { file } => {
            let content = read_content(&file)?;
            manager.modify_hosts(&content).await.into()
        }
    };

    Ok(result)
}

fn read_content(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("读取文件失败: {:?}", path))
}

//! Proxmox 虚拟机管理命令
//!
//! 每条命令使用独立的认证会话：登录 → 调用 → 登出。

use crate::config::OcpConfig;
use crate::{VmAction, VmParams};
use anyhow::{Context, Result};
use ocp_common::{OperationResult, Outcome};
use ocp_proxmox::{paths, HypervisorApi, ProxmoxClient};
use serde_json::{json, Value};
use std::fs;
use tracing::info;

pub async fn handle(action: VmAction, config: &OcpConfig) -> Result<OperationResult> {
    let client = config.proxmox_client()?;

    let outcome = match action {
        VmAction::Login => login(client).await,
        VmAction::Nodes => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move { c.list_nodes(&paths::nodes()).await })
                .await
        }
        VmAction::NodeStats { node } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.get_node_statistics(&paths::node_status(&node)).await
                })
                .await
        }
        VmAction::List { node } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.list_vms(&paths::node_qemu(&node)).await
                })
                .await
        }
        VmAction::Create { node, params } => {
            let body = load_params(&params)?;
            info!("创建虚拟机: 节点 {}", node);
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.create_vm(&paths::node_qemu(&node), &body).await
                })
                .await
        }
        VmAction::Destroy { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.destroy_vm(&paths::vm(&node, vmid)).await
                })
                .await
        }
        VmAction::Update { node, vmid, params } => {
            let body = load_params(&params)?;
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.update_vm(&paths::vm_config(&node, vmid), &body).await
                })
                .await
        }
        VmAction::Config { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.get_vm_config(&paths::vm_config(&node, vmid)).await
                })
                .await
        }
        VmAction::Status { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.get_vm_status(&paths::vm_status_current(&node, vmid)).await
                })
                .await
        }
        VmAction::Start { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.start_vm(&paths::vm_status_action(&node, vmid, "start")).await
                })
                .await
        }
        VmAction::Stop { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.stop_vm(&paths::vm_status_action(&node, vmid, "stop")).await
                })
                .await
        }
        VmAction::Reboot { node, vmid } => {
            client
                .with_session(paths::LOGIN_PATH, |c| async move {
                    c.reboot_vm(&paths::vm_status_action(&node, vmid, "reboot")).await
                })
                .await
        }
    };

    Ok(outcome.into())
}

/// 验证凭据，只输出用户名和权限，不输出票据
async fn login(client: ProxmoxClient) -> Outcome<Value> {
    let outcome = client
        .login(paths::LOGIN_PATH)
        .await
        .map(|data| json!({ "username": data["username"], "cap": data["cap"] }));
    client.logout().await;
    outcome
}

/// 读取虚拟机参数（--json 或 --file）
fn load_params(params: &VmParams) -> Result<Value> {
    let text = match (&params.json, &params.file) {
        (Some(json), _) => json.clone(),
        (None, Some(file)) => fs::read_to_string(file)
            .with_context(|| format!("读取参数文件失败: {:?}", file))?,
        (None, None) => anyhow::bail!("需要通过 --json 或 --file 提供虚拟机参数"),
    };

    let value: Value = serde_json::from_str(&text).context("虚拟机参数不是合法的 JSON")?;
    if !value.is_object() {
        anyhow::bail!("虚拟机参数必须是 JSON 对象");
    }
    Ok(value)
}

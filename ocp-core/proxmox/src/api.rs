//! 虚拟机与节点操作
//!
//! 所有操作都经过 [`ProxmoxClient`] 的统一请求执行器，调用方只需要处理 [`Outcome`]。

use async_trait::async_trait;
use ocp_common::Outcome;
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::ProxmoxClient;

/// 虚拟化平台能力集合
///
/// `path` 为相对 API 基础 URL 的路径，可使用 [`crate::paths`] 构造。
/// 除 `login` 外的所有操作都必须在 `login` 之后调用，否则返回认证错误（401）。
#[async_trait]
pub trait HypervisorApi: Send + Sync {
    /// 登录并保存票据
    async fn login(&self, path: &str) -> Outcome<Value>;

    /// 查询节点上的虚拟机列表（GET）
    async fn list_vms(&self, path: &str) -> Outcome<Value>;

    /// 创建虚拟机（POST）
    async fn create_vm(&self, path: &str, config: &Value) -> Outcome<Value>;

    /// 删除虚拟机（DELETE）
    async fn destroy_vm(&self, path: &str) -> Outcome<Value>;

    /// 修改虚拟机配置（PUT）
    async fn update_vm(&self, path: &str, config: &Value) -> Outcome<Value>;

    /// 查询虚拟机当前状态（GET）
    async fn get_vm_status(&self, path: &str) -> Outcome<Value>;

    /// 启动虚拟机（POST）
    async fn start_vm(&self, path: &str) -> Outcome<Value>;

    /// 停止虚拟机（POST）
    async fn stop_vm(&self, path: &str) -> Outcome<Value>;

    /// 查询节点统计信息（GET）
    async fn get_node_statistics(&self, path: &str) -> Outcome<Value>;

    /// 查询集群节点列表（GET）
    async fn list_nodes(&self, path: &str) -> Outcome<Value>;

    /// 查询虚拟机配置（GET）
    async fn get_vm_config(&self, path: &str) -> Outcome<Value>;

    /// 重启虚拟机（POST）
    async fn reboot_vm(&self, path: &str) -> Outcome<Value>;
}

#[async_trait]
impl HypervisorApi for ProxmoxClient {
    async fn login(&self, path: &str) -> Outcome<Value> {
        ProxmoxClient::login(self, path).await
    }

    async fn list_vms(&self, path: &str) -> Outcome<Value> {
        info!("查询虚拟机列表: {}", path);
        self.execute(Method::GET, path, None::<&Value>).await
    }

    async fn create_vm(&self, path: &str, config: &Value) -> Outcome<Value> {
        info!("创建虚拟机: {}", path);
        self.execute(Method::POST, path, Some(config)).await
    }

    async fn destroy_vm(&self, path: &str) -> Outcome<Value> {
        info!("删除虚拟机: {}", path);
        self.execute(Method::DELETE, path, None::<&Value>).await
    }

    async fn update_vm(&self, path: &str, config: &Value) -> Outcome<Value> {
        info!("修改虚拟机配置: {}", path);
        self.execute(Method::PUT, path, Some(config)).await
    }

    async fn get_vm_status(&self, path: &str) -> Outcome<Value> {
        info!("查询虚拟机状态: {}", path);
        self.execute(Method::GET, path, None::<&Value>).await
    }

    async fn start_vm(&self, path: &str) -> Outcome<Value> {
        info!("启动虚拟机: {}", path);
        self.execute(Method::POST, path, None::<&Value>).await
    }

    async fn stop_vm(&self, path: &str) -> Outcome<Value> {
        info!("停止虚拟机: {}", path);
        self.execute(Method::POST, path, None::<&Value>).await
    }

    async fn get_node_statistics(&self, path: &str) -> Outcome<Value> {
        info!("查询节点统计信息: {}", path);
        self.execute(Method::GET, path, None::<&Value>).await
    }

    async fn list_nodes(&self, path: &str) -> Outcome<Value> {
        info!("查询节点列表: {}", path);
        self.execute(Method::GET, path, None::<&Value>).await
    }

    async fn get_vm_config(&self, path: &str) -> Outcome<Value> {
        info!("查询虚拟机配置: {}", path);
        self.execute(Method::GET, path, None::<&Value>).await
    }

    async fn reboot_vm(&self, path: &str) -> Outcome<Value> {
        info!("重启虚拟机: {}", path);
        self.execute(Method::POST, path, None::<&Value>).await
    }
}

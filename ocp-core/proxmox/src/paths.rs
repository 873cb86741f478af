//! Proxmox API 路径构造

/// 登录接口
pub const LOGIN_PATH: &str = "/access/ticket";

/// 集群节点列表
pub fn nodes() -> String {
    "/nodes".to_string()
}

/// 节点状态（CPU、内存、运行时间等统计信息）
pub fn node_status(node: &str) -> String {
    format!("/nodes/{}/status", node)
}

/// 节点上的 QEMU 虚拟机集合
pub fn node_qemu(node: &str) -> String {
    format!("/nodes/{}/qemu", node)
}

/// 单个虚拟机
pub fn vm(node: &str, vmid: u32) -> String {
    format!("/nodes/{}/qemu/{}", node, vmid)
}

/// 虚拟机配置
pub fn vm_config(node: &str, vmid: u32) -> String {
    format!("{}/config", vm(node, vmid))
}

/// 虚拟机当前状态
pub fn vm_status_current(node: &str, vmid: u32) -> String {
    format!("{}/status/current", vm(node, vmid))
}

/// 虚拟机电源操作（start / stop / reboot / shutdown）
pub fn vm_status_action(node: &str, vmid: u32, action: &str) -> String {
    format!("{}/status/{}", vm(node, vmid), action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(node_qemu("pve1"), "/nodes/pve1/qemu");
        assert_eq!(vm_config("pve1", 101), "/nodes/pve1/qemu/101/config");
        assert_eq!(vm_status_current("pve1", 101), "/nodes/pve1/qemu/101/status/current");
        assert_eq!(vm_status_action("pve1", 101, "start"), "/nodes/pve1/qemu/101/status/start");
        assert_eq!(node_status("pve1"), "/nodes/pve1/status");
    }
}

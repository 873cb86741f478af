//! OCP CLI 应用

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{Component, OcpConfig};

#[derive(Parser)]
#[command(name = "ocp")]
#[command(about = "OCloud Control Plane - Proxmox / Terraform / Ansible 远程编排", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别（RUST_LOG 优先）
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 配置文件路径（默认 ~/.config/ocp/config.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Proxmox 虚拟机管理
    Vm {
        #[command(subcommand)]
        action: VmAction,
    },

    /// Terraform 基础设施编排
    #[command(name = "tf", alias = "terraform")]
    Terraform {
        #[command(subcommand)]
        action: TerraformAction,
    },

    /// Ansible playbook 管理
    Playbook {
        #[command(subcommand)]
        action: PlaybookAction,
    },
}

impl Commands {
    fn component(&self) -> Component {
        match self {
            Self::Vm { .. } => Component::Proxmox,
            Self::Terraform { .. } => Component::Terraform,
            Self::Playbook { .. } => Component::Ansible,
        }
    }
}

/// 虚拟机参数，JSON 对象
#[derive(Args)]
struct VmParams {
    /// 内联 JSON
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// JSON 文件路径
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum VmAction {
    /// 验证登录凭据
    Login,
    /// 列出集群节点
    Nodes,
    /// 节点统计信息
    NodeStats {
        /// 节点名称
        node: String,
    },
    /// 列出节点上的虚拟机
    List {
        /// 节点名称
        node: String,
    },
    /// 创建虚拟机
    Create {
        /// 节点名称
        node: String,
        #[command(flatten)]
        params: VmParams,
    },
    /// 删除虚拟机
    Destroy {
        node: String,
        vmid: u32,
    },
    /// 修改虚拟机配置
    Update {
        node: String,
        vmid: u32,
        #[command(flatten)]
        params: VmParams,
    },
    /// 查看虚拟机配置
    Config {
        node: String,
        vmid: u32,
    },
    /// 查看虚拟机运行状态
    Status {
        node: String,
        vmid: u32,
    },
    /// 启动虚拟机
    Start {
        node: String,
        vmid: u32,
    },
    /// 停止虚拟机
    Stop {
        node: String,
        vmid: u32,
    },
    /// 重启虚拟机
    Reboot {
        node: String,
        vmid: u32,
    },
}

#[derive(Subcommand)]
enum TerraformAction {
    /// terraform init
    Init,
    /// terraform apply -auto-approve
    Apply,
    /// terraform destroy -auto-approve
    Destroy,
    /// terraform plan
    Plan,
    /// terraform version
    Version,
}

#[derive(Subcommand)]
enum PlaybookAction {
    /// 上传 playbook
    Deploy {
        /// 远程文件名
        name: String,
        /// 本地 playbook 文件
        file: PathBuf,
    },
    /// 执行 playbook
    Execute { name: String },
    /// 覆盖已存在的 playbook
    Modify {
        name: String,
        file: PathBuf,
    },
    /// 列出 playbook
    List,
    /// 删除 playbook
    Delete { name: String },
    /// 查看 playbook 内容
    Detail { name: String },
    /// 覆盖 inventory 文件
    Hosts {
        /// 本地 inventory 文件
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志，输出到 stderr，stdout 只保留结果 JSON
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("OCP CLI 启动");

    let config = OcpConfig::load(cli.config.as_deref())?;
    config.validate(cli.command.component())?;

    let result = match cli.command {
        Commands::Vm { action } => commands::vm::handle(action, &config).await?,
        Commands::Terraform { action } => commands::terraform::handle(action, &config).await?,
        Commands::Playbook { action } => commands::playbook::handle(action, &config).await?,
    };

    commands::output::render(&result)?;

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

//! Terraform 编排命令

use crate::config::OcpConfig;
use crate::TerraformAction;
use anyhow::Result;
use ocp_common::{OpError, OperationResult};
use ocp_terraform::{ProvisioningApi, RunOutput};

pub async fn handle(action: TerraformAction, config: &OcpConfig) -> Result<OperationResult> {
    let runner = config.terraform_runner()?;

    let run = match action {
        TerraformAction::Init => runner.init().await,
        TerraformAction::Apply => runner.apply().await,
        TerraformAction::Destroy => runner.destroy().await,
        TerraformAction::Plan => runner.plan().await,
        TerraformAction::Version => runner.version().await,
    };

    let outcome = run.map_err(OpError::from).and_then(RunOutput::into_outcome);
    Ok(outcome.into())
}

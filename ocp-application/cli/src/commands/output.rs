//! 操作结果输出
//!
//! 结果以 JSON 写入 stdout，状态提示与日志写入 stderr，便于脚本直接解析 stdout。

use anyhow::Result;
use colored::Colorize;
use ocp_common::OperationResult;

/// 输出操作结果
pub fn render(result: &OperationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);

    if result.success {
        eprintln!("{}", "✓ 操作成功".green());
    } else {
        let code = result
            .error_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        eprintln!("{}", format!("✗ 操作失败 (错误码 {})", code).red());
    }
    Ok(())
}

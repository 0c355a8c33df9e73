use issuance_core::fixed::{format_ratio, format_units};
use issuance_core::{AdjustmentPlan, ConvergenceModel};

use super::Sandbox;

pub fn preview(config_path: &str, elapsed: u64, format: &str) -> anyhow::Result<()> {
    let sandbox = Sandbox::load(config_path, 0)?;
    sandbox.clock.advance(elapsed);
    let plan = sandbox.controller.preview_adjustment()?;
    let model = sandbox.controller.convergence().name();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&plan_json(&plan, model))?);
        }
        _ => {
            println!("Pool {} after {elapsed}s ({model})", sandbox.pool_account);
            println!("  balance        {}", format_units(plan.snapshot.common_pool_balance));
            println!("  total supply   {}", format_units(plan.snapshot.token_total_supply));
            println!("  pool share     {}", format_ratio(plan.reading.balance_to_supply));
            println!("  current ratio  {}", format_ratio(plan.reading.current_ratio));
            println!("  target amount  {}", format_units(plan.target_amount));
            println!("  {:<13}  {}", plan.direction(), format_units(plan.amount));
            if plan.raw_amount != plan.amount {
                println!("  (clamped from {})", format_units(plan.raw_amount));
            }
        }
    }

    Ok(())
}

fn plan_json(plan: &AdjustmentPlan, model: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "elapsed_seconds": plan.elapsed_seconds,
        "direction": plan.direction(),
        "amount": plan.amount.to_string(),
        "raw_amount": plan.raw_amount.to_string(),
        "target_amount": plan.target_amount.to_string(),
        "current_ratio": format_ratio(plan.reading.current_ratio),
        "balance_before": plan.snapshot.common_pool_balance.to_string(),
        "balance_after": plan.balance_after().to_string(),
        "total_supply_after": plan.total_supply_after().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuance_core::IssuanceFile;

    #[test]
    fn json_plan_for_scaffold() {
        let sandbox = Sandbox::from_file(&IssuanceFile::scaffold(), 0).unwrap();
        sandbox.clock.advance(10 * 86_400);
        let plan = sandbox.controller.preview_adjustment().unwrap();

        let json = plan_json(&plan, "rate_capped");
        assert_eq!(json["direction"], "burn");
        assert_eq!(json["amount"], "1369863013622400000");
        assert_eq!(json["current_ratio"], "1.5");
        assert_eq!(json["balance_before"], "30000000000000000000");
    }

    #[test]
    fn preview_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.toml");
        std::fs::write(&path, IssuanceFile::scaffold().to_toml_string().unwrap()).unwrap();
        preview(path.to_str().unwrap(), 3_600, "json").unwrap();
    }

    #[test]
    fn missing_config_is_an_error() {
        assert!(preview("/nonexistent/issuance.toml", 60, "text").is_err());
    }
}

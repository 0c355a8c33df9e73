use std::path::Path;

use anyhow::Context;

use issuance_controller::{AdjustmentScheduler, Clock, SystemClock, TokenLedger};
use issuance_core::fixed::format_units;
use issuance_core::AdjustmentRecord;
use issuance_state::StateStore;

use super::{format_record, Sandbox};

const DAY: u64 = 86_400;

pub fn simulate(
    config_path: &str,
    days: u64,
    step: u64,
    db: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    if step == 0 {
        anyhow::bail!("--step must be at least one day");
    }
    let sandbox = Sandbox::load(config_path, SystemClock.now())?;
    let records = run(&sandbox, days, step, db)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            for record in &records {
                println!("{}", format_record(record));
            }
            let balance = sandbox.token.balance_of(&sandbox.pool_account)?;
            let supply = sandbox.token.total_supply()?;
            println!(
                "{} executions over {days} days: pool {} of supply {}",
                records.len(),
                format_units(balance),
                format_units(supply),
            );
        }
    }

    Ok(())
}

/// Advance the sandbox clock `step` days at a time and execute at each step.
fn run(
    sandbox: &Sandbox,
    days: u64,
    step: u64,
    db: Option<&str>,
) -> anyhow::Result<Vec<AdjustmentRecord>> {
    let mut scheduler = AdjustmentScheduler::new(sandbox.controller.clone());
    if let Some(db) = db {
        let store = StateStore::open(Path::new(db))?;
        scheduler = scheduler.with_store(store, sandbox.pool_account.clone());
    }

    let seconds = step
        .checked_mul(DAY)
        .with_context(|| format!("a {step}-day step overflows the clock"))?;
    let horizon = days
        .checked_mul(DAY)
        .and_then(|span| sandbox.clock.now().checked_add(span));
    if horizon.is_none() {
        anyhow::bail!("simulating {days} days overflows the clock");
    }

    let mut records = Vec::new();
    let mut day: u64 = 0;
    while let Some(next) = day.checked_add(step).filter(|next| *next <= days) {
        day = next;
        sandbox.clock.advance(seconds);
        if let Some(record) = scheduler.tick()? {
            records.push(record);
        }
    }
    Ok(records)
}

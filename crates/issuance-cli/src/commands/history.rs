use std::path::Path;

use issuance_state::StateStore;

use super::format_record;

pub fn history(db: &str, limit: usize, format: &str) -> anyhow::Result<()> {
    let path = Path::new(db);
    if !path.exists() {
        anyhow::bail!("no state database at {db}");
    }
    let store = StateStore::open(path)?;
    let records = store.list_adjustments(limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            if records.is_empty() {
                println!("No adjustments recorded.");
            }
            for record in &records {
                println!("{}", format_record(record));
            }
        }
    }

    Ok(())
}

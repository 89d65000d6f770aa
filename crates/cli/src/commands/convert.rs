use anyhow::{Context, Result, bail};
use easme_sim::simulation::{filter_by_origin, load_records, write_json};

use crate::args::ConvertArgs;

pub fn convert_records(args: &ConvertArgs) -> Result<()> {
    let mut records = load_records(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let total = records.len();

    if let Some(origin) = &args.origin {
        records = filter_by_origin(records, origin);
        if records.is_empty() {
            bail!("No records with origin '{origin}' in {}", args.input.display());
        }
    }

    write_json(&args.output, &records)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "✓ Converted {} of {total} records to {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

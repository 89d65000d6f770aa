use anyhow::{Context, Result};
use easme_sim::evolution::ConservationModel;
use std::fs;

use crate::args::{ConsensusArgs, alphabet_kind};
use crate::commands::run::load_reference;
use crate::printing::print_model;

pub fn show_consensus(args: &ConsensusArgs) -> Result<()> {
    let alphabet = alphabet_kind(args.alphabet, args.symbols.as_deref())
        .build()
        .context("Invalid alphabet")?;
    let reference = load_reference(&args.reference, &alphabet)?;

    let model = ConservationModel::build(&reference)
        .context("Failed to build conservation model")?;

    print_model(&model);
    println!("\n>consensus");
    println!("{}", model.consensus());

    if let Some(path) = &args.table {
        let json = serde_json::to_string_pretty(&model.summary())?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n✓ Position table written to {}", path.display());
    }
    Ok(())
}

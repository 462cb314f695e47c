//! The `typewise validate` command.

use std::path::PathBuf;

use anyhow::Result;

use typewise_core::model::Dimension;
use typewise_core::parser;

pub fn execute(item_bank_path: PathBuf, min_items: usize) -> Result<()> {
    let banks = if item_bank_path.is_dir() {
        parser::load_item_bank_directory(&item_bank_path)?
    } else {
        vec![parser::parse_item_bank(&item_bank_path)?]
    };
    anyhow::ensure!(
        !banks.is_empty(),
        "no item banks found in {}",
        item_bank_path.display()
    );

    let mut total_warnings = 0;

    for bank in &banks {
        let per_dimension = Dimension::ALL
            .iter()
            .map(|d| format!("{d} {}", bank.count_for(*d)))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "Item bank: {} ({} items: {per_dimension})",
            bank.name,
            bank.items.len()
        );

        let warnings = parser::validate_item_bank_with(bank, min_items);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

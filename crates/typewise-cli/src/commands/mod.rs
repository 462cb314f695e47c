pub mod compare;
pub mod init;
pub mod report;
pub mod simulate;
pub mod take;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use typewise_store::config::TypewiseConfig;

/// The item bank given on the command line, else the one named in the config.
fn resolve_item_bank(arg: Option<PathBuf>, config: &TypewiseConfig) -> Result<PathBuf> {
    arg.or_else(|| config.item_bank_path()).ok_or_else(|| {
        anyhow::anyhow!("no item bank given: pass --item-bank or set `item_bank` in typewise.toml")
    })
}

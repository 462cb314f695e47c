//! Item bank providers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use typewise_core::model::ItemBank;
use typewise_core::parser::parse_item_bank_str;
use typewise_core::traits::ItemBankProvider;

/// Reads a bank from a TOML file on every `load_bank` call.
#[derive(Debug, Clone)]
pub struct TomlItemBankProvider {
    path: PathBuf,
}

impl TomlItemBankProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemBankProvider for TomlItemBankProvider {
    async fn load_bank(&self) -> Result<ItemBank> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read item bank file: {}", self.path.display()))?;
        let bank = parse_item_bank_str(&content, &self.path)?;
        tracing::info!(bank = %bank.id, items = bank.items.len(), "loaded item bank");
        Ok(bank)
    }
}

/// Serves a bank that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticItemBankProvider {
    bank: ItemBank,
}

impl StaticItemBankProvider {
    pub fn new(bank: ItemBank) -> Self {
        Self { bank }
    }
}

#[async_trait]
impl ItemBankProvider for StaticItemBankProvider {
    async fn load_bank(&self) -> Result<ItemBank> {
        Ok(self.bank.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_toml_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(
            &path,
            r#"
[item_bank]
id = "mini"
name = "Mini"

[[items]]
id = "jp-1"
dimension = "JP"
option_a = "Plan ahead"
option_b = "Keep options open"
"#,
        )
        .unwrap();

        let bank = TomlItemBankProvider::new(&path).load_bank().await.unwrap();
        assert_eq!(bank.id, "mini");
        assert_eq!(bank.items.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_errors_with_path() {
        let err = TomlItemBankProvider::new("/definitely/not/here.toml")
            .load_bank()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not/here.toml"));
    }
}

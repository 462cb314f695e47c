//! TOML item bank parser.
//!
//! Loads calibrated item banks from TOML files and directories, and checks
//! them for calibration and keying problems.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Dimension, ItemBank, Pole, PsychometricItem};

/// Banks with fewer items than this on any dimension get a warning.
pub const DEFAULT_MIN_ITEMS_PER_DIMENSION: usize = 6;

/// Intermediate TOML structure for item bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    item_bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    dimension: String,
    #[serde(default = "default_discrimination")]
    discrimination: f64,
    #[serde(default)]
    difficulty: f64,
    option_a: String,
    option_b: String,
    #[serde(default)]
    option_a_pole: Option<String>,
    #[serde(default)]
    desirable_pole: Option<String>,
}

fn default_discrimination() -> f64 {
    1.0
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_item_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank`. `source_path` is used for error
/// messages only.
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|item| {
            let dimension: Dimension = item
                .dimension
                .parse()
                .map_err(|e: String| anyhow::anyhow!("item {}: {e}", item.id))?;
            let option_a_pole = match item.option_a_pole {
                Some(p) => p
                    .parse::<Pole>()
                    .map_err(|e| anyhow::anyhow!("item {}: {e}", item.id))?,
                None => dimension.first_pole(),
            };
            if option_a_pole.dimension() != dimension {
                anyhow::bail!(
                    "item {}: option_a_pole {option_a_pole} does not belong to dimension {dimension}",
                    item.id
                );
            }
            let desirable_pole = item
                .desirable_pole
                .map(|p| {
                    p.parse::<Pole>()
                        .map_err(|e| anyhow::anyhow!("item {}: {e}", item.id))
                })
                .transpose()?;

            Ok(PsychometricItem {
                id: item.id,
                dimension,
                discrimination: item.discrimination,
                difficulty: item.difficulty,
                option_a: item.option_a,
                option_b: item.option_b,
                option_a_pole,
                desirable_pole,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemBank {
        id: parsed.item_bank.id,
        name: parsed.item_bank.name,
        description: parsed.item_bank.description,
        items,
    })
}

/// Recursively load all `.toml` item bank files from a directory.
/// Files that fail to parse are skipped with a warning.
pub fn load_item_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_item_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from item bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn item(item: &PsychometricItem, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate a bank using [`DEFAULT_MIN_ITEMS_PER_DIMENSION`].
pub fn validate_item_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    validate_item_bank_with(bank, DEFAULT_MIN_ITEMS_PER_DIMENSION)
}

/// Validate a bank for common calibration and keying issues.
pub fn validate_item_bank_with(bank: &ItemBank, min_items_per_dimension: usize) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for item in &bank.items {
        if !seen_ids.insert(&item.id) {
            warnings.push(ValidationWarning::item(item, format!("duplicate item ID: {}", item.id)));
        }
    }

    for item in &bank.items {
        if item.option_a_pole.dimension() != item.dimension {
            warnings.push(ValidationWarning::item(
                item,
                format!(
                    "option_a_pole {} does not belong to dimension {}",
                    item.option_a_pole, item.dimension
                ),
            ));
        }
        if let Some(pole) = item.desirable_pole {
            if pole.dimension() != item.dimension {
                warnings.push(ValidationWarning::item(
                    item,
                    format!("desirable_pole {pole} does not belong to dimension {}", item.dimension),
                ));
            }
        }

        if !item.discrimination.is_finite() || item.discrimination <= 0.0 {
            warnings.push(ValidationWarning::item(
                item,
                format!(
                    "discrimination must be positive, got {}",
                    item.discrimination
                ),
            ));
        } else if item.discrimination > 4.0 {
            warnings.push(ValidationWarning::item(
                item,
                format!("discrimination {} is implausibly high", item.discrimination),
            ));
        }

        if !item.difficulty.is_finite() || item.difficulty.abs() > 4.0 {
            warnings.push(ValidationWarning::item(
                item,
                format!(
                    "difficulty {} lies outside the measurable range [-4, 4]",
                    item.difficulty
                ),
            ));
        }

        if item.option_a.trim().is_empty() || item.option_b.trim().is_empty() {
            warnings.push(ValidationWarning::item(item, "option text is empty"));
        }
    }

    for dimension in Dimension::ALL {
        let count = bank.count_for(dimension);
        if count < min_items_per_dimension {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!(
                    "dimension {dimension} has {count} item(s); at least {min_items_per_dimension} recommended"
                ),
            });
        }
    }

    warnings
}

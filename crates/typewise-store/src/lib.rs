//! typewise-store: Persistence and item bank adapters.
//!
//! Implements the `SessionRepository` and `ItemBankProvider` traits from
//! `typewise-core` for in-memory and file-backed storage, and loads the
//! `typewise.toml` configuration that selects between them.

pub mod bank;
pub mod config;
pub mod file;
pub mod memory;

pub use bank::{StaticItemBankProvider, TomlItemBankProvider};
pub use config::{create_store, load_config, load_config_from, StoreConfig, TypewiseConfig};
pub use file::FileSessionRepository;
pub use memory::MemorySessionRepository;

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Configuration Store: a name-indexed dictionary of typed parameters,
//! loaded from and persisted to a flat key/value, section-scoped-by-product
//! INI file.
//!
//! On load, every recognized key gets its default written into the
//! in-memory map first, then overlaid with whatever the file actually
//! contains. Keys the file is missing (schema migration) get written back
//! immediately. An unknown key read through [`Configuration::get_by_name`]
//! returns a benign sentinel rather than failing.
pub mod items;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

pub use items::{ConfigKey, ItemDef, ItemType, DEFAULT_PRODUCT, INI_FILENAME};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read/parse ini file: {0}")]
    Parse(String),
    #[error("failed to write ini file: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A typed configuration value. The enum variant always matches the
/// item's declared `ItemType`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemValue {
    Integer(i64),
    Decimal(f64),
}

impl ItemValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ItemValue::Integer(v) => v as f64,
            ItemValue::Decimal(v) => v,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ItemValue::Integer(v) => v,
            ItemValue::Decimal(v) => v as i64,
        }
    }

    fn to_ini_string(self) -> String {
        match self {
            ItemValue::Integer(v) => v.to_string(),
            ItemValue::Decimal(v) => v.to_string(),
        }
    }

    fn parse(item_type: ItemType, raw: &str) -> Option<ItemValue> {
        match item_type {
            ItemType::Integer => raw.parse::<f64>().ok().map(|v| ItemValue::Integer(v as i64)),
            ItemType::Decimal => raw.parse::<f64>().ok().map(ItemValue::Decimal),
        }
    }

    fn default_for(def: &ItemDef) -> ItemValue {
        match def.item_type {
            ItemType::Integer => ItemValue::Integer(def.default_int()),
            ItemType::Decimal => ItemValue::Decimal(def.default_decimal),
        }
    }
}

/// A single configurable item as read back through `get`/`get_by_name`:
/// value, unit, display name, type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigItemView {
    pub value: ItemValue,
    pub units: &'static str,
    pub display_name: &'static str,
    pub item_type: ItemType,
}

impl ConfigItemView {
    /// `(0.0, "inv", "(invalid)", decimal)` — returned for a key that
    /// isn't in the recognized set, rather than failing the caller.
    fn invalid() -> Self {
        Self {
            value: ItemValue::Decimal(0.0),
            units: "inv",
            display_name: "(invalid)",
            item_type: ItemType::Decimal,
        }
    }
}

struct Entry {
    value: ItemValue,
    changed: bool,
}

/// An explicit, owned configuration instance: no ambient global. Created
/// once at process start and passed by reference into the sequencer and
/// the UI adapter.
pub struct Configuration {
    path: PathBuf,
    product: String,
    items: HashMap<ConfigKey, Entry>,
}

impl Configuration {
    /// Load the INI file from disk, creating it with defaults if absent,
    /// and writing back any keys the defaults table introduces that the
    /// file on disk lacks.
    pub fn load(path: impl AsRef<Path>, product: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let product = product.into();
        tracing::info!(product = %product, path = %path.display(), "loading configuration");

        let mut items = HashMap::new();
        for key in ConfigKey::ALL {
            items.insert(
                *key,
                Entry {
                    value: ItemValue::default_for(key.def()),
                    changed: false,
                },
            );
        }

        let mut cfg = Self {
            path,
            product,
            items,
        };

        if !cfg.path.exists() {
            tracing::info!(path = %cfg.path.display(), "creating new config file");
            cfg.save()?;
            return Ok(cfg);
        }

        let ini = Ini::load_from_file(&cfg.path).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let section = ini.section(Some(cfg.product.as_str()));

        let mut needs_saving = false;
        for key in ConfigKey::ALL {
            let def = key.def();
            let raw = section.and_then(|s| s.get(def.ini_name));
            match raw.and_then(|r| ItemValue::parse(def.item_type, r)) {
                Some(value) => {
                    if let Some(entry) = cfg.items.get_mut(key) {
                        entry.value = value;
                    }
                }
                None => {
                    tracing::debug!(key = %key, "new ini item detected");
                    needs_saving = true;
                }
            }
        }

        if needs_saving {
            tracing::info!("ini file has new entries and needs saving");
            cfg.save()?;
        }

        Ok(cfg)
    }

    /// Write the entire dictionary atomically (in practice: one
    /// `write_to_file` call; the `ini` crate does not expose a
    /// rename-on-write primitive, matching the source's own save path).
    pub fn save(&self) -> Result<()> {
        let mut ini = Ini::new();
        {
            let mut section = ini.with_section(Some(self.product.as_str()));
            for key in ConfigKey::ALL {
                let entry = &self.items[key];
                section.set(key.ini_name(), entry.value.to_ini_string());
            }
        }
        tracing::info!(path = %self.path.display(), "saving config file");
        ini.write_to_file(&self.path)
            .map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// `(value, unit, display_name, type)` for a recognized key.
    pub fn get(&self, key: ConfigKey) -> ConfigItemView {
        let def = key.def();
        ConfigItemView {
            value: self.items[&key].value,
            units: def.units,
            display_name: def.display_name,
            item_type: def.item_type,
        }
    }

    /// Same as `get`, but looked up by the INI key name; an unrecognized
    /// name returns the benign `(0.0, "inv", "(invalid)", decimal)`
    /// sentinel instead of failing.
    pub fn get_by_name(&self, name: &str) -> ConfigItemView {
        match ConfigKey::from_ini_name(name) {
            Some(key) => self.get(key),
            None => ConfigItemView::invalid(),
        }
    }

    pub fn value_f64(&self, key: ConfigKey) -> f64 {
        self.items[&key].value.as_f64()
    }

    pub fn value_i64(&self, key: ConfigKey) -> i64 {
        self.items[&key].value.as_i64()
    }

    /// Update the value; `save` controls whether the whole dictionary is
    /// immediately persisted.
    pub fn set(&mut self, key: ConfigKey, value: ItemValue, save: bool) -> Result<()> {
        let old = self.items[&key].value;
        if let Some(entry) = self.items.get_mut(&key) {
            entry.value = value;
            entry.changed = true;
        }
        tracing::info!(
            key = %key,
            ini_name = key.ini_name(),
            old = old.as_f64(),
            new = value.as_f64(),
            "changed configurable"
        );
        if save {
            self.save()?;
        }
        Ok(())
    }

    pub fn changed(&self) -> bool {
        self.items.values().any(|e| e.changed)
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_creates_file_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filler.ini");
        let cfg = Configuration::load(&path, DEFAULT_PRODUCT).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.value_f64(ConfigKey::FillWeight), 28.12);
        assert_eq!(cfg.value_i64(ConfigKey::MaxPurge), 5);
    }

    #[test]
    fn round_trips_every_key_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filler.ini");
        {
            let mut cfg = Configuration::load(&path, DEFAULT_PRODUCT).unwrap();
            cfg.set(ConfigKey::FillWeight, ItemValue::Decimal(30.5), true)
                .unwrap();
            cfg.set(ConfigKey::MaxPurge, ItemValue::Integer(7), true)
                .unwrap();
        }
        let reloaded = Configuration::load(&path, DEFAULT_PRODUCT).unwrap();
        assert_eq!(reloaded.value_f64(ConfigKey::FillWeight), 30.5);
        assert_eq!(reloaded.value_i64(ConfigKey::MaxPurge), 7);
    }

    #[test]
    fn unknown_key_returns_benign_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filler.ini");
        let cfg = Configuration::load(&path, DEFAULT_PRODUCT).unwrap();
        let view = cfg.get_by_name("not_a_real_key");
        assert_eq!(view.units, "inv");
        assert_eq!(view.display_name, "(invalid)");
        assert_eq!(view.value, ItemValue::Decimal(0.0));
    }

    #[test]
    fn schema_migration_adds_missing_keys_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filler.ini");
        std::fs::write(&path, "[PRODUCT1]\nfill_weight = 30.0\n").unwrap();

        let cfg = Configuration::load(&path, DEFAULT_PRODUCT).unwrap();
        assert_eq!(cfg.value_f64(ConfigKey::FillWeight), 30.0);
        assert_eq!(cfg.value_f64(ConfigKey::TareTolerance), 0.3);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("tare_tolerance"));
    }
}

use std::fmt;

/// The closed set of recognized configuration keys. Adding a new key means
/// adding a variant here and an entry in [`ITEM_DEFS`]; existing INI files
/// pick up the new default on next load (schema migration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    FillWeight,
    FillWeightMin,
    FillPressureMinimum,
    FillInitDispenseTime,
    FillInitDispenseMin,
    DispenseOffset,
    PressureDisplayMax,
    PurgeTime,
    MaxPurge,
    TareTolerance,
    MinBottleWeight,
    CleanDispenseTime,
}

impl ConfigKey {
    pub const ALL: &'static [ConfigKey] = &[
        ConfigKey::FillWeight,
        ConfigKey::FillWeightMin,
        ConfigKey::FillPressureMinimum,
        ConfigKey::FillInitDispenseTime,
        ConfigKey::FillInitDispenseMin,
        ConfigKey::DispenseOffset,
        ConfigKey::PressureDisplayMax,
        ConfigKey::PurgeTime,
        ConfigKey::MaxPurge,
        ConfigKey::TareTolerance,
        ConfigKey::MinBottleWeight,
        ConfigKey::CleanDispenseTime,
    ];

    pub fn def(self) -> &'static ItemDef {
        ITEM_DEFS
            .iter()
            .find(|d| d.key == self)
            .expect("every ConfigKey has an ITEM_DEFS entry")
    }

    pub fn ini_name(self) -> &'static str {
        self.def().ini_name
    }

    pub fn from_ini_name(name: &str) -> Option<ConfigKey> {
        ITEM_DEFS.iter().find(|d| d.ini_name == name).map(|d| d.key)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ini_name())
    }
}

/// A configuration value's declared type. Parsing on load respects this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub key: ConfigKey,
    pub display_name: &'static str,
    pub units: &'static str,
    pub ini_name: &'static str,
    pub item_type: ItemType,
    pub default_decimal: f64,
}

impl ItemDef {
    pub fn default_int(&self) -> i64 {
        // Integer defaults are authored as whole-number f64 literals below;
        // this keeps one table instead of two.
        self.default_decimal as i64
    }
}

pub const DEFAULT_PRODUCT: &str = "PRODUCT1";
pub const INI_FILENAME: &str = "filler.ini";

pub static ITEM_DEFS: &[ItemDef] = &[
    ItemDef {
        key: ConfigKey::FillWeight,
        display_name: "Fill weight",
        units: "g",
        ini_name: "fill_weight",
        item_type: ItemType::Decimal,
        default_decimal: 28.12,
    },
    ItemDef {
        key: ConfigKey::FillWeightMin,
        display_name: "Fill weight min",
        units: "g",
        ini_name: "fill_weight_min",
        item_type: ItemType::Decimal,
        default_decimal: 27.3,
    },
    ItemDef {
        key: ConfigKey::FillPressureMinimum,
        display_name: "Fill pressure (minimum)",
        units: "psi",
        ini_name: "fill_pressure_minimum",
        item_type: ItemType::Decimal,
        default_decimal: 18.5,
    },
    ItemDef {
        key: ConfigKey::FillInitDispenseTime,
        display_name: "Fill initial dispense time",
        units: "ms",
        ini_name: "fill_init_dispense_time",
        item_type: ItemType::Integer,
        default_decimal: 1500.0,
    },
    ItemDef {
        key: ConfigKey::FillInitDispenseMin,
        display_name: "Fill initial dispense minimum",
        units: "g",
        ini_name: "fill_init_dispense_min",
        item_type: ItemType::Decimal,
        default_decimal: 4.0,
    },
    ItemDef {
        key: ConfigKey::DispenseOffset,
        display_name: "Dispense offset (intercept)",
        units: "g",
        ini_name: "dispense_offset",
        item_type: ItemType::Decimal,
        default_decimal: 1.5,
    },
    ItemDef {
        key: ConfigKey::PressureDisplayMax,
        display_name: "Display pressure (maximum)",
        units: "psi",
        ini_name: "pressure_display_max",
        item_type: ItemType::Decimal,
        default_decimal: 20.0,
    },
    ItemDef {
        key: ConfigKey::PurgeTime,
        display_name: "Purge time",
        units: "ms",
        ini_name: "purge_time",
        item_type: ItemType::Integer,
        default_decimal: 500.0,
    },
    ItemDef {
        key: ConfigKey::MaxPurge,
        display_name: "Maximum purges per bottle",
        units: "ct",
        ini_name: "max_purge",
        item_type: ItemType::Integer,
        default_decimal: 5.0,
    },
    ItemDef {
        key: ConfigKey::TareTolerance,
        display_name: "Tare tolerance",
        units: "g",
        ini_name: "tare_tolerance",
        item_type: ItemType::Decimal,
        default_decimal: 0.3,
    },
    ItemDef {
        key: ConfigKey::MinBottleWeight,
        display_name: "Minimum bottle weight",
        units: "g",
        ini_name: "min_bottle_weight",
        item_type: ItemType::Decimal,
        default_decimal: 40.0,
    },
    ItemDef {
        key: ConfigKey::CleanDispenseTime,
        display_name: "Cleaning dispense time",
        units: "ms",
        ini_name: "clean_dispense_time",
        item_type: ItemType::Integer,
        default_decimal: 30000.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_exactly_one_def() {
        for key in ConfigKey::ALL {
            let matches = ITEM_DEFS.iter().filter(|d| d.key == *key).count();
            assert_eq!(matches, 1, "{key:?} should have exactly one ITEM_DEFS entry");
        }
    }

    #[test]
    fn ini_name_round_trips_through_lookup() {
        for def in ITEM_DEFS {
            assert_eq!(ConfigKey::from_ini_name(def.ini_name), Some(def.key));
        }
        assert_eq!(ConfigKey::from_ini_name("not_a_real_key"), None);
    }
}

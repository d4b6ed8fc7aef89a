// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Handles loading board revision configuration files and creating layout
//! and encoding objects for use by ssp-conv.
//!
//! The supported revisions are built in.  Further revisions can be added by
//! placing JSON files in `layouts/` and `encodings/` subdirectories of a
//! configuration directory - see `config/` in this crate for the format.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Deserializer};

use crate::bitswap::BitOrdering;
use crate::encoding::EncodingScheme;
use crate::error::{Result, SspError};
use crate::layout::{Bus, BusRole, Chip, Layout};

/// Directories searched, in order, for user configuration if one isn't
/// given explicitly.
pub const CONFIG_DIRS: [&str; 2] = ["ssp-config", "../ssp-config"];

/// Subdirectory holding layout files.
pub const LAYOUT_SUB_DIR: &str = "layouts";

/// Subdirectory holding encoding files.
pub const ENCODING_SUB_DIR: &str = "encodings";

const BUILTIN_LAYOUTS: [(&str, &str); 4] = [
    ("tnx1", include_str!("../config/layouts/tnx1.json")),
    ("tpp1", include_str!("../config/layouts/tpp1.json")),
    ("tpp1bl", include_str!("../config/layouts/tpp1bl.json")),
    ("tpp2", include_str!("../config/layouts/tpp2.json")),
];

const BUILTIN_ENCODINGS: [(&str, &str); 3] = [
    ("no", include_str!("../config/encodings/no.json")),
    ("tnx1", include_str!("../config/encodings/tnx1.json")),
    ("tpp2", include_str!("../config/encodings/tpp2.json")),
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutConfig {
    description: String,
    buses: Vec<BusConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BusConfig {
    #[serde(deserialize_with = "deserialize_role")]
    role: BusRole,
    #[serde(deserialize_with = "deserialize_number")]
    chip_size: u64,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    blank_offset: Option<u64>,
    chips: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EncodingConfig {
    description: String,
    #[serde(default = "default_address_width")]
    address_width: u8,
    address_bits: Vec<u8>,
    #[serde(default, deserialize_with = "deserialize_number")]
    address_xor: u64,
    data_bits: Vec<u8>,
}

fn default_address_width() -> u8 {
    16
}

fn deserialize_role<'de, D>(deserializer: D) -> std::result::Result<BusRole, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse()
        .map_err(|_| serde::de::Error::custom(format!("Invalid bus role: {}", s)))
}

// Sizes and masks read far better in hex, which JSON doesn't support, so
// accept either a number or a "0x" string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Str(String),
}

impl Number {
    fn value<E: serde::de::Error>(self) -> std::result::Result<u64, E> {
        match self {
            Number::Int(value) => Ok(value),
            Number::Str(s) => parse_number(&s)
                .ok_or_else(|| E::custom(format!("Invalid number: {}", s))),
        }
    }
}

fn parse_number(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn deserialize_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Number::deserialize(deserializer)?.value()
}

fn deserialize_optional_number<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(Number::value::<D::Error>)
        .transpose()
}

fn to_usize(value: u64, what: &str, name: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SspError::config(name, format!("{} 0x{:x} too large", what, value)))
}

fn parse_layout(name: &str, json: &str) -> Result<Layout> {
    let config: LayoutConfig = serde_json::from_str(json)
        .map_err(|e| SspError::config(name, format!("failed to parse layout JSON: {}", e)))?;

    let mut buses = Vec::with_capacity(config.buses.len());
    for bus in config.buses {
        buses.push(Bus {
            role: bus.role,
            chip_size: to_usize(bus.chip_size, "chip size", name)?,
            chips: bus.chips.iter().map(|chip| Chip::from_name(chip)).collect(),
            blank_offset: bus
                .blank_offset
                .map(|offset| to_usize(offset, "blank offset", name))
                .transpose()?,
        });
    }

    Layout::new(name, &config.description, buses)
}

fn parse_encoding(name: &str, json: &str) -> Result<EncodingScheme> {
    let config: EncodingConfig = serde_json::from_str(json)
        .map_err(|e| SspError::config(name, format!("failed to parse encoding JSON: {}", e)))?;

    let address_xor = u32::try_from(config.address_xor).map_err(|_| {
        SspError::config(name, format!("address XOR 0x{:x} too large", config.address_xor))
    })?;

    EncodingScheme::new(
        name,
        &config.description,
        BitOrdering::new(config.address_width, config.address_bits)
            .map_err(|e| SspError::config(name, format!("address bits: {}", e)))?,
        address_xor,
        BitOrdering::new(8, config.data_bits)
            .map_err(|e| SspError::config(name, format!("data bits: {}", e)))?,
    )
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace("_", "-")
}

/// Finds the user configuration directory, if there is one.  An explicitly
/// requested directory must exist.
fn get_config_dir(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(dir) = explicit {
        if !dir.is_dir() {
            return Err(SspError::config(
                dir.display().to_string(),
                "configuration directory not found",
            ));
        }
        return Ok(Some(dir.to_path_buf()));
    }

    Ok(CONFIG_DIRS
        .iter()
        .map(|dir| Path::new(dir))
        .find(|path| path.is_dir())
        .map(Path::to_path_buf))
}

/// Lists the JSON files in `dir`, as (normalized name, path) pairs.
fn list_json_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let read_err =
        |e: std::io::Error| SspError::config(dir.display().to_string(), format!("failed to read: {}", e));

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let filename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SspError::config(path.display().to_string(), "invalid filename"))?;

        let normalized = normalize_name(filename);
        if normalized != filename {
            return Err(SspError::config(
                path.display().to_string(),
                "revision names must be lower-case with dashes, not underscores",
            ));
        }

        files.push((normalized, path));
    }

    files.sort();
    Ok(files)
}

fn read_json(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        SspError::config(path.display().to_string(), format!("failed to read: {}", e))
    })
}

/// All known layouts and encodings, resolved to typed values.
#[derive(Debug, Clone)]
pub struct Registry {
    layouts: BTreeMap<String, Layout>,
    encodings: BTreeMap<String, EncodingScheme>,
}

impl Registry {
    /// The built-in revisions only.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self {
            layouts: BTreeMap::new(),
            encodings: BTreeMap::new(),
        };

        for (name, json) in BUILTIN_LAYOUTS {
            registry.add_layout(parse_layout(name, json)?)?;
        }
        for (name, json) in BUILTIN_ENCODINGS {
            registry.add_encoding(parse_encoding(name, json)?)?;
        }

        Ok(registry)
    }

    /// The built-in revisions plus any found in the user configuration
    /// directory.  A user revision may not reuse a built-in name.
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        let mut registry = Self::builtin()?;

        let Some(dir) = get_config_dir(config_dir)? else {
            return Ok(registry);
        };
        debug!("Reading configuration from {}", dir.display());

        let layout_dir = dir.join(LAYOUT_SUB_DIR);
        if layout_dir.is_dir() {
            for (name, path) in list_json_files(&layout_dir)? {
                registry.add_layout(parse_layout(&name, &read_json(&path)?)?)?;
            }
        }

        let encoding_dir = dir.join(ENCODING_SUB_DIR);
        if encoding_dir.is_dir() {
            for (name, path) in list_json_files(&encoding_dir)? {
                registry.add_encoding(parse_encoding(&name, &read_json(&path)?)?)?;
            }
        }

        Ok(registry)
    }

    fn add_layout(&mut self, layout: Layout) -> Result<()> {
        if self.layouts.contains_key(layout.name()) {
            return Err(SspError::config(layout.name(), "duplicate layout"));
        }
        self.layouts.insert(layout.name().to_string(), layout);
        Ok(())
    }

    fn add_encoding(&mut self, encoding: EncodingScheme) -> Result<()> {
        if self.encodings.contains_key(encoding.name()) {
            return Err(SspError::config(encoding.name(), "duplicate encoding"));
        }
        self.encodings.insert(encoding.name().to_string(), encoding);
        Ok(())
    }

    pub fn layout(&self, name: &str) -> Result<&Layout> {
        self.layouts
            .get(&normalize_name(name))
            .ok_or_else(|| SspError::config(name, "unknown layout"))
    }

    pub fn encoding(&self, name: &str) -> Result<&EncodingScheme> {
        self.encodings
            .get(&normalize_name(name))
            .ok_or_else(|| SspError::config(name, "unknown encoding"))
    }

    /// (name, description) of each layout, sorted by name.
    pub fn layouts(&self) -> Vec<(&str, &str)> {
        self.layouts
            .values()
            .map(|layout| (layout.name(), layout.description()))
            .collect()
    }

    /// (name, description) of each encoding, sorted by name.
    pub fn encodings(&self) -> Vec<(&str, &str)> {
        self.encodings
            .values()
            .map(|encoding| (encoding.name(), encoding.description()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("TPP2"), "tpp2");
        assert_eq!(normalize_name("tpp1_bl"), "tpp1-bl");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x7000"), Some(0x7000));
        assert_eq!(parse_number("0XFC"), Some(0xfc));
        assert_eq!(parse_number("256"), Some(256));
        assert_eq!(parse_number("0xzz"), None);
    }

    #[test]
    fn test_builtin() {
        let registry = Registry::builtin().unwrap();

        let names: Vec<_> = registry.layouts().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["tnx1", "tpp1", "tpp1bl", "tpp2"]);
        let names: Vec<_> = registry.encodings().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["no", "tnx1", "tpp2"]);

        let tnx1 = registry.layout("tnx1").unwrap();
        let program = tnx1.bus(BusRole::ProgramRom).unwrap();
        assert_eq!(program.chip_size, 0x1000);
        assert_eq!(program.total_size(), 0x8000);
        assert_eq!(program.blank_offset, Some(0x7000));

        let tpp2 = registry.layout("TPP2").unwrap();
        assert_eq!(tpp2.bus(BusRole::ProgramRom).unwrap().total_size(), 0x8000);
        assert_eq!(tpp2.bus(BusRole::ObjectColorProm).unwrap().total_size(), 0x200);

        for (name, _) in registry.encodings() {
            assert!(registry.encoding(name).unwrap().can_decode(), "{}", name);
        }
    }

    #[test]
    fn test_builtin_encodings_round_trip() {
        let registry = Registry::builtin().unwrap();
        let image: Vec<u8> = (0..0x8000usize)
            .map(|ii| (ii ^ (ii >> 8) ^ (ii >> 3)) as u8)
            .collect();

        for (name, _) in registry.encodings() {
            let encoding = registry.encoding(name).unwrap();
            let encoded = encoding.encode_all(&image).unwrap();
            assert_eq!(encoding.decode_all(&encoded).unwrap(), image, "{}", name);
            let decoded = encoding.decode_all(&image).unwrap();
            assert_eq!(encoding.encode_all(&decoded).unwrap(), image, "{}", name);
        }
    }

    #[test]
    fn test_builtin_tnx1_decode_orderings() {
        let registry = Registry::builtin().unwrap();
        let (address, data) = registry
            .encoding("tnx1")
            .unwrap()
            .decode_orderings()
            .unwrap();
        assert_eq!(
            address.bits(),
            &[15, 14, 13, 12, 11, 10, 8, 7, 0, 1, 2, 4, 5, 9, 3, 6]
        );
        assert_eq!(data.bits(), &[3, 4, 2, 5, 1, 6, 0, 7]);
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::builtin().unwrap();
        assert!(matches!(registry.layout("tpp3"), Err(SspError::Config { .. })));
        assert!(matches!(registry.encoding("tpp1"), Err(SspError::Config { .. })));
    }

    #[test]
    fn test_parse_layout_errors() {
        assert!(parse_layout("bad", "{").is_err());
        assert!(
            parse_layout(
                "bad-role",
                r#"{ "description": "", "buses": [ { "role": "palette", "chip_size": 1, "chips": ["a"] } ] }"#
            )
            .is_err()
        );
        assert!(
            parse_layout(
                "bad-size",
                r#"{ "description": "", "buses": [ { "role": "tile-rom", "chip_size": "0xq", "chips": ["a"] } ] }"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_parse_encoding_errors() {
        let err = parse_encoding(
            "bad-bit",
            r#"{ "description": "", "address_bits": [16, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0], "data_bits": [7, 6, 5, 4, 3, 2, 1, 0] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("address bits"));

        let encoding = parse_encoding(
            "narrow",
            r#"{ "description": "8 bit", "address_width": 8, "address_bits": [7, 6, 5, 4, 3, 2, 1, 0], "address_xor": 3, "data_bits": [7, 6, 5, 4, 3, 2, 1, 0] }"#,
        )
        .unwrap();
        assert_eq!(encoding.address_width(), 8);
    }

    #[test]
    fn test_missing_explicit_dir() {
        assert!(Registry::load(Some(Path::new("/nonexistent/ssp-config"))).is_err());
    }
}

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use clap::Parser;
use std::path::PathBuf;

use ssp_common::colour::PromAddresses;
use ssp_common::convert::Conversion;
use ssp_common::hardware::Registry;

use crate::config::Config;

#[derive(Parser, Debug)]
#[clap(
    name = "ssp-conv",
    about = "Converts arcade ROM dumps from one board revision to another",
    version
)]
pub struct Args {
    /// Target ROM layout (see --list)
    #[clap(long, default_value = "tpp2")]
    pub rom_layout: String,

    /// Target program ROM encoding (see --list)
    #[clap(long, default_value = "tpp2")]
    pub prg_encoding: String,

    /// Leave program ROMs unencoded, same as --prg-encoding no
    #[clap(long, conflicts_with = "prg_encoding")]
    pub no_prg_encoding: bool,

    /// Object colour PROM addresses decoded by the target board (256 or 64)
    #[clap(long, default_value = "256", value_parser = parse_prom_addresses)]
    pub obj_prom_addresses: PromAddresses,

    /// Prefix added to every output file name, may be empty
    #[clap(long, default_value = "ss-")]
    pub save_prefix: String,

    /// ROM layout of the source dumps
    #[clap(long, default_value = "tnx1")]
    pub source_layout: String,

    /// Program ROM encoding of the source dumps
    #[clap(long, default_value = "tnx1")]
    pub source_encoding: String,

    /// Directory containing the source dumps
    #[clap(long, default_value = ".")]
    pub input: PathBuf,

    /// Directory to write converted files to
    #[clap(long, default_value = ".")]
    pub output: PathBuf,

    /// Additional layout and encoding configuration directory
    #[clap(long)]
    pub config_dir: Option<PathBuf>,

    /// Overwrite existing output files
    #[clap(long)]
    pub overwrite: bool,

    /// List available layouts and encodings, then exit
    #[clap(long)]
    pub list: bool,
}

pub fn parse_prom_addresses(s: &str) -> Result<PromAddresses, String> {
    s.parse()
        .map_err(|_| format!("Invalid object PROM addresses: {}. Valid values are: 256, 64", s))
}

impl Args {
    pub fn list(&self) -> bool {
        self.list
    }

    fn target_encoding(&self) -> &str {
        if self.no_prg_encoding {
            "no"
        } else {
            &self.prg_encoding
        }
    }

    /// Resolves every option name to a layout or encoding.
    pub fn gen_config(&self, registry: &Registry) -> Result<Config, String> {
        let layout = |option: &str, name: &str| {
            registry.layout(name).cloned().map_err(|_| {
                format!(
                    "Invalid {} \"{}\" - use --list for options",
                    option, name
                )
            })
        };
        let encoding = |option: &str, name: &str| {
            registry.encoding(name).cloned().map_err(|_| {
                format!(
                    "Invalid {} \"{}\" - use --list for options",
                    option, name
                )
            })
        };

        Ok(Config {
            conversion: Conversion {
                source_layout: layout("source-layout", &self.source_layout)?,
                source_encoding: encoding("source-encoding", &self.source_encoding)?,
                target_layout: layout("rom-layout", &self.rom_layout)?,
                target_encoding: encoding("prg-encoding", self.target_encoding())?,
                obj_prom_addresses: self.obj_prom_addresses,
                save_prefix: self.save_prefix.clone(),
            },
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            overwrite: self.overwrite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ssp-conv"]);
        assert_eq!(args.rom_layout, "tpp2");
        assert_eq!(args.prg_encoding, "tpp2");
        assert_eq!(args.obj_prom_addresses, PromAddresses::A256);
        assert_eq!(args.save_prefix, "ss-");
        assert!(!args.list());

        let config = args.gen_config(&Registry::builtin().unwrap()).unwrap();
        assert_eq!(config.conversion.source_layout.name(), "tnx1");
        assert_eq!(config.conversion.target_encoding.name(), "tpp2");
    }

    #[test]
    fn test_options() {
        let args = Args::parse_from([
            "ssp-conv",
            "--rom-layout",
            "tpp1",
            "--prg-encoding",
            "no",
            "--obj-prom-addresses",
            "64",
            "--save-prefix",
            "",
        ]);
        assert_eq!(args.obj_prom_addresses, PromAddresses::A64);
        assert_eq!(args.save_prefix, "");

        let config = args.gen_config(&Registry::builtin().unwrap()).unwrap();
        assert_eq!(config.conversion.target_layout.name(), "tpp1");
    }

    #[test]
    fn test_no_prg_encoding() {
        let args = Args::parse_from(["ssp-conv", "--no-prg-encoding"]);
        let config = args.gen_config(&Registry::builtin().unwrap()).unwrap();
        assert_eq!(config.conversion.target_encoding.name(), "no");
        assert_eq!(config.conversion.target_layout.name(), "tpp2");

        assert!(
            Args::try_parse_from(["ssp-conv", "--no-prg-encoding", "--prg-encoding", "tnx1"])
                .is_err()
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(Args::try_parse_from(["ssp-conv", "--obj-prom-addresses", "128"]).is_err());

        let args = Args::parse_from(["ssp-conv", "--rom-layout", "tpp3"]);
        let err = args.gen_config(&Registry::builtin().unwrap()).unwrap_err();
        assert!(err.contains("rom-layout"));
        assert!(err.contains("tpp3"));
    }
}

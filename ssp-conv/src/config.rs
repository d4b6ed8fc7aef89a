// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::path::PathBuf;

use ssp_common::convert::Conversion;

#[derive(Debug, Clone)]
pub struct Config {
    pub conversion: Conversion,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl Config {
    /// Paths of every file the conversion will write.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.conversion
            .output_names()
            .into_iter()
            .map(|name| self.output_dir.join(name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.conversion.validate().map_err(|e| e.to_string())?;

        if !self.input_dir.is_dir() {
            return Err(format!(
                "Input directory '{}' not found",
                self.input_dir.display()
            ));
        }

        // Validate output files
        if !self.overwrite {
            if let Some(path) = self.output_paths().iter().find(|path| path.exists()) {
                return Err(format!(
                    "Output file '{}' already exists. Use --overwrite to overwrite.",
                    path.display()
                ));
            }
        }

        Ok(())
    }
}

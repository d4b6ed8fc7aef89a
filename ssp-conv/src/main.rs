// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! ssp-conv - Main entry point for the ROM set converter.
//!
//! Reads a set of ROM and PROM dumps for one board revision and writes the
//! equivalent set for another revision.

mod args;
mod config;
mod file;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use ssp_common::hardware::Registry;

use args::Args;
use file::{DirSource, write_rom_files};

fn main() -> Result<()> {
    // Log to stderr, filtered with SSP_LOG if set
    env_logger::Builder::from_env(Env::new().filter_or("SSP_LOG", "info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let registry = Registry::load(args.config_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // If `list` is set, we don't need to process any other arguments, just
    // output the list and exit.
    if args.list() {
        list(&registry);
        return Ok(());
    }

    // Create configuration
    let config = args
        .gen_config(&registry)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Validate it
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation error: {}", e))?;

    // Convert the whole set in memory before anything is written
    let source = DirSource::new(&config.input_dir);
    let files = config
        .conversion
        .run(&source)
        .with_context(|| "Failed to convert ROM set")?;

    write_rom_files(&config.output_dir, &files)
        .with_context(|| "Failed to write converted files")?;

    println!(
        "Successfully converted {} to {} and wrote {} file(s) to `{}/`",
        config.conversion.source_layout.name(),
        config.conversion.target_layout.name(),
        files.len(),
        config.output_dir.display()
    );

    Ok(())
}

fn list(registry: &Registry) {
    println!("Available ROM layouts:");
    for (name, description) in registry.layouts() {
        println!("  {}: {}", name, description);
    }
    println!("Available program ROM encodings:");
    for (name, description) in registry.encodings() {
        println!("  {}: {}", name, description);
    }
}

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Converts a full ROM set from one board revision to another.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::colour::{self, PLANES_SIZE, PromAddresses};
use crate::encoding::EncodingScheme;
use crate::error::{Result, SspError};
use crate::image::{BusBuffers, RomFile, RomSource, load_layout, save_layout};
use crate::layout::{BusRole, Layout};

/// A fully resolved conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub source_layout: Layout,
    pub source_encoding: EncodingScheme,
    pub target_layout: Layout,
    pub target_encoding: EncodingScheme,
    pub obj_prom_addresses: PromAddresses,
    pub save_prefix: String,
}

impl Conversion {
    /// Checks the source and target revisions can be converted between,
    /// before any dump is read.
    pub fn validate(&self) -> Result<()> {
        if !self.source_encoding.can_decode() {
            return Err(SspError::config(
                self.source_encoding.name(),
                "source encoding orderings are not bijective, so cannot be decoded",
            ));
        }

        for bus in self.target_layout.buses() {
            let source = self.source_layout.bus(bus.role).ok_or_else(|| {
                SspError::config(
                    self.target_layout.name(),
                    format!(
                        "{} bus has no counterpart in {}",
                        bus.role,
                        self.source_layout.name()
                    ),
                )
            })?;

            if source.total_size() != bus.total_size() {
                warn!(
                    "{} bus is 0x{:x} bytes in {} but 0x{:x} bytes in {}",
                    bus.role,
                    source.total_size(),
                    self.source_layout.name(),
                    bus.total_size(),
                    self.target_layout.name()
                );
            }

            if bus.role == BusRole::ObjectColorProm && source.total_size() != PLANES_SIZE {
                return Err(SspError::config(
                    self.source_layout.name(),
                    format!(
                        "{} bus must be 0x{:x} bytes, found 0x{:x}",
                        bus.role,
                        PLANES_SIZE,
                        source.total_size()
                    ),
                ));
            }
        }

        // Without a prefix, converted files must not land on top of the
        // source dumps.
        if self.save_prefix.is_empty() {
            let sources: HashSet<&str> = self.source_layout.file_names().collect();
            if let Some(name) = self
                .target_layout
                .file_names()
                .find(|name| sources.contains(name))
            {
                return Err(SspError::config(
                    "save-prefix",
                    format!(
                        "required with rom-layout {}, as {} would overwrite a source file",
                        self.target_layout.name(),
                        name
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Names of the files [`Conversion::run`] will produce.  A target slot
    /// starting beyond the end of the matching source bus is never saved.
    pub fn output_names(&self) -> Vec<String> {
        self.target_layout
            .buses()
            .iter()
            .flat_map(|bus| {
                let limit = self
                    .source_layout
                    .bus(bus.role)
                    .map_or(usize::MAX, |source| source.total_size());
                bus.offsets()
                    .filter(move |(offset, _)| *offset < limit)
                    .filter_map(|(_, chip)| chip.file_name())
            })
            .map(|name| format!("{}{}", self.save_prefix, name))
            .collect()
    }

    /// Loads the source set, converts it and returns the target files.
    /// Nothing is written, so any failure leaves no partial output.
    pub fn run(&self, source: &dyn RomSource) -> Result<Vec<RomFile>> {
        self.validate()?;

        let mut buffers = load_layout(&self.source_layout, source)?;
        self.convert_buffers(&mut buffers)?;
        save_layout(&self.target_layout, &buffers, &self.save_prefix)
    }

    /// Applies the per-bus transforms to loaded source buffers.  Buses the
    /// target layout doesn't have are left untouched.
    pub fn convert_buffers(&self, buffers: &mut BusBuffers) -> Result<()> {
        let targets = |role| self.target_layout.bus(role).is_some();

        if !targets(BusRole::ProgramRom) {
            debug!("No program bus in {}, not re-encoding", self.target_layout.name());
        } else if let Some(program) = buffers.take(BusRole::ProgramRom) {
            info!(
                "Re-encoding program ROMs from {} to {}",
                self.source_encoding.name(),
                self.target_encoding.name()
            );
            buffers.insert(BusRole::ProgramRom, self.reencode_program(&program)?);
        }

        if !targets(BusRole::ObjectColorProm) {
            debug!(
                "No object colour bus in {}, not repacking",
                self.target_layout.name()
            );
        } else if let Some(planes) = buffers.take(BusRole::ObjectColorProm) {
            info!(
                "Repacking object colour PROMs for {} addresses",
                self.obj_prom_addresses
            );
            buffers.insert(
                BusRole::ObjectColorProm,
                colour::repack(&planes, self.obj_prom_addresses)?,
            );
        }

        Ok(())
    }

    /// Decodes a source program image to logical order, then encodes it for
    /// the target.
    pub fn reencode_program(&self, physical: &[u8]) -> Result<Vec<u8>> {
        let logical = self.source_encoding.decode_all(physical)?;
        self.target_encoding.encode_all(&logical)
    }
}

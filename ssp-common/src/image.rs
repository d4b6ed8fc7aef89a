// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Loads a layout's ROM dumps into one contiguous buffer per bus, and slices
//! bus buffers back out into named ROM images for another layout.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use crate::error::{Result, SspError};
use crate::layout::{BusRole, Chip, Layout};

/// Value read from the unbacked window on a program bus.
const BLANK_FILL: u8 = 0xFF;

/// Somewhere ROM dumps can be read from, by name.
pub trait RomSource {
    /// Returns at least `len` bytes of the named dump.  Implementations fail
    /// with [`SspError::Load`] if the dump can't be read.
    fn read_rom(&self, name: &str, len: usize) -> Result<Vec<u8>>;
}

impl RomSource for HashMap<String, Vec<u8>> {
    fn read_rom(&self, name: &str, _len: usize) -> Result<Vec<u8>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SspError::load(name, "not found"))
    }
}

/// A converted ROM image, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// One buffer per bus role, each sized to the whole bus.
#[derive(Debug, Clone, Default)]
pub struct BusBuffers {
    buffers: BTreeMap<BusRole, Vec<u8>>,
}

impl BusBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: BusRole) -> Option<&[u8]> {
        self.buffers.get(&role).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, role: BusRole) -> Option<&mut Vec<u8>> {
        self.buffers.get_mut(&role)
    }

    pub fn insert(&mut self, role: BusRole, buffer: Vec<u8>) {
        self.buffers.insert(role, buffer);
    }

    pub fn take(&mut self, role: BusRole) -> Option<Vec<u8>> {
        self.buffers.remove(&role)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BusRole, &[u8])> {
        self.buffers
            .iter()
            .map(|(role, buffer)| (*role, buffer.as_slice()))
    }
}

/// Reads every dump in `layout` from `source`.
///
/// Chips are processed in declaration order, as an empty slot after the
/// first duplicates whatever the previous slot was loaded with.
pub fn load_layout(layout: &Layout, source: &dyn RomSource) -> Result<BusBuffers> {
    let mut buffers = BusBuffers::new();

    for bus in layout.buses() {
        let size = bus.chip_size;
        let mut buffer = vec![0u8; bus.total_size()];

        for (offset, chip) in bus.offsets() {
            let window = offset..offset + size;

            if bus.blank_offset == Some(offset) {
                debug!("{} 0x{:04x}: not populated, filling", bus.role, offset);
                buffer[window].fill(BLANK_FILL);
                continue;
            }

            match chip {
                Chip::File(name) => {
                    info!("Loading {}", name);
                    let data = source.read_rom(name, size)?;
                    if data.len() < size {
                        return Err(SspError::load(
                            name,
                            format!("expected {} bytes, got {}", size, data.len()),
                        ));
                    }
                    if data.len() > size {
                        warn!(
                            "{} is {} bytes, only using the first {}",
                            name,
                            data.len(),
                            size
                        );
                    }
                    buffer[window].copy_from_slice(&data[..size]);
                }
                Chip::Empty if offset > 0 => {
                    debug!("{} 0x{:04x}: duplicating previous chip", bus.role, offset);
                    buffer.copy_within(offset - size..offset, offset);
                }
                Chip::Empty => (),
            }
        }

        buffers.insert(bus.role, buffer);
    }

    Ok(buffers)
}

/// Slices `buffers` into the dumps declared by `layout`, each named with
/// `prefix` prepended.
///
/// Empty slots, and slots starting beyond the end of the bus buffer, are
/// skipped.  Nothing is written here, so a failure leaves no partial output.
pub fn save_layout(layout: &Layout, buffers: &BusBuffers, prefix: &str) -> Result<Vec<RomFile>> {
    let mut files = Vec::new();

    for bus in layout.buses() {
        let buffer = buffers.get(bus.role).ok_or_else(|| {
            SspError::config(layout.name(), format!("no {} bus to save from", bus.role))
        })?;

        for (offset, chip) in bus.offsets() {
            let Some(name) = chip.file_name() else {
                continue;
            };
            if offset >= buffer.len() {
                debug!("{}: beyond end of {} bus, skipping", name, bus.role);
                continue;
            }

            let end = offset + bus.chip_size;
            let data = buffer.get(offset..end).ok_or_else(|| {
                SspError::out_of_range(format!("{} {}", bus.role, name), end - 1, buffer.len())
            })?;

            let name = format!("{}{}", prefix, name);
            info!("Saving {}", name);
            files.push(RomFile {
                name,
                data: data.to_vec(),
            });
        }
    }

    Ok(files)
}

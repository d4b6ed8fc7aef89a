// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Bus and ROM layouts for a board revision.

use std::collections::HashSet;

use strum::{Display, EnumIter, EnumString};

use crate::error::{Result, SspError};

/// The function of a bus.  Buses with the same role are paired up when
/// converting between two layouts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum BusRole {
    ProgramRom,
    TileRom,
    ObjectRom,
    TileColorProm,
    BackgroundColorProm,
    ObjectColorProm,
    TimingProm,
}

/// One chip position on a bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chip {
    /// A dump file name.
    File(String),
    /// No file.  In the first position, the chip is not populated and reads
    /// as zero.  Anywhere else, it holds a copy of the previous chip.
    Empty,
}

impl Chip {
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() {
            Chip::Empty
        } else {
            Chip::File(name.to_string())
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Chip::File(name) => Some(name),
            Chip::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    pub role: BusRole,
    pub chip_size: usize,
    pub chips: Vec<Chip>,
    /// Offset of a chip-sized window on the program bus which is not backed
    /// by any ROM on this revision, and reads as 0xFF.
    pub blank_offset: Option<usize>,
}

impl Bus {
    pub fn new(role: BusRole, chip_size: usize, chips: &[&str]) -> Self {
        Self {
            role,
            chip_size,
            chips: chips.iter().map(|name| Chip::from_name(name)).collect(),
            blank_offset: None,
        }
    }

    pub fn with_blank_offset(mut self, offset: usize) -> Self {
        self.blank_offset = Some(offset);
        self
    }

    pub fn total_size(&self) -> usize {
        self.chip_size * self.chips.len()
    }

    /// Each chip along with its offset into the bus.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &Chip)> {
        self.chips
            .iter()
            .enumerate()
            .map(|(ii, chip)| (ii * self.chip_size, chip))
    }

    fn validate(&self, layout: &str) -> Result<()> {
        let name = format!("{} {}", layout, self.role);

        if self.chip_size == 0 {
            return Err(SspError::config(name, "chip size must not be zero"));
        }
        if self.chips.is_empty() {
            return Err(SspError::config(name, "bus has no chips"));
        }

        if let Some(offset) = self.blank_offset {
            if self.role != BusRole::ProgramRom {
                return Err(SspError::config(
                    name,
                    "blank offset is only supported on the program bus",
                ));
            }
            if offset % self.chip_size != 0 || offset >= self.total_size() {
                return Err(SspError::config(
                    name,
                    format!(
                        "blank offset 0x{:x} must be a chip boundary below 0x{:x}",
                        offset,
                        self.total_size()
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// The full set of buses for one board revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: String,
    description: String,
    buses: Vec<Bus>,
}

impl Layout {
    pub fn new(name: &str, description: &str, buses: Vec<Bus>) -> Result<Self> {
        let layout = Self {
            name: name.to_string(),
            description: description.to_string(),
            buses,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn bus(&self, role: BusRole) -> Option<&Bus> {
        self.buses.iter().find(|bus| bus.role == role)
    }

    /// Every dump file name, in declaration order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.buses
            .iter()
            .flat_map(|bus| bus.chips.iter().filter_map(Chip::file_name))
    }

    fn validate(&self) -> Result<()> {
        if self.buses.is_empty() {
            return Err(SspError::config(&self.name, "layout has no buses"));
        }

        let mut roles = HashSet::new();
        for bus in &self.buses {
            if !roles.insert(bus.role) {
                return Err(SspError::config(
                    &self.name,
                    format!("duplicate {} bus", bus.role),
                ));
            }
            bus.validate(&self.name)?;
        }

        let mut names = HashSet::new();
        for name in self.file_names() {
            if !names.insert(name) {
                return Err(SspError::config(
                    &self.name,
                    format!("file {} used more than once", name),
                ));
            }
        }

        Ok(())
    }
}

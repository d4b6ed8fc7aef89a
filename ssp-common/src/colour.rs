// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Object colour PROM repacking.
//!
//! The object colour lookup is held in two 4 bit wide PROMs, one for each
//! nibble of an 8 bit colour entry.  On the source board the low PROM's
//! address lines are wired so that logical index bit 5 also drives physical
//! address bit 6.  The target boards use a flat layout, so entries are
//! gathered through the source wiring and written back out linearly.

use std::str::FromStr;

use crate::error::{Result, SspError};

/// Number of 8 bit colour entries.
pub const COLOUR_ENTRIES: usize = 0x100;

/// Size of the pair of 4 bit PROMs holding the entries.
pub const PLANES_SIZE: usize = 2 * COLOUR_ENTRIES;

/// Number of object colour addresses the target board decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromAddresses {
    #[default]
    A256,
    A64,
}

impl FromStr for PromAddresses {
    type Err = SspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "256" => Ok(PromAddresses::A256),
            "64" => Ok(PromAddresses::A64),
            _ => Err(SspError::config(
                "obj-prom-addresses",
                format!("invalid value {}, must be 256 or 64", s),
            )),
        }
    }
}

impl std::fmt::Display for PromAddresses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromAddresses::A256 => write!(f, "256"),
            PromAddresses::A64 => write!(f, "64"),
        }
    }
}

/// Physical address of logical colour entry `index` in the source PROMs.
fn physical_address(index: usize) -> usize {
    (index & 0x3f) | ((index & 0x20) << 1)
}

/// Combines the two source PROM planes into 256 linear 8 bit entries.
pub fn delinearize(planes: &[u8]) -> Result<Vec<u8>> {
    if planes.len() != PLANES_SIZE {
        return Err(SspError::config(
            "object colour PROMs",
            format!("expected {} bytes, got {}", PLANES_SIZE, planes.len()),
        ));
    }

    Ok((0..COLOUR_ENTRIES)
        .map(|ii| {
            let a = physical_address(ii);
            (planes[a] & 0x0f) | ((planes[a + COLOUR_ENTRIES] & 0x0f) << 4)
        })
        .collect())
}

/// Clears the entries a 64 address board can't reach.
pub fn narrow(entries: &mut [u8], addresses: PromAddresses) {
    if addresses == PromAddresses::A64 {
        entries[0x20..0x60].fill(0);
        entries[0x80..0x100].fill(0);
    }
}

/// Splits 256 linear entries into low and high nibble planes.  Unlike
/// [`delinearize`] there is no address rewiring on this side.
pub fn resplit(entries: &[u8]) -> Vec<u8> {
    let mut planes = vec![0u8; PLANES_SIZE];
    let (low, high) = planes.split_at_mut(COLOUR_ENTRIES);

    for (ii, &entry) in entries.iter().take(COLOUR_ENTRIES).enumerate() {
        low[ii] = entry & 0x0f;
        high[ii] = entry >> 4;
    }

    planes
}

/// Converts source object colour PROMs to the target layout.
pub fn repack(planes: &[u8], addresses: PromAddresses) -> Result<Vec<u8>> {
    let mut entries = delinearize(planes)?;
    narrow(&mut entries, addresses);
    Ok(resplit(&entries))
}

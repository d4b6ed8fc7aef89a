// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Bit permutation, used to model address and data line re-wiring.

use crate::error::{Result, SspError};

/// Widest value a [`BitOrdering`] operates on.
pub const MAX_WIDTH: u8 = 32;

/// An ordered list of input bit positions, most significant result bit
/// first.
///
/// For example, the ordering `[0, 2, 4, 6, 7, 5, 3, 1]` over an 8 bit input
/// produces a byte whose bit 7 is input bit 0, bit 6 is input bit 2 and so
/// on down to bit 0, which is input bit 1.
///
/// Indices may be repeated or left out.  Such orderings duplicate or drop
/// bits and cannot be inverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitOrdering {
    input_width: u8,
    bits: Vec<u8>,
}

impl BitOrdering {
    pub fn new(input_width: u8, bits: Vec<u8>) -> Result<Self> {
        if input_width == 0 || input_width > MAX_WIDTH {
            return Err(SspError::config(
                "bit ordering",
                format!("input width {} must be 1-{}", input_width, MAX_WIDTH),
            ));
        }
        if bits.is_empty() || bits.len() > MAX_WIDTH as usize {
            return Err(SspError::config(
                "bit ordering",
                format!("{} bits given, must be 1-{}", bits.len(), MAX_WIDTH),
            ));
        }
        if let Some(&bad) = bits.iter().find(|&&bit| bit >= input_width) {
            return Err(SspError::config(
                "bit ordering",
                format!(
                    "bit {} out of range for {} bit input",
                    bad, input_width
                ),
            ));
        }

        Ok(Self { input_width, bits })
    }

    /// The ordering which leaves a `width` bit value unchanged.
    pub fn identity(width: u8) -> Result<Self> {
        Self::new(width, (0..width).rev().collect())
    }

    pub fn input_width(&self) -> u8 {
        self.input_width
    }

    pub fn output_width(&self) -> u8 {
        self.bits.len() as u8
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Rearranges the bits of `value`.  Input bits above the input width are
    /// ignored unless the ordering references them, which it can't.
    pub fn permute(&self, value: u32) -> u32 {
        let top = self.bits.len() - 1;
        let mut result = 0;

        for (k, &bit) in self.bits.iter().enumerate() {
            result |= ((value >> bit) & 1) << (top - k);
        }

        result
    }

    /// True if every input bit appears exactly once.
    pub fn is_bijective(&self) -> bool {
        if self.bits.len() != self.input_width as usize {
            return false;
        }

        let mut seen = 0u64;
        for &bit in &self.bits {
            if seen & (1 << bit) != 0 {
                return false;
            }
            seen |= 1 << bit;
        }

        true
    }

    /// Builds the ordering which undoes this one, so that
    /// `inverse.permute(self.permute(v)) == v`.
    pub fn inverse(&self) -> Result<Self> {
        if !self.is_bijective() {
            return Err(SspError::config(
                "bit ordering",
                format!("{:?} is not a bijection, so has no inverse", self.bits),
            ));
        }

        // Result bit (top - k) holds input bit bits[k].  To undo that, the
        // inverse must take its result bit bits[k] from bit (top - k).
        let top = self.bits.len() - 1;
        let mut inverse = vec![0u8; self.bits.len()];
        for (k, &bit) in self.bits.iter().enumerate() {
            inverse[top - bit as usize] = (top - k) as u8;
        }

        Self::new(self.input_width, inverse)
    }
}

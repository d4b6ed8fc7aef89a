// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Program ROM encoding schemes.
//!
//! Each board revision wires the program ROM address and data lines to the
//! CPU in its own order, and inverts some of the address lines.  An
//! [`EncodingScheme`] captures that wiring as an address XOR mask plus two
//! [`BitOrdering`]s, and translates between the logical program image (what
//! the CPU sees) and the physical ROM contents (what a dump contains).

use rayon::prelude::*;

use crate::bitswap::BitOrdering;
use crate::error::{Result, SspError};

#[derive(Debug, Clone)]
pub struct EncodingScheme {
    name: String,
    description: String,
    address: BitOrdering,
    address_xor: u32,
    data: BitOrdering,
    decode: Option<DecodeOrderings>,
}

// Data orderings are generally not their own inverse, so the decode
// direction carries its own explicit pair of orderings.
#[derive(Debug, Clone)]
struct DecodeOrderings {
    address: BitOrdering,
    data: BitOrdering,
}

impl EncodingScheme {
    pub fn new(
        name: &str,
        description: &str,
        address: BitOrdering,
        address_xor: u32,
        data: BitOrdering,
    ) -> Result<Self> {
        if address.output_width() != address.input_width() {
            return Err(SspError::config(
                name,
                format!(
                    "address ordering must produce {} bits, produces {}",
                    address.input_width(),
                    address.output_width()
                ),
            ));
        }
        if data.input_width() != 8 || data.output_width() != 8 {
            return Err(SspError::config(
                name,
                "data ordering must map 8 bits to 8 bits",
            ));
        }
        if (address_xor as u64) >> address.input_width() != 0 {
            return Err(SspError::config(
                name,
                format!(
                    "address XOR mask 0x{:x} wider than {} address bits",
                    address_xor,
                    address.input_width()
                ),
            ));
        }

        let decode = match (address.inverse(), data.inverse()) {
            (Ok(address), Ok(data)) => Some(DecodeOrderings { address, data }),
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            address,
            address_xor,
            data,
            decode,
        })
    }

    /// The scheme for a ROM wired straight through.
    pub fn identity(name: &str, address_width: u8) -> Result<Self> {
        Self::new(
            name,
            "Not encoded",
            BitOrdering::identity(address_width)?,
            0,
            BitOrdering::identity(8)?,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn address_width(&self) -> u8 {
        self.address.input_width()
    }

    pub fn can_decode(&self) -> bool {
        self.decode.is_some()
    }

    /// The computed address and data orderings used to decode, if the
    /// scheme is decodable.
    pub fn decode_orderings(&self) -> Option<(&BitOrdering, &BitOrdering)> {
        self.decode
            .as_ref()
            .map(|decode| (&decode.address, &decode.data))
    }

    fn check_address(&self, address: usize, size: usize) -> Result<()> {
        if address >= size || (address as u64) >> self.address_width() != 0 {
            return Err(SspError::out_of_range(
                format!("{} logical address", self.name),
                address,
                size,
            ));
        }
        Ok(())
    }

    /// Returns the byte the target device must hold at physical `address`,
    /// given the logical program image.
    pub fn encode(&self, logical: &[u8], address: usize) -> Result<u8> {
        self.check_address(address, logical.len())?;

        let scrambled = self.address.permute(address as u32 ^ self.address_xor) as usize;
        let raw = logical.get(scrambled).copied().ok_or_else(|| {
            SspError::out_of_range(
                format!("{} scrambled address", self.name),
                scrambled,
                logical.len(),
            )
        })?;

        Ok(self.data.permute(raw as u32) as u8)
    }

    /// Returns the logical byte at `address`, given a physical ROM image
    /// encoded with this scheme.  Undoes [`EncodingScheme::encode`].
    pub fn decode(&self, physical: &[u8], address: usize) -> Result<u8> {
        let decode = self.decode.as_ref().ok_or_else(|| {
            SspError::config(
                &self.name,
                "orderings are not bijective, so cannot be used to decode",
            )
        })?;
        self.check_address(address, physical.len())?;

        let scrambled = (decode.address.permute(address as u32) ^ self.address_xor) as usize;
        let raw = physical.get(scrambled).copied().ok_or_else(|| {
            SspError::out_of_range(
                format!("{} physical address", self.name),
                scrambled,
                physical.len(),
            )
        })?;

        Ok(decode.data.permute(raw as u32) as u8)
    }

    /// Encodes an entire logical image.  Every output byte depends only on
    /// its own address and the read-only input, so addresses are processed
    /// in parallel.
    pub fn encode_all(&self, logical: &[u8]) -> Result<Vec<u8>> {
        (0..logical.len())
            .into_par_iter()
            .map(|address| self.encode(logical, address))
            .collect()
    }

    /// Decodes an entire physical image into logical order.
    pub fn decode_all(&self, physical: &[u8]) -> Result<Vec<u8>> {
        if !self.can_decode() {
            return Err(SspError::config(
                &self.name,
                "orderings are not bijective, so cannot be used to decode",
            ));
        }

        (0..physical.len())
            .into_par_iter()
            .map(|address| self.decode(physical, address))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tnx1() -> EncodingScheme {
        EncodingScheme::new(
            "tnx1",
            "test",
            BitOrdering::new(16, vec![15, 14, 13, 12, 11, 10, 2, 9, 8, 0, 3, 4, 1, 5, 6, 7])
                .unwrap(),
            0xfc,
            BitOrdering::new(8, vec![0, 2, 4, 6, 7, 5, 3, 1]).unwrap(),
        )
        .unwrap()
    }

    fn test_image(len: usize) -> Vec<u8> {
        (0..len).map(|ii| (ii * 7 + (ii >> 8) * 13) as u8).collect()
    }

    #[test]
    fn test_identity_scheme() {
        let scheme = EncodingScheme::identity("no", 16).unwrap();
        let image = test_image(0x8000);
        assert_eq!(scheme.encode_all(&image).unwrap(), image);
        assert_eq!(scheme.decode_all(&image).unwrap(), image);
    }

    #[test]
    fn test_encode_single_byte() {
        let scheme = tnx1();
        let mut logical = vec![0u8; 0x1000];
        // Address 0 is XORed to 0xfc.  The ordering moves bits 2-7 to
        // 9, 5, 4, 2, 1, 0 giving 0x237.
        logical[0x237] = 0x01;
        // Logical bit 0 comes out on bit 7.
        assert_eq!(scheme.encode(&logical, 0).unwrap(), 0x80);
    }

    #[test]
    fn test_decode_orderings_match_tnx1_tables() {
        let decode = tnx1().decode.unwrap();
        assert_eq!(
            decode.address.bits(),
            &[15, 14, 13, 12, 11, 10, 8, 7, 0, 1, 2, 4, 5, 9, 3, 6]
        );
        assert_eq!(decode.data.bits(), &[3, 4, 2, 5, 1, 6, 0, 7]);
    }

    #[test]
    fn test_round_trip() {
        let scheme = tnx1();
        let physical = test_image(0x8000);
        let logical = scheme.decode_all(&physical).unwrap();
        assert_ne!(logical, physical);
        assert_eq!(scheme.encode_all(&logical).unwrap(), physical);
        assert_eq!(
            scheme.decode_all(&scheme.encode_all(&physical).unwrap()).unwrap(),
            physical
        );
    }

    #[test]
    fn test_out_of_range() {
        let scheme = tnx1();
        let image = test_image(0x100);
        assert!(matches!(
            scheme.encode(&image, 0x100),
            Err(SspError::OutOfRange { .. })
        ));
        // Address 0 scrambles to 0x237, beyond a 0x100 byte image.
        assert!(matches!(
            scheme.encode(&image, 0),
            Err(SspError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_non_bijective_cannot_decode() {
        let scheme = EncodingScheme::new(
            "collapse",
            "test",
            BitOrdering::new(8, vec![7, 6, 5, 4, 3, 2, 1, 1]).unwrap(),
            0,
            BitOrdering::identity(8).unwrap(),
        )
        .unwrap();
        assert!(!scheme.can_decode());
        let image = test_image(0x100);
        assert_eq!(scheme.encode(&image, 1).unwrap(), image[0]);
        assert!(matches!(scheme.decode_all(&image), Err(SspError::Config { .. })));
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(
            EncodingScheme::new(
                "narrow",
                "test",
                BitOrdering::new(16, vec![0, 1]).unwrap(),
                0,
                BitOrdering::identity(8).unwrap(),
            )
            .is_err()
        );
        assert!(
            EncodingScheme::new(
                "wide-xor",
                "test",
                BitOrdering::identity(8).unwrap(),
                0x100,
                BitOrdering::identity(8).unwrap(),
            )
            .is_err()
        );
        assert!(
            EncodingScheme::new(
                "nibble-data",
                "test",
                BitOrdering::identity(16).unwrap(),
                0,
                BitOrdering::identity(4).unwrap(),
            )
            .is_err()
        );
    }
}

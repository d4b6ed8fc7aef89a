// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! ssp-common
//!
//! Converts arcade ROM and PROM dumps taken from one board revision into the
//! files expected by another revision of the same board.  Revisions differ
//! in chip sizes, in which sockets are populated, and in how the program
//! ROM address and data lines are wired, so dumps are first loaded into one
//! buffer per bus, unscrambled into logical order, then re-scrambled and
//! sliced up for the target.
//!
//! The library works on named byte buffers only.  Reading and writing files
//! is left to the caller via [`image::RomSource`] and [`image::RomFile`].

pub mod bitswap;
pub mod colour;
pub mod convert;
pub mod encoding;
pub mod error;
pub mod hardware;
pub mod image;
pub mod layout;

pub use error::{Result, SspError};

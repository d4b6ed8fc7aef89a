// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Error type shared by every stage of a conversion.

use thiserror::Error;

/// Every failure is fatal to a run.  Nothing is retried, as there are no
/// transient conditions - either the configuration is wrong or the I/O
/// failed for good.
#[derive(Debug, Error)]
pub enum SspError {
    /// A bit ordering, layout or encoding definition is malformed, or the
    /// selected combination of them cannot work together.
    #[error("configuration error in {name}: {reason}")]
    Config { name: String, reason: String },

    /// A source ROM could not be read, or was shorter than its chip size.
    #[error("load error for {file}: {reason}")]
    Load { file: String, reason: String },

    /// A converted ROM could not be written in full.
    #[error("save error for {file}: {reason}")]
    Save { file: String, reason: String },

    /// A logical or scrambled address fell outside a bus buffer.
    #[error("{what}: address 0x{address:04x} out of range for {size} byte buffer")]
    OutOfRange {
        what: String,
        address: usize,
        size: usize,
    },
}

impl SspError {
    pub fn config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SspError::Config {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn load(file: impl Into<String>, reason: impl Into<String>) -> Self {
        SspError::Load {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn save(file: impl Into<String>, reason: impl Into<String>) -> Self {
        SspError::Save {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn out_of_range(what: impl Into<String>, address: usize, size: usize) -> Self {
        SspError::OutOfRange {
            what: what.into(),
            address,
            size,
        }
    }
}

pub type Result<T> = std::result::Result<T, SspError>;

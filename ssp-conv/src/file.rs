// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Reading source dumps from, and writing converted files to, disk.

use std::fs;
use std::path::{Path, PathBuf};

use ssp_common::SspError;
use ssp_common::image::{RomFile, RomSource};

/// Reads dumps from a directory.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl RomSource for DirSource {
    fn read_rom(&self, name: &str, len: usize) -> ssp_common::Result<Vec<u8>> {
        let path = self.dir.join(name);
        let data = fs::read(&path)
            .map_err(|e| SspError::load(path.display().to_string(), e.to_string()))?;

        if data.len() < len {
            return Err(SspError::load(
                path.display().to_string(),
                format!("expected {} bytes, got {}", len, data.len()),
            ));
        }

        Ok(data)
    }
}

/// Writes every converted file.  Called only once the whole set has been
/// converted.
pub fn write_rom_files(dir: &Path, files: &[RomFile]) -> ssp_common::Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| SspError::save(dir.display().to_string(), e.to_string()))?;

    for file in files {
        let path = dir.join(&file.name);
        fs::write(&path, &file.data)
            .map_err(|e| SspError::save(path.display().to_string(), e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rom() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), [1u8, 2, 3, 4]).unwrap();
        let source = DirSource::new(dir.path());

        assert_eq!(source.read_rom("a", 4).unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(source.read_rom("a", 5), Err(SspError::Load { .. })));

        let err = source.read_rom("missing", 4).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_write_rom_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let files = vec![
            RomFile {
                name: "ss-a".to_string(),
                data: vec![1, 2],
            },
            RomFile {
                name: "ss-b".to_string(),
                data: vec![3],
            },
        ];

        write_rom_files(&out, &files).unwrap();
        assert_eq!(fs::read(out.join("ss-a")).unwrap(), vec![1, 2]);
        assert_eq!(fs::read(out.join("ss-b")).unwrap(), vec![3]);
    }

    #[test]
    fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        fs::create_dir(dir.path().join("ss-a")).unwrap();
        let files = vec![RomFile {
            name: "ss-a".to_string(),
            data: vec![1],
        }];

        assert!(matches!(
            write_rom_files(dir.path(), &files),
            Err(SspError::Save { .. })
        ));
    }
}

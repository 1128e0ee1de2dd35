//! File-backed part source.

use std::fs::File;
use std::io::{self, BufReader};

use super::{PartConfig, PartSource};
use crate::{Error, Result};

/// Opens parts written by [`FilePartSink`](super::FilePartSink).
#[derive(Debug, Clone)]
pub struct FilePartSource {
    config: PartConfig,
}

impl FilePartSource {
    /// Creates a source reading parts named after `config`.
    pub fn new(config: PartConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PartConfig {
        &self.config
    }
}

impl PartSource for FilePartSource {
    type Reader = BufReader<File>;

    fn open_part(&mut self, index: u32) -> Result<Self::Reader> {
        let path = self.config.part_path(index);
        match File::open(&path) {
            Ok(file) => {
                log::debug!("reading part {} from {}", index, path.display());
                Ok(BufReader::new(file))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::PartMissing {
                index,
                path: path.display().to_string(),
            }),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

//! File-backed part sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use super::{PartConfig, PartSink};
use crate::{Error, Result};

/// Writes each part to its own file under a [`PartConfig`].
#[derive(Debug)]
pub struct FilePartSink {
    config: PartConfig,
    completed_sizes: Vec<u64>,
}

impl FilePartSink {
    /// Creates a sink; files are created lazily, one per part.
    pub fn new(config: PartConfig) -> Self {
        Self {
            config,
            completed_sizes: Vec::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PartConfig {
        &self.config
    }

    /// Sizes of the parts completed so far.
    pub fn part_sizes(&self) -> &[u64] {
        &self.completed_sizes
    }
}

impl PartSink for FilePartSink {
    type Writer = BufWriter<File>;

    fn create_part(&mut self, index: u32) -> Result<Self::Writer> {
        let path = self.config.part_path(index);
        let file = File::create(&path).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Failed to create part {}: {}", path.display(), e),
            ))
        })?;
        log::debug!("opened part {} at {}", index, path.display());
        Ok(BufWriter::new(file))
    }

    fn finish_part(&mut self, index: u32, mut writer: Self::Writer) -> Result<u64> {
        writer.flush()?;
        let size = writer.get_ref().metadata()?.len();
        log::debug!("finished part {} ({} bytes)", index, size);
        self.completed_sizes.push(size);
        Ok(size)
    }
}

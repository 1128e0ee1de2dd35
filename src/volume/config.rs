//! Naming and sizing of part files.

use std::path::{Path, PathBuf};

/// Default part budget (64 KiB).
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024;

/// Base path and size budget for a set of part files.
///
/// # Example
///
/// ```rust
/// use ppmrc::volume::PartConfig;
///
/// let config = PartConfig::new("corpus", 1000);
/// assert_eq!(config.part_path(0).to_str().unwrap(), "corpus-part0.bin");
/// assert_eq!(config.part_path(12).to_str().unwrap(), "corpus-part12.bin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartConfig {
    base_path: PathBuf,
    part_size: u64,
}

impl PartConfig {
    /// Creates a configuration.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Path prefix shared by every part
    /// * `part_size` - Maximum size of each part in bytes
    pub fn new(base_path: impl AsRef<Path>, part_size: u64) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            part_size,
        }
    }

    /// Creates a configuration with [`DEFAULT_PART_SIZE`].
    pub fn with_default_size(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, DEFAULT_PART_SIZE)
    }

    /// Returns the shared path prefix.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the part budget in bytes.
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// Path of part `index` (zero-based).
    pub fn part_path(&self, index: u32) -> PathBuf {
        let base = self.base_path.to_string_lossy();
        PathBuf::from(format!("{}-part{}.bin", base, index))
    }

    /// Counts the consecutive parts present on disk, starting at part 0.
    pub fn count_existing(&self) -> u32 {
        let mut count = 0;
        while self.part_path(count).is_file() {
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_generation() {
        let config = PartConfig::new("out", 10);
        assert_eq!(config.part_path(0), PathBuf::from("out-part0.bin"));
        assert_eq!(config.part_path(1), PathBuf::from("out-part1.bin"));
        assert_eq!(config.part_path(100), PathBuf::from("out-part100.bin"));
    }

    #[test]
    fn test_part_path_with_directory() {
        let config = PartConfig::new("/data/run/out", 10);
        assert_eq!(
            config.part_path(3),
            PathBuf::from("/data/run/out-part3.bin")
        );
    }

    #[test]
    fn test_count_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartConfig::new(dir.path().join("x"), 10);
        assert_eq!(config.count_existing(), 0);
        std::fs::write(config.part_path(0), b"a").unwrap();
        std::fs::write(config.part_path(1), b"b").unwrap();
        std::fs::write(config.part_path(3), b"d").unwrap();
        assert_eq!(config.count_existing(), 2);
    }

    #[test]
    fn test_default_size() {
        let config = PartConfig::with_default_size("x");
        assert_eq!(config.part_size(), DEFAULT_PART_SIZE);
        assert_eq!(config.base_path(), Path::new("x"));
    }
}

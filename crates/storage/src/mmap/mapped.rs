//! Read-only mapping.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

/// A finished file mapped read-only.
///
/// Zero-length files cannot be mapped on every platform, so they are
/// represented as an empty slice with no mapping behind it.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    mmap: Option<Mmap>,
}

impl MappedFile {
    /// Open and map `path`.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the log is not modified while a reader maps it.
            Some(unsafe { Mmap::map(&file)? })
        };

        debug!(path = %path.display(), len, "mapped file read-only");

        Ok(MappedFile {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// The whole file.
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// File length in bytes.
    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// `len` bytes at `offset`, or `None` if the range runs past the end.
    pub fn read_at(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(len)?;
        self.as_slice().get(start..end)
    }

    /// Path of the mapped file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = MappedFile::open(&path).unwrap();
        assert_eq!(file.len(), 10);
        assert!(!file.is_empty());
        assert_eq!(file.read_at(2, 3), Some(&b"234"[..]));
        assert_eq!(file.read_at(8, 2), Some(&b"89"[..]));
        assert_eq!(file.read_at(8, 3), None);
        assert_eq!(file.read_at(u64::MAX, 1), None);
        assert_eq!(file.path(), path);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let file = MappedFile::open(&path).unwrap();
        assert!(file.is_empty());
        assert_eq!(file.as_slice(), &[] as &[u8]);
        assert_eq!(file.read_at(0, 0), Some(&[][..]));
        assert_eq!(file.read_at(0, 1), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = MappedFile::open(dir.path().join("missing.bin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

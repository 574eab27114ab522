//! Growable read/write mapping.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::debug;

/// A read/write mapping over a file that grows on demand.
///
/// The file is sized up front with `set_len`, which most filesystems satisfy
/// sparsely. Writes past the current capacity extend the file to
/// `max(2 * capacity, required)` and remap it. Offsets are stable across
/// growth, and bytes already written are never moved.
pub struct GrowableMmap {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
    capacity: u64,
}

impl GrowableMmap {
    /// Create (or truncate) `path` and map `preallocation` bytes of it.
    ///
    /// # Errors
    /// `InvalidInput` for a zero preallocation; any I/O error from
    /// creating, sizing or mapping the file.
    pub fn create(path: impl AsRef<Path>, preallocation: u64) -> io::Result<Self> {
        let path = path.as_ref();
        if preallocation == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "preallocation must be non-zero",
            ));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(preallocation)?;
        let mmap = map(&file, preallocation)?;

        debug!(path = %path.display(), capacity = preallocation, "created mapped file");

        Ok(GrowableMmap {
            path: path.to_path_buf(),
            file,
            mmap,
            capacity: preallocation,
        })
    }

    /// Copy `bytes` into the mapping at `offset`, growing it if needed.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let end = offset
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| invalid_range(offset, bytes.len()))?;
        if end > self.capacity {
            self.grow(end)?;
        }

        let start = offset as usize;
        self.mmap[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes currently mapped.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Sync the whole mapping to disk.
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    /// Sync `len` bytes starting at `offset`.
    pub fn flush_range(&self, offset: u64, len: usize) -> io::Result<()> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.capacity => self.mmap.flush_range(offset as usize, len),
            _ => Err(invalid_range(offset, len)),
        }
    }

    /// Flush, unmap and shrink the file to `final_size` bytes.
    ///
    /// Consumes the backend; the mapping is released even if the flush
    /// fails.
    pub fn truncate_to(self, final_size: u64) -> io::Result<()> {
        let GrowableMmap {
            path,
            file,
            mmap,
            capacity,
        } = self;

        if final_size > capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("final size {} exceeds capacity {}", final_size, capacity),
            ));
        }

        let flushed = mmap.flush();
        drop(mmap);
        flushed?;

        file.set_len(final_size)?;
        file.sync_all()?;

        debug!(path = %path.display(), size = final_size, "truncated mapped file");
        Ok(())
    }

    /// Current mapped capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn grow(&mut self, required: u64) -> io::Result<()> {
        let new_capacity = self.capacity.saturating_mul(2).max(required);
        if usize::try_from(new_capacity).is_err() {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("cannot map {} bytes on this platform", new_capacity),
            ));
        }

        // Pending writes live in the shared page cache, so replacing the
        // mapping loses nothing.
        self.file.set_len(new_capacity)?;
        self.mmap = map(&self.file, new_capacity)?;

        debug!(
            path = %self.path.display(),
            from = self.capacity,
            to = new_capacity,
            "grew mapped file"
        );
        self.capacity = new_capacity;
        Ok(())
    }
}

impl std::fmt::Debug for GrowableMmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableMmap")
            .field("path", &self.path)
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn map(file: &File, len: u64) -> io::Result<MmapMut> {
    // SAFETY: the file is opened exclusively by this process for the
    // lifetime of the mapping and is never shrunk while mapped.
    unsafe { MmapOptions::new().len(len as usize).map_mut(file) }
}

fn invalid_range(offset: u64, len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("range of {} bytes at offset {} is out of bounds", len, offset),
    )
}

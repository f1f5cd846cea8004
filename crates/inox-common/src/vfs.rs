//! Virtual filesystem used by module resolution.
//!
//! - [`RealFs`]: the operating system's filesystem
//! - [`MemoryFs`]: an in-memory tree, mostly for tests and editors

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

/// The kind of an existing filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Filesystem operations needed to load source files.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Makes `path` absolute and lexically normalized (`.` removed).
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;

    /// Returns the kind of the entry at `path`, `NotFound` if it does not exist.
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Reads the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn exists(&self, path: &Path) -> bool {
        self.entry_kind(path).is_ok()
    }
}

/// Removes `.` components and redundant separators without touching the disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The operating system's filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        if path.is_absolute() {
            return Ok(normalize(path));
        }
        let cwd = std::env::current_dir()?;
        Ok(normalize(&cwd.join(path)))
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An in-memory filesystem rooted at `/`.
///
/// Directories exist implicitly as ancestors of stored files, or explicitly
/// through [`MemoryFs::add_dir`].
#[derive(Default)]
pub struct MemoryFs {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a file, replacing any previous content.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(&Path::new("/").join(path.as_ref()));
        self.files.write().insert(path, content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(&Path::new("/").join(path.as_ref()));
        self.dirs.write().insert(path);
    }

    /// Builder-style variant of [`MemoryFs::add_file`].
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    fn is_implicit_dir(&self, path: &Path) -> bool {
        if path == Path::new("/") {
            return true;
        }
        self.files.read().keys().any(|file| file.starts_with(path) && file != path)
    }
}

impl fmt::Debug for MemoryFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFs")
            .field("files", &self.files.read().len())
            .finish()
    }
}

impl FileSystem for MemoryFs {
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(normalize(&Path::new("/").join(path)))
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let path = normalize(path);
        if self.files.read().contains_key(&path) {
            return Ok(EntryKind::File);
        }
        if self.dirs.read().contains(&path) || self.is_implicit_dir(&path) {
            return Ok(EntryKind::Dir);
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        match self.files.read().get(&path) {
            Some(content) => Ok(content.clone()),
            None if self.is_implicit_dir(&path) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a folder", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b//c")), PathBuf::from("/a/b/c"));
        assert_eq!(normalize(Path::new("./x.ix")), PathBuf::from("x.ix"));
    }

    #[test]
    fn test_memory_fs_entries() {
        let fs = MemoryFs::new()
            .with_file("/mod.ix", "manifest {}")
            .with_file("/lib/dep.ix", "includable-file");

        assert_eq!(fs.entry_kind(Path::new("/mod.ix")).unwrap(), EntryKind::File);
        assert_eq!(fs.entry_kind(Path::new("/lib")).unwrap(), EntryKind::Dir);
        assert_eq!(
            fs.entry_kind(Path::new("/missing.ix")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(fs.read(Path::new("/lib/./dep.ix")).unwrap(), b"includable-file");
    }

    #[test]
    fn test_memory_fs_absolute() {
        let fs = MemoryFs::new();
        assert_eq!(fs.absolute(Path::new("dep.ix")).unwrap(), PathBuf::from("/dep.ix"));
    }

    #[test]
    fn test_real_fs_reads_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.ix");
        std::fs::write(&path, "manifest {}").unwrap();

        let fs = RealFs;
        assert_eq!(fs.entry_kind(&path).unwrap(), EntryKind::File);
        assert_eq!(fs.entry_kind(dir.path()).unwrap(), EntryKind::Dir);
        assert_eq!(fs.read(&path).unwrap(), b"manifest {}");
        assert!(fs.absolute(Path::new("rel.ix")).unwrap().is_absolute());
    }
}

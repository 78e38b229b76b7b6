//! Host filesystem driver
//!
//! Serves a mounted volume (or any directory / single file) through [`FileEntry`].

use super::{path_components, EntryReader, FileEntry, Seekable};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File or directory on the host filesystem, metadata captured at lookup time
#[derive(Debug, Clone)]
pub struct LocalEntry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    length: u64,
}

impl LocalEntry {
    /// Open the served root. Fails if the path does not exist.
    pub fn open_root(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        // "." and "/" have no file name; fall back to the canonical path
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => path
                .canonicalize()?
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Ok(Self {
            path: path.to_path_buf(),
            name,
            is_dir: metadata.is_dir(),
            length: if metadata.is_dir() { 0 } else { metadata.len() },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileEntry for LocalEntry {
    fn is_directory(&self) -> bool {
        self.is_dir
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn search(&self, path: &str) -> io::Result<Option<Arc<dyn FileEntry>>> {
        if !self.is_dir {
            return Ok(None);
        }

        let mut target = self.path.clone();
        let mut leaf = None;
        for component in path_components(path) {
            // Never walk above the served root
            if component == ".." || (cfg!(windows) && component.contains('\\')) {
                return Ok(None);
            }
            // No file name can hold NUL
            if component.contains('\0') {
                return Ok(None);
            }
            target.push(component);
            leaf = Some(component);
        }

        let Some(leaf) = leaf else {
            return Ok(Some(Arc::new(self.clone())));
        };

        // A file used as a directory component ("a.txt/b") is just a miss
        if !target.parent().is_some_and(Path::is_dir) {
            return Ok(None);
        }

        let metadata = match fs::metadata(&target) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(Arc::new(Self {
            path: target,
            name: leaf.to_string(),
            is_dir: metadata.is_dir(),
            length: if metadata.is_dir() { 0 } else { metadata.len() },
        })))
    }

    fn open(&self) -> io::Result<Box<dyn EntryReader>> {
        if self.is_dir {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", self.path.display()),
            ));
        }
        let file = File::open(&self.path)?;
        Ok(Box::new(Seekable(file)))
    }
}

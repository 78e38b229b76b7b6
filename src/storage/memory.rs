//! In-memory driver
//!
//! A small immutable file tree, handy for embedding fixed content and for tests.
//! Readers only move forward by reading, like a raw block-device stream.

use super::{path_components, EntryReader, FileEntry, Sequential};
use hyper::body::Bytes;
use std::io::{self, Cursor};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Node {
    File(Bytes),
    Directory(Vec<Arc<MemoryEntry>>),
}

/// File or directory held in memory
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    name: String,
    node: Node,
}

impl MemoryEntry {
    pub fn file(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            node: Node::File(content.into()),
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            node: Node::Directory(children.into_iter().map(Arc::new).collect()),
        }
    }

    fn child(&self, name: &str) -> Option<&Arc<Self>> {
        match &self.node {
            Node::Directory(children) => children.iter().find(|c| c.name == name),
            Node::File(_) => None,
        }
    }
}

impl FileEntry for MemoryEntry {
    fn is_directory(&self) -> bool {
        matches!(self.node, Node::Directory(_))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> u64 {
        match &self.node {
            Node::File(content) => content.len() as u64,
            Node::Directory(_) => 0,
        }
    }

    fn search(&self, path: &str) -> io::Result<Option<Arc<dyn FileEntry>>> {
        if !self.is_directory() {
            return Ok(None);
        }

        let mut current: Option<&Arc<Self>> = None;
        for component in path_components(path) {
            let parent = current.map_or(self, |c| c.as_ref());
            match parent.child(component) {
                Some(next) => current = Some(next),
                None => return Ok(None),
            }
        }

        Ok(Some(match current {
            Some(found) => Arc::clone(found) as Arc<dyn FileEntry>,
            None => Arc::new(self.clone()),
        }))
    }

    fn open(&self) -> io::Result<Box<dyn EntryReader>> {
        match &self.node {
            Node::File(content) => Ok(Box::new(Sequential(Cursor::new(content.clone())))),
            Node::Directory(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", self.name),
            )),
        }
    }
}

use crate::result::CommonResult;
use crate::visitor::duplicate_ids;
use quire_model::{Decorator, ModelNode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File system abstraction for snapshot loading and testing
pub trait FileSystem {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> Result<String, std::io::Error>;
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }
}

/// In-memory file system for testing
pub struct MockFileSystem {
    pub files: HashMap<PathBuf, String>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, std::io::Error> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }
}

/// Load and validate a model snapshot stored as JSON
pub fn load_snapshot(fs: &dyn FileSystem, path: &Path) -> CommonResult<ModelNode> {
    let content = fs.read_to_string(path)?;
    let node = ModelNode::from_json(&content)?;
    node.validate()?;
    let duplicates = duplicate_ids(&node);
    if !duplicates.is_empty() {
        warn!(path = %path.display(), ids = ?duplicates, "Snapshot repeats node ids, last occurrence wins");
    }
    Ok(node)
}

/// Load a JSON array of decorators; a missing file means no decorators
pub fn load_decorators(fs: &dyn FileSystem, path: &Path) -> CommonResult<Vec<Decorator>> {
    if !fs.exists(path) {
        return Ok(Vec::new());
    }
    let content = fs.read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

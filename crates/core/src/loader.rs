//! Table loading with per-source memoization.

use crate::error::Result;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use ventas_sheet::Sheet;

/// File loaded when no upload is given.
pub const DEFAULT_FILE: &str = "vendedores.xlsx";

/// An in-memory spreadsheet supplied by the user.
///
/// The file name's extension selects the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk as an upload.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.bytes.hash(&mut hasher);
        hasher.finish()
    }
}

/// Identity of a loaded source; a changed source gets a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    Upload {
        file_name: String,
        hash: u64,
        len: usize,
    },
    File {
        path: PathBuf,
        modified: Option<SystemTime>,
        len: u64,
    },
}

/// Loads record tables and memoizes them by source identity.
#[derive(Debug)]
pub struct TableLoader {
    default_path: PathBuf,
    cache: HashMap<SourceKey, Arc<Sheet>>,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FILE)
    }
}

impl TableLoader {
    /// Create a loader that falls back to `default_path` when there is no upload.
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            cache: HashMap::new(),
        }
    }

    #[must_use]
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Number of memoized tables.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Load the upload if given, else the default file, else an empty table.
    ///
    /// A missing default file is not an error: the empty table tells the
    /// caller to ask for a source.
    pub fn load(&mut self, upload: Option<&Upload>) -> Result<Arc<Sheet>> {
        if let Some(upload) = upload {
            let key = SourceKey::Upload {
                file_name: upload.file_name.clone(),
                hash: upload.content_hash(),
                len: upload.bytes.len(),
            };
            return self.memoized(key, || Sheet::from_bytes(&upload.file_name, &upload.bytes));
        }

        let metadata = match fs::metadata(&self.default_path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                tracing::debug!(path = %self.default_path.display(), "no default file");
                return Ok(Arc::new(Sheet::new()));
            }
        };

        let key = SourceKey::File {
            path: self.default_path.clone(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };
        let path = self.default_path.clone();
        self.memoized(key, || Sheet::from_path(&path))
    }

    fn memoized<F>(&mut self, key: SourceKey, parse: F) -> Result<Arc<Sheet>>
    where
        F: FnOnce() -> ventas_sheet::Result<Sheet>,
    {
        if let Some(sheet) = self.cache.get(&key) {
            tracing::debug!(?key, "table cache hit");
            return Ok(Arc::clone(sheet));
        }

        tracing::debug!(?key, "table cache miss");
        let sheet = Arc::new(parse()?);
        tracing::info!(
            rows = sheet.row_count(),
            columns = sheet.col_count(),
            "loaded table"
        );
        self.cache.insert(key, Arc::clone(&sheet));
        Ok(sheet)
    }
}

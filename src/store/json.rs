//! One JSON file per profile
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/relationships/<contact>.json
//! <root>/styles/<author>.json
//! ```
//!
//! Ids are percent-encoded in file names so any contact id maps to a single
//! safe path component. The empty id is stored as `%.json`, a name no other
//! id encodes to.

use super::{ProfileStore, RelationshipRecord, StyleRecord};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const RELATIONSHIPS_DIR: &str = "relationships";
const STYLES_DIR: &str = "styles";

/// File stem of the empty id
const EMPTY_ID_STEM: &str = "%";

pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating its directories
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(RELATIONSHIPS_DIR))?;
        fs::create_dir_all(root.join(STYLES_DIR))?;
        debug!("Opened profile store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, dir: &str, id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{}.json", encode_id(id)))
    }

    fn read<T: DeserializeOwned>(&self, dir: &str, id: &str) -> Result<Option<T>> {
        let path = self.path_for(dir, id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn write<T: Serialize>(&self, dir: &str, id: &str, record: &T) -> Result<()> {
        let path = self.path_for(dir, id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_id)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ProfileStore for JsonFileStore {
    fn load_relationship(&self, contact_id: &str) -> Result<Option<RelationshipRecord>> {
        self.read(RELATIONSHIPS_DIR, contact_id)
    }

    fn save_relationship(&self, contact_id: &str, record: &RelationshipRecord) -> Result<()> {
        self.write(RELATIONSHIPS_DIR, contact_id, record)
    }

    fn relationship_ids(&self) -> Result<Vec<String>> {
        self.list(RELATIONSHIPS_DIR)
    }

    fn load_style(&self, author: &str) -> Result<Option<StyleRecord>> {
        self.read(STYLES_DIR, author)
    }

    fn save_style(&self, author: &str, record: &StyleRecord) -> Result<()> {
        self.write(STYLES_DIR, author, record)
    }

    fn style_ids(&self) -> Result<Vec<String>> {
        self.list(STYLES_DIR)
    }
}

fn is_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'@' | b'+')
}

/// Percent-encode everything outside `[A-Za-z0-9-_@+]`
pub fn encode_id(id: &str) -> String {
    if id.is_empty() {
        return EMPTY_ID_STEM.to_string();
    }
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if is_safe(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// Inverse of [`encode_id`]; `None` for names this store did not write
pub fn decode_id(name: &str) -> Option<String> {
    if name == EMPTY_ID_STEM {
        return Some(String::new());
    }
    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

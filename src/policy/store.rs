//! Sled-backed persistence for the policy document and the flagged-sample history.

use crate::error::StorageError;
use crate::policy::prompt::DEFAULT_POLICY;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

const POLICY_TREE: &str = "policy";
const POLICY_KEY: &[u8] = b"current";
const FLAGGED_TREE: &str = "flagged";

/// `[policy]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Stored policies shorter than this (after trimming) are replaced by the default
    #[serde(default = "default_min_len")]
    pub min_len: usize,
}

fn default_min_len() -> usize {
    10
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_len: default_min_len(),
        }
    }
}

/// Open the state database at `path` and return the policy store and flag history.
pub fn open_state(
    path: &Path,
    config: &PolicyConfig,
) -> Result<(PolicyStore, FlagHistory), StorageError> {
    let db = sled::open(path).map_err(|e| StorageError::sled("Failed to open sled database", e))?;
    Ok((
        PolicyStore::open(&db, config.min_len)?,
        FlagHistory::open(db)?,
    ))
}

/// The single current policy document.
///
/// Readers get a snapshot from memory; `write` replaces the text wholesale and
/// flushes it to disk before updating the snapshot.
pub struct PolicyStore {
    tree: sled::Tree,
    current: RwLock<String>,
    min_len: usize,
}

impl PolicyStore {
    pub fn open(db: &sled::Db, min_len: usize) -> Result<Self, StorageError> {
        let tree = db
            .open_tree(POLICY_TREE)
            .map_err(|e| StorageError::sled("Failed to open policy tree", e))?;
        let current = match tree
            .get(POLICY_KEY)
            .map_err(|e| StorageError::sled("Failed to read policy", e))?
        {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|e| StorageError::Decode(format!("Stored policy is not UTF-8: {}", e)))?,
            None => String::new(),
        };
        Ok(Self {
            tree,
            current: RwLock::new(current),
            min_len,
        })
    }

    /// Store backed by a throwaway sled database.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StorageError::sled("Failed to open temporary database", e))?;
        Self::open(&db, default_min_len())
    }

    /// Raw stored text (empty when unset).
    pub fn read(&self) -> String {
        self.current.read().clone()
    }

    /// The policy in force: the stored text, or [`DEFAULT_POLICY`] when it is blank
    /// or shorter than the configured minimum.
    pub fn effective(&self) -> String {
        let current = self.current.read();
        if current.trim().chars().count() < self.min_len {
            DEFAULT_POLICY.to_string()
        } else {
            current.clone()
        }
    }

    pub fn is_default(&self) -> bool {
        self.current.read().trim().chars().count() < self.min_len
    }

    pub fn write(&self, text: &str) -> Result<(), StorageError> {
        self.tree
            .insert(POLICY_KEY, text.as_bytes())
            .map_err(|e| StorageError::sled("Failed to write policy", e))?;
        self.tree
            .flush()
            .map_err(|e| StorageError::sled("Failed to flush policy", e))?;
        *self.current.write() = text.to_string();
        Ok(())
    }

    /// Forget the stored policy so the default applies again.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.tree
            .remove(POLICY_KEY)
            .map_err(|e| StorageError::sled("Failed to clear policy", e))?;
        self.tree
            .flush()
            .map_err(|e| StorageError::sled("Failed to flush policy", e))?;
        self.current.write().clear();
        Ok(())
    }
}

/// A user-flagged selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedSample {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only history of flagged samples, in insertion order.
pub struct FlagHistory {
    db: sled::Db,
    tree: sled::Tree,
}

impl FlagHistory {
    pub fn open(db: sled::Db) -> Result<Self, StorageError> {
        let tree = db
            .open_tree(FLAGGED_TREE)
            .map_err(|e| StorageError::sled("Failed to open flagged tree", e))?;
        Ok(Self { db, tree })
    }

    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StorageError::sled("Failed to open temporary database", e))?;
        Self::open(db)
    }

    pub fn append(&self, content: &str) -> Result<FlaggedSample, StorageError> {
        let sample = FlaggedSample {
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        let id = self
            .db
            .generate_id()
            .map_err(|e| StorageError::sled("Failed to allocate sample id", e))?;
        let value = bincode::serialize(&sample)
            .map_err(|e| StorageError::Encode(format!("Failed to encode flagged sample: {}", e)))?;
        // Big-endian keys keep sled's lexicographic order equal to insertion order.
        self.tree
            .insert(id.to_be_bytes(), value)
            .map_err(|e| StorageError::sled("Failed to append flagged sample", e))?;
        self.tree
            .flush()
            .map_err(|e| StorageError::sled("Failed to flush flagged samples", e))?;
        Ok(sample)
    }

    /// All samples, oldest first.
    pub fn list(&self) -> Result<Vec<FlaggedSample>, StorageError> {
        self.tree
            .iter()
            .values()
            .map(|value| {
                let value =
                    value.map_err(|e| StorageError::sled("Failed to read flagged sample", e))?;
                bincode::deserialize(&value).map_err(|e| {
                    StorageError::Decode(format!("Failed to decode flagged sample: {}", e))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

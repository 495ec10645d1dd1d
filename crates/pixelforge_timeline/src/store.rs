// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content-addressable storage for keyframe pixel snapshots.
//!
//! Layer and mask keyframes do not own their pixels; they hold a
//! [`PixelDataId`] into a [`KeyframeStore`]. Identical snapshots share one
//! entry. Entries are never mutated after insertion, so readers that want to
//! edit a buffer clone it first.

use crate::error::TimelineResult;
use crate::pixels::PixelBuffer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Integer handle to a stored pixel snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelDataId(pub u32);

/// Pixel snapshot storage shared by all tracks of one animation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyframeStore {
    entries: IndexMap<PixelDataId, PixelBuffer>,
    next_id: u32,
    /// Content hash -> ids with that hash
    #[serde(skip)]
    by_content: HashMap<u64, Vec<PixelDataId>>,
}

fn content_hash(buffer: &PixelBuffer) -> u64 {
    let mut hasher = DefaultHasher::new();
    buffer.hash(&mut hasher);
    hasher.finish()
}

impl KeyframeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot of `buffer`, reusing an identical existing entry
    pub fn insert(&mut self, buffer: &PixelBuffer) -> PixelDataId {
        let hash = content_hash(buffer);
        if let Some(ids) = self.by_content.get(&hash) {
            if let Some(id) = ids.iter().find(|id| self.entries.get(*id) == Some(buffer)) {
                return *id;
            }
        }

        let id = PixelDataId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, buffer.clone());
        self.by_content.entry(hash).or_default().push(id);
        id
    }

    /// Shared access to a stored snapshot
    pub fn get(&self, id: PixelDataId) -> Option<&PixelBuffer> {
        self.entries.get(&id)
    }

    /// Whether `id` resolves
    pub fn contains(&self, id: PixelDataId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all stored snapshots
    pub fn ids(&self) -> impl Iterator<Item = PixelDataId> + '_ {
        self.entries.keys().copied()
    }

    /// Remove one snapshot
    pub fn remove(&mut self, id: PixelDataId) -> Option<PixelBuffer> {
        let buffer = self.entries.shift_remove(&id)?;
        let hash = content_hash(&buffer);
        if let Some(ids) = self.by_content.get_mut(&hash) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_content.remove(&hash);
            }
        }
        Some(buffer)
    }

    /// Delete every entry not in `referenced`, returning how many were removed
    pub fn retain_referenced(&mut self, referenced: &HashSet<PixelDataId>) -> usize {
        let orphaned: Vec<PixelDataId> = self
            .entries
            .keys()
            .filter(|id| !referenced.contains(id))
            .copied()
            .collect();
        for id in &orphaned {
            self.remove(*id);
        }
        if !orphaned.is_empty() {
            tracing::debug!("Reclaimed {} orphaned pixel snapshots", orphaned.len());
        }
        orphaned.len()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_content.clear();
    }

    fn rebuild_index(&mut self) {
        self.by_content.clear();
        for (id, buffer) in &self.entries {
            self.by_content.entry(content_hash(buffer)).or_default().push(*id);
        }
    }

    /// Serialize the store to a compact binary blob
    pub fn to_bytes(&self) -> TimelineResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore a store from [`KeyframeStore::to_bytes`] output
    pub fn from_bytes(bytes: &[u8]) -> TimelineResult<Self> {
        let mut store: KeyframeStore = bincode::deserialize(bytes)?;
        store.rebuild_index();
        Ok(store)
    }
}

// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-track registry of tagged track references.
//!
//! A track owns one [`TrackReferenceRegistry`]. Each entry groups the ids of
//! the tracks it relates to under a relationship tag (`cdsc`, `hint`, ...).
//! Registries are tiny, so entries live in a flat `Vec` searched linearly;
//! this keeps iteration order deterministic for diagnostics.
//!
//! ## Handles
//!
//! Mutating calls return a [`TrackReferenceHandle`] rather than a reference.
//! A handle is an index plus the registry generation it was issued in.
//! Generations come from a process-wide counter: every new registry and every
//! [`TrackReferenceRegistry::release`] draws a fresh one, so a handle never
//! resolves in another registry or after the registry was emptied. Plain
//! `&TrackReference` views from [`TrackReferenceRegistry::find`] are
//! borrows and cannot be held across any mutating call.
//!
//! ## Failure atomicity
//!
//! All storage is reserved with `try_reserve` before anything is committed.
//! When an operation returns [`TrackMetaError::AllocationFailure`], neither
//! the registry nor any of its entries has changed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, TrackMetaError};
use crate::fourcc::FourCC;

/// Inline capacity for track id lists; most references name one or two tracks.
const INLINE_TRACK_IDS: usize = 4;

pub type TrackIdList = SmallVec<[u32; INLINE_TRACK_IDS]>;

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(0);

fn next_generation() -> u32 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// One tagged group of referenced track ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackReference {
    tag: FourCC,
    track_ids: TrackIdList,
}

impl TrackReference {
    pub fn new(tag: FourCC) -> Self {
        Self { tag, track_ids: SmallVec::new() }
    }

    pub const fn tag(&self) -> FourCC {
        self.tag
    }

    /// Referenced ids in insertion order, without duplicates.
    pub fn track_ids(&self) -> &[u32] {
        &self.track_ids
    }

    pub fn contains(&self, track_id: u32) -> bool {
        self.track_ids.contains(&track_id)
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }

    /// Appends `track_id` unless present. Returns whether it was appended.
    fn push_unique(&mut self, track_id: u32) -> Result<bool> {
        if self.contains(track_id) {
            return Ok(false);
        }
        self.track_ids.try_reserve(1)?;
        self.track_ids.push(track_id);
        Ok(true)
    }
}

/// Index of an entry in a [`TrackReferenceRegistry`], checked against the
/// generation it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackReferenceHandle {
    index: usize,
    generation: u32,
}

impl TrackReferenceHandle {
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// The set of track references owned by one track, unique by tag.
///
/// Deserializing merges the listed groups with
/// [`map_source_tracks`](Self::map_source_tracks), so repeated tags and ids
/// collapse exactly as they do when the registry is built in code.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TrackReferenceRegistry {
    references: Vec<TrackReference>,
    #[serde(skip)]
    generation: u32,
}

impl Default for TrackReferenceRegistry {
    fn default() -> Self {
        Self { references: Vec::new(), generation: next_generation() }
    }
}

/// Wire form of one group; only trusted once merged into a registry.
#[derive(Deserialize)]
struct TrackReferenceRecord {
    tag: FourCC,
    #[serde(default)]
    track_ids: Vec<u32>,
}

impl<'de> Deserialize<'de> for TrackReferenceRegistry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = Vec::<TrackReferenceRecord>::deserialize(deserializer)?;
        let mut registry = Self::new();
        for record in records {
            registry
                .map_source_tracks(&record.track_ids, record.tag)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(registry)
    }
}

impl TrackReferenceRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the reference group for `tag`. Never allocates or mutates.
    pub fn find(&self, tag: FourCC) -> Option<&TrackReference> {
        self.references.iter().find(|r| r.tag == tag)
    }

    fn position(&self, tag: FourCC) -> Option<usize> {
        self.references.iter().position(|r| r.tag == tag)
    }

    const fn handle(&self, index: usize) -> TrackReferenceHandle {
        TrackReferenceHandle { index, generation: self.generation }
    }

    /// Resolves a handle issued by this registry.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::StaleHandle` if the handle came from another
    /// registry or the registry was released after it was issued.
    pub fn get(&self, handle: TrackReferenceHandle) -> Result<&TrackReference> {
        if handle.generation != self.generation {
            return Err(TrackMetaError::StaleHandle);
        }
        self.references.get(handle.index).ok_or(TrackMetaError::StaleHandle)
    }

    /// Returns the entry for `tag`, appending an empty one if missing.
    ///
    /// Any `&TrackReference` obtained earlier must be re-fetched afterwards;
    /// the borrow checker enforces this for views, the generation check for
    /// handles.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if the entry sequence cannot
    /// grow. The registry is unchanged in that case.
    pub fn find_or_add(&mut self, tag: FourCC) -> Result<TrackReferenceHandle> {
        if let Some(index) = self.position(tag) {
            return Ok(self.handle(index));
        }
        self.references.try_reserve(1)?;
        self.references.push(TrackReference::new(tag));
        tracing::trace!(tag = %tag, "Added track reference group");
        Ok(self.handle(self.references.len() - 1))
    }

    /// Adds `track_id` under `tag` unless it is already there.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if storage cannot grow. No
    /// new group is left behind when that happens.
    pub fn add_track_id(&mut self, tag: FourCC, track_id: u32) -> Result<TrackReferenceHandle> {
        if let Some(index) = self.position(tag) {
            if self.references[index].push_unique(track_id)? {
                tracing::trace!(tag = %tag, track_id, "Added track id to reference");
            }
            return Ok(self.handle(index));
        }

        // Build the new group off to the side so a failure commits nothing.
        self.references.try_reserve(1)?;
        let mut reference = TrackReference::new(tag);
        reference.push_unique(track_id)?;
        self.references.push(reference);
        tracing::trace!(tag = %tag, track_id, "Added track reference group");
        Ok(self.handle(self.references.len() - 1))
    }

    /// Copies `source_track_ids` into the group for `tag`, skipping ids that
    /// are already present or repeated in the source list.
    ///
    /// The whole copy is one step: either every new id lands, or nothing
    /// changes. Callers that mutate related state elsewhere should make this
    /// the last step of their setup sequence.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if storage cannot grow.
    pub fn map_source_tracks(
        &mut self,
        source_track_ids: &[u32],
        tag: FourCC,
    ) -> Result<TrackReferenceHandle> {
        let existing = self.position(tag);

        let mut seen: HashSet<u32> = HashSet::new();
        let existing_len = existing.map_or(0, |i| self.references[i].len());
        seen.try_reserve(existing_len.saturating_add(source_track_ids.len()))?;
        if let Some(i) = existing {
            seen.extend(self.references[i].track_ids.iter().copied());
        }

        let mut pending: SmallVec<[u32; 8]> = SmallVec::new();
        pending.try_reserve(source_track_ids.len())?;
        pending.extend(source_track_ids.iter().copied().filter(|&id| seen.insert(id)));

        let index = match existing {
            Some(index) => {
                self.references[index].track_ids.try_reserve(pending.len())?;
                index
            },
            None => {
                self.references.try_reserve(1)?;
                let mut reference = TrackReference::new(tag);
                reference.track_ids.try_reserve(pending.len())?;
                self.references.push(reference);
                self.references.len() - 1
            },
        };

        self.references[index].track_ids.extend(pending.iter().copied());
        tracing::debug!(
            tag = %tag,
            mapped = pending.len(),
            total = self.references[index].len(),
            "Mapped source tracks into track reference"
        );
        Ok(self.handle(index))
    }

    /// Reserves room for `additional` more ids in the group behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::StaleHandle` for a handle from before
    /// [`release`](Self::release), or `TrackMetaError::AllocationFailure` if
    /// the reservation fails.
    pub fn try_reserve_ids(&mut self, handle: TrackReferenceHandle, additional: usize) -> Result<()> {
        self.get(handle)?;
        self.references[handle.index].track_ids.try_reserve(additional)?;
        Ok(())
    }

    /// Drops every group and its id list. Outstanding handles become stale.
    pub fn release(&mut self) {
        if !self.references.is_empty() {
            tracing::trace!(groups = self.references.len(), "Releasing track references");
        }
        self.references = Vec::new();
        self.generation = next_generation();
    }

    /// Ordered union of the ids of every group accepted by `tag_filter`
    /// (all groups when `None`), first occurrence wins.
    pub fn referenced_track_ids(&self, tag_filter: Option<FourCC>) -> Vec<u32> {
        let mut seen = HashSet::new();
        self.iter()
            .filter(|r| tag_filter.is_none_or(|t| t == r.tag))
            .flat_map(TrackReference::track_ids)
            .copied()
            .filter(|&id| seen.insert(id))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackReference> {
        self.references.iter()
    }

    /// Number of reference groups.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

// Equality is over the reference groups only; the generation is bookkeeping.
impl PartialEq for TrackReferenceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.references == other.references
    }
}

impl Eq for TrackReferenceRegistry {}

impl<'a> IntoIterator for &'a TrackReferenceRegistry {
    type Item = &'a TrackReference;
    type IntoIter = std::slice::Iter<'a, TrackReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Muxer-side track setup.
//!
//! [`MuxTrackTable`] is the part of a muxer's per-file state this crate cares
//! about: for every output track its id, its [`TrackReferenceRegistry`], its
//! optional [`MetadataDescriptor`], and the tracks it was derived from.
//! Source and hint tracks are recorded by stream index while the muxer is
//! being configured and are only translated into track ids once every track
//! exists, by [`MuxTrackTable::map_source_tracks`].

use crate::codec::MediaKind;
use crate::descriptor::MetadataDescriptor;
use crate::error::{Result, TrackMetaError};
use crate::fourcc::FourCC;
use crate::side_data::StreamSideData;
use crate::track_ref::{TrackReferenceHandle, TrackReferenceRegistry};

/// One output track being set up.
#[derive(Debug, Clone, Default)]
pub struct MuxTrack {
    pub track_id: u32,
    pub kind: MediaKind,
    pub references: TrackReferenceRegistry,
    pub descriptor: Option<MetadataDescriptor>,
    /// Stream index of the track that hints this one.
    pub hint_track: Option<usize>,
    /// Stream indices of the tracks this one describes, hints or times.
    pub src_tracks: Vec<usize>,
}

impl MuxTrack {
    pub fn new(track_id: u32, kind: MediaKind) -> Self {
        Self { track_id, kind, ..Default::default() }
    }
}

/// Every output track of one muxing session, addressed by stream index.
#[derive(Debug, Clone, Default)]
pub struct MuxTrackTable {
    tracks: Vec<MuxTrack>,
}

impl MuxTrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a track and returns its stream index.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::AllocationFailure` if the table cannot grow.
    pub fn add_track(&mut self, track_id: u32, kind: MediaKind) -> Result<usize> {
        self.tracks.try_reserve(1)?;
        self.tracks.push(MuxTrack::new(track_id, kind));
        tracing::debug!(track_id, ?kind, index = self.tracks.len() - 1, "Added mux track");
        Ok(self.tracks.len() - 1)
    }

    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` for an out-of-range index.
    pub fn track(&self, index: usize) -> Result<&MuxTrack> {
        self.tracks.get(index).ok_or(TrackMetaError::UnknownTrack(index))
    }

    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` for an out-of-range index.
    pub fn track_mut(&mut self, index: usize) -> Result<&mut MuxTrack> {
        self.tracks.get_mut(index).ok_or(TrackMetaError::UnknownTrack(index))
    }

    pub fn tracks(&self) -> &[MuxTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Attaches the metadata descriptor of a metadata track.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` for an out-of-range index.
    pub fn set_descriptor(&mut self, index: usize, descriptor: MetadataDescriptor) -> Result<()> {
        self.track_mut(index)?.descriptor = Some(descriptor);
        Ok(())
    }

    /// Records the stream indices a track was derived from.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` if `index` or any source index
    /// is out of range. Nothing is recorded in that case.
    pub fn set_source_tracks(&mut self, index: usize, src_tracks: &[usize]) -> Result<()> {
        if let Some(&bad) = src_tracks.iter().find(|&&src| src >= self.tracks.len()) {
            return Err(TrackMetaError::UnknownTrack(bad));
        }
        let mut sources = Vec::new();
        sources.try_reserve_exact(src_tracks.len())?;
        sources.extend_from_slice(src_tracks);
        self.track_mut(index)?.src_tracks = sources;
        Ok(())
    }

    /// Marks `hint_index` as the hint track of `index` and records the hinted
    /// track as the hint track's source.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` if either index is out of range.
    pub fn set_hint_track(&mut self, index: usize, hint_index: usize) -> Result<()> {
        self.track(hint_index)?;
        self.track(index)?;
        let hint = &mut self.tracks[hint_index];
        if !hint.src_tracks.contains(&index) {
            hint.src_tracks.try_reserve(1)?;
            hint.src_tracks.push(index);
        }
        self.tracks[index].hint_track = Some(hint_index);
        Ok(())
    }

    /// Translates the source tracks of track `index` from stream indices into
    /// track ids and maps them into its references under `tag`.
    ///
    /// This should be the last setup step for the track: `src_tracks` has
    /// already been recorded, and on failure the references no longer mirror
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` if `index` or a recorded source
    /// index is out of range (checked before any mutation), or
    /// `TrackMetaError::AllocationFailure` from the registry.
    pub fn map_source_tracks(&mut self, index: usize, tag: FourCC) -> Result<TrackReferenceHandle> {
        let track = self.track(index)?;
        let mut ids = Vec::new();
        ids.try_reserve_exact(track.src_tracks.len())?;
        for &src in &track.src_tracks {
            ids.push(self.track(src)?.track_id);
        }

        let track = &mut self.tracks[index];
        let handle = track.references.map_source_tracks(&ids, tag)?;
        tracing::debug!(
            track_id = track.track_id,
            tag = %tag,
            sources = ?ids,
            "Mapped source tracks into track references"
        );
        Ok(handle)
    }

    /// Encodes the side data a container writer would persist for track
    /// `index`.
    ///
    /// # Errors
    ///
    /// Returns `TrackMetaError::UnknownTrack` for an out-of-range index, or
    /// an encoding failure.
    pub fn side_data(&self, index: usize) -> Result<StreamSideData> {
        let track = self.track(index)?;
        StreamSideData::encode(track.descriptor.as_ref(), &track.references)
    }

    /// Releases every track's references. Handles issued before become stale.
    pub fn release(&mut self) {
        for track in &mut self.tracks {
            track.references.release();
        }
    }
}

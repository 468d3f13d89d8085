// vodfetch - Twitch VOD and clip downloader
// Copyright (C) 2025 vodfetch contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Progress and diagnostic event reporting
//!
//! The pipeline emits structured events through an injected observer rather
//! than writing to any fixed destination itself. Embedders hook progress
//! bars or UIs here; the CLI uses [`TracingObserver`].

use std::path::PathBuf;

/// Milestones and progress updates emitted during a download
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// A rendition was chosen from the master playlist
    RenditionSelected { label: String, uri: String },

    /// The rendition's media playlist was fetched and decoded
    ManifestFetched {
        segment_count: usize,
        total_duration: f64,
    },

    /// The time window was applied to the segment list
    SegmentsSelected { selected: usize, total: usize },

    /// One more segment finished downloading
    SegmentFetched { completed: usize, total: usize },

    /// Assembly of the final artifact started
    AssemblyStarted { target: PathBuf },

    /// The final artifact was produced
    AssemblyCompleted { target: PathBuf },

    /// The workspace was kept on disk for inspection
    WorkspaceRetained { path: PathBuf },
}

/// Sink for [`DownloadEvent`]s. Implementations must be cheap and
/// non-blocking; the pipeline calls them inline.
pub trait DownloadObserver: Send + Sync {
    fn on_event(&self, event: &DownloadEvent);
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NullObserver;

impl DownloadObserver for NullObserver {
    fn on_event(&self, _event: &DownloadEvent) {}
}

/// Forwards events to the tracing subscriber
#[derive(Debug, Default)]
pub struct TracingObserver;

impl DownloadObserver for TracingObserver {
    fn on_event(&self, event: &DownloadEvent) {
        match event {
            DownloadEvent::RenditionSelected { label, uri } => {
                tracing::info!(label, uri, "rendition selected");
            }
            DownloadEvent::ManifestFetched {
                segment_count,
                total_duration,
            } => {
                tracing::info!(segment_count, total_duration, "media playlist fetched");
            }
            DownloadEvent::SegmentsSelected { selected, total } => {
                tracing::info!(selected, total, "segments selected");
            }
            DownloadEvent::SegmentFetched { completed, total } => {
                tracing::debug!(completed, total, "segment fetched");
            }
            DownloadEvent::AssemblyStarted { target } => {
                tracing::info!(target = %target.display(), "assembling output");
            }
            DownloadEvent::AssemblyCompleted { target } => {
                tracing::info!(target = %target.display(), "download complete");
            }
            DownloadEvent::WorkspaceRetained { path } => {
                tracing::info!(path = %path.display(), "workspace retained");
            }
        }
    }
}

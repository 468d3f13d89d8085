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


//! Download orchestration: workspace, segment fetching, progress events,
//! and the pipeline tying them together

pub mod fetch;
pub mod observer;
pub mod pipeline;
pub mod workspace;

pub use fetch::{fetch_to_file, FetchCoordinator, FetchResult, FetchedSegment, DEFAULT_CONCURRENCY};
pub use observer::{DownloadEvent, DownloadObserver, NullObserver, TracingObserver};
pub use pipeline::{DownloadOptions, DownloadPipeline, PipelineState};
pub use workspace::Workspace;

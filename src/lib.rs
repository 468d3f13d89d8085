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


//! vodfetch: download Twitch VODs and clips.
//!
//! The library resolves a video or clip reference through the catalog API,
//! picks a quality rendition from the HLS master playlist, fetches the
//! segments of an optional time window concurrently, and concatenates them
//! into a single file with ffmpeg. The [`download::DownloadPipeline`] ties
//! the stages together; each stage is usable on its own.

pub mod api;
pub mod assemble;
pub mod download;
pub mod error;
pub mod naming;
pub mod playlist;
pub mod reference;

pub use assemble::Assembler;
pub use download::{DownloadOptions, DownloadPipeline, PipelineState};
pub use error::{Result, VodError};
pub use playlist::TimeWindow;
pub use reference::{parse_reference, ContentRef};

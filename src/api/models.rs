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


//! Catalog API data models
//!
//! Shapes mirror the upstream JSON: the v5 REST API for users and videos
//! (underscore-prefixed ids, snake_case fields) and the GraphQL API for
//! clips (camelCase fields). Only the fields the downloader consumes are
//! modeled; unknown fields are ignored on deserialization.

use serde::Deserialize;

/// A channel owner resolved from a login name
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    pub users: Vec<User>,
}

/// Channel info embedded in a video record
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub name: String,
    pub display_name: String,
}

/// One published VOD
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    /// Catalog id, historically prefixed with `v`
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// ISO 8601 publish timestamp
    pub published_at: String,
    /// Total length in seconds
    pub length: u64,
    pub channel: Channel,
    pub game: Option<String>,
    pub views: Option<u64>,
}

/// One page of a channel's video listing
#[derive(Debug, Deserialize)]
pub struct VideosPage {
    #[serde(rename = "_total")]
    pub total: u64,
    pub videos: Vec<Video>,
}

/// Token pair authorizing playlist access for one video
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub sig: String,
}

/// One downloadable quality of a clip
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipQuality {
    pub frame_rate: f64,
    pub quality: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcaster {
    pub login: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipGame {
    pub name: String,
}

/// A clip with its downloadable qualities, best quality first
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub title: String,
    pub duration_seconds: f64,
    pub broadcaster: Broadcaster,
    pub game: Option<ClipGame>,
    pub video_qualities: Vec<ClipQuality>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GqlResponse {
    pub data: GqlData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GqlData {
    pub clip: Option<Clip>,
}

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


//! Catalog API client and data models

pub mod client;
pub mod models;

pub use client::{TwitchClient, CLIENT_ID};
pub use models::{AccessToken, Broadcaster, Channel, Clip, ClipQuality, User, Video, VideosPage};

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


//! Parsing of user-supplied content references
//!
//! A reference is either a bare identifier or one of the well-known URL
//! shapes. Clip patterns are tried first; a bare all-letters token is a clip
//! slug, a bare all-digits token is a video id, so the two bare forms never
//! collide.

use crate::error::{Result, VodError};
use regex::Regex;
use std::sync::LazyLock;

/// A parsed pointer to one piece of downloadable content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Video { id: String },
    Clip { slug: String },
}

static CLIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(?P<slug>[A-Za-z]+)$",
        r"^https://(www\.)?twitch\.tv/\w+/clip/(?P<slug>[A-Za-z0-9_-]+)(\?.+)?$",
        r"^https://clips\.twitch\.tv/(?P<slug>[A-Za-z0-9_-]+)(\?.+)?$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex literal"))
    .collect()
});

static VIDEO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(?P<id>\d+)$",
        r"^https://(www\.)?twitch\.tv/videos/(?P<id>\d+)(\?.+)?$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex literal"))
    .collect()
});

/// Parse a user-supplied video/clip reference
pub fn parse_reference(input: &str) -> Result<ContentRef> {
    let input = input.trim();

    for pattern in CLIP_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(input) {
            return Ok(ContentRef::Clip {
                slug: captures["slug"].to_string(),
            });
        }
    }

    for pattern in VIDEO_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(input) {
            return Ok(ContentRef::Video {
                id: captures["id"].to_string(),
            });
        }
    }

    Err(VodError::invalid_input(format!(
        "not a recognized video or clip reference: {input}"
    )))
}

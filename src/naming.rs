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


//! Output filename derivation for videos and clips

use crate::error::{Result, VodError};
use regex::Regex;
use std::sync::LazyLock;

static PUBLISHED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T").expect("valid regex literal")
});

/// Target filename for a video: `<YYYYMMDD>_<id>.<format>`.
///
/// `published_at` is the catalog's ISO 8601 timestamp; `id` keeps legacy
/// `v`-prefixed identifiers working by stripping the prefix.
pub fn video_target_filename(id: &str, published_at: &str, format: &str) -> Result<String> {
    let captures = PUBLISHED_DATE.captures(published_at).ok_or_else(|| {
        VodError::InvalidApiResponse(format!("unparseable publish date: {published_at}"))
    })?;

    let date = format!("{}{}{}", &captures[1], &captures[2], &captures[3]);
    let id = id.strip_prefix('v').unwrap_or(id);

    Ok(format!("{date}_{id}.{format}"))
}

/// Target filename for a clip: `<broadcaster login>_<slugified title><ext>`.
/// `extension` includes its leading dot, taken from the source URL's path.
pub fn clip_target_filename(login: &str, title: &str, extension: &str) -> String {
    format!("{}_{}{}", login, slugify(title), extension)
}

/// Lowercase, with every run of non-alphanumeric characters collapsed to a
/// single underscore
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_was_separator = true;

    for c in value.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }

    slug.trim_end_matches('_').to_string()
}

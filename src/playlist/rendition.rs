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


//! Rendition selection strategies
//!
//! Picking one quality variant out of the master playlist is a policy, not
//! an algorithm, so it lives behind a trait. The default trusts the source
//! ordering (Twitch lists source quality first); `HighestResolution` is for
//! manifests where that convention does not hold. Callers may substitute
//! interactive or rule-based strategies of their own.

use crate::error::{Result, VodError};
use crate::playlist::Rendition;

/// Strategy for choosing exactly one rendition from a master playlist
pub trait RenditionStrategy: Send + Sync {
    /// Pick one rendition. Fails with `NoRenditionsAvailable` when the
    /// list is empty; selection itself has no side effects.
    fn select<'a>(&self, renditions: &'a [Rendition]) -> Result<&'a Rendition>;
}

/// Default policy: the first-listed rendition, i.e. the highest priority
/// as declared by the source ordering
#[derive(Debug, Default)]
pub struct FirstListed;

impl RenditionStrategy for FirstListed {
    fn select<'a>(&self, renditions: &'a [Rendition]) -> Result<&'a Rendition> {
        renditions.first().ok_or(VodError::NoRenditionsAvailable)
    }
}

/// Rule-based policy: the largest advertised resolution by pixel area.
/// Renditions without a resolution rank lowest; ties keep source order.
#[derive(Debug, Default)]
pub struct HighestResolution;

impl RenditionStrategy for HighestResolution {
    fn select<'a>(&self, renditions: &'a [Rendition]) -> Result<&'a Rendition> {
        if renditions.is_empty() {
            return Err(VodError::NoRenditionsAvailable);
        }

        let best = renditions
            .iter()
            .enumerate()
            // max_by_key keeps the *last* maximum; invert the index so ties
            // resolve to the first-listed entry.
            .max_by_key(|(idx, r)| {
                let area = r.resolution.map(|(w, h)| w * h).unwrap_or(0);
                (area, usize::MAX - idx)
            })
            .map(|(_, r)| r)
            .ok_or(VodError::NoRenditionsAvailable)?;

        Ok(best)
    }
}

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


//! HLS playlist decoding and selection
//!
//! A master playlist lists alternate-quality renditions, each pointing at a
//! media playlist; a media playlist lists the time-ordered segments of one
//! rendition. Decoding is delegated to m3u8-rs; this module reduces the
//! parsed playlists to the two shapes the download pipeline works with.
//!
//! Segment order is authoritative: it is the playback and concat order, and
//! nothing downstream may reorder it.

pub mod rendition;
pub mod segment;

pub use rendition::{FirstListed, HighestResolution, RenditionStrategy};
pub use segment::{select_segments, TimeWindow};

use crate::error::{Result, VodError};
use m3u8_rs::Playlist;

/// One quality variant of the content, with its own media playlist
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    /// Human-readable quality label (e.g. "720p60"), from the
    /// EXT-X-MEDIA entry when present
    pub label: String,

    /// Advertised resolution as (width, height), if any
    pub resolution: Option<(u64, u64)>,

    /// Absolute URI of the rendition's media playlist
    pub uri: String,
}

/// One fixed-order chunk of the stream
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Playback duration in seconds
    pub duration: f64,

    /// Segment locator, usually relative to the media playlist location
    pub uri: String,
}

/// Decode a master playlist into its renditions, in source order.
///
/// The source ordering is preserved because it is the selection priority
/// used by the default rendition strategy.
pub fn parse_master(text: &str) -> Result<Vec<Rendition>> {
    let playlist = m3u8_rs::parse_playlist_res(text.as_bytes())
        .map_err(|e| VodError::ManifestParse(e.to_string()))?;

    let master = match playlist {
        Playlist::MasterPlaylist(pl) => pl,
        Playlist::MediaPlaylist(_) => {
            return Err(VodError::ManifestParse(
                "expected a master playlist, got a media playlist".to_string(),
            ));
        }
    };

    let renditions = master
        .variants
        .iter()
        .filter(|v| !v.is_i_frame)
        .map(|variant| {
            // The quality name lives on the EXT-X-MEDIA entry linked via the
            // VIDEO group id; fall back to the advertised resolution.
            let label = master
                .alternatives
                .iter()
                .find(|alt| variant.video.as_deref() == Some(alt.group_id.as_str()))
                .map(|alt| alt.name.clone())
                .or_else(|| {
                    variant
                        .resolution
                        .map(|r| format!("{}x{}", r.width, r.height))
                })
                .unwrap_or_default();

            Rendition {
                label,
                resolution: variant.resolution.map(|r| (r.width, r.height)),
                uri: variant.uri.clone(),
            }
        })
        .collect();

    Ok(renditions)
}

/// Decode a media playlist into its ordered segment list.
pub fn parse_media(text: &str) -> Result<Vec<Segment>> {
    let playlist = m3u8_rs::parse_playlist_res(text.as_bytes())
        .map_err(|e| VodError::ManifestParse(e.to_string()))?;

    let media = match playlist {
        Playlist::MediaPlaylist(pl) => pl,
        Playlist::MasterPlaylist(_) => {
            return Err(VodError::ManifestParse(
                "expected a media playlist, got a master playlist".to_string(),
            ));
        }
    };

    Ok(media
        .segments
        .iter()
        .map(|s| Segment {
            duration: f64::from(s.duration),
            uri: s.uri.clone(),
        })
        .collect())
}

/// Total playback duration of a segment sequence, in seconds
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID=\"chunked\",NAME=\"1080p60 (source)\",AUTOSELECT=YES,DEFAULT=YES\n\
#EXT-X-STREAM-INF:BANDWIDTH=6000000,RESOLUTION=1920x1080,VIDEO=\"chunked\"\n\
https://vod.example.com/abc/chunked/index-dvr.m3u8\n\
#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID=\"720p60\",NAME=\"720p60\",AUTOSELECT=YES,DEFAULT=YES\n\
#EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720,VIDEO=\"720p60\"\n\
https://vod.example.com/abc/720p60/index-dvr.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXTINF:10.000,\n\
0.ts\n\
#EXTINF:10.000,\n\
1.ts\n\
#EXTINF:3.400,\n\
2.ts\n\
#EXT-X-ENDLIST\n";

    #[test]
    fn test_parse_master_renditions_in_source_order() {
        let renditions = parse_master(MASTER).unwrap();
        assert_eq!(renditions.len(), 2);
        assert_eq!(renditions[0].label, "1080p60 (source)");
        assert_eq!(renditions[0].resolution, Some((1920, 1080)));
        assert_eq!(
            renditions[0].uri,
            "https://vod.example.com/abc/chunked/index-dvr.m3u8"
        );
        assert_eq!(renditions[1].label, "720p60");
        assert_eq!(renditions[1].resolution, Some((1280, 720)));
    }

    #[test]
    fn test_parse_media_segments_in_order() {
        let segments = parse_media(MEDIA).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].uri, "0.ts");
        assert_eq!(segments[2].uri, "2.ts");
        assert!((segments[0].duration - 10.0).abs() < 1e-6);
        assert!((total_duration(&segments) - 23.4).abs() < 1e-3);
    }

    #[test]
    fn test_master_rejects_media_playlist() {
        let err = parse_master(MEDIA).unwrap_err();
        assert!(matches!(err, VodError::ManifestParse(_)));
    }

    #[test]
    fn test_media_rejects_master_playlist() {
        let err = parse_media(MASTER).unwrap_err();
        assert!(matches!(err, VodError::ManifestParse(_)));
    }

    #[test]
    fn test_garbage_input_is_a_parse_error() {
        assert!(matches!(
            parse_master("not a playlist"),
            Err(VodError::ManifestParse(_))
        ));
    }
}

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


//! HTTP client for the catalog APIs
//!
//! Wraps reqwest with the headers the APIs require and a small retry loop:
//! up to 3 attempts with exponential backoff (1s, 2s) on server faults and
//! transport errors. Client errors are never retried; a 404 is mapped to
//! `NotFound` so callers can report missing content cleanly.

use crate::api::models::{
    AccessToken, Clip, GqlResponse, User, UsersResponse, Video, VideosPage,
};
use crate::error::{Result, VodError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Public web player client id; required on every API request
pub const CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const KRAKEN_URL: &str = "https://api.twitch.tv/kraken";
const VOD_TOKEN_URL: &str = "https://api.twitch.tv/api/vods";
const USHER_URL: &str = "https://usher.ttvnw.net/vod";
const GQL_URL: &str = "https://gql.twitch.tv/gql";

/// v5 REST API content type, selected via the Accept header
const KRAKEN_ACCEPT: &str = "application/vnd.twitchtv.v5+json";

/// 1 initial attempt + 2 retries
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY_SECS: u64 = 1;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for resolving channels, videos, clips and playlist access
#[derive(Debug, Clone)]
pub struct TwitchClient {
    client: Client,
    kraken_url: String,
    vod_token_url: String,
    usher_url: String,
    gql_url: String,
}

impl TwitchClient {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(KRAKEN_URL, VOD_TOKEN_URL, USHER_URL, GQL_URL)
    }

    /// Point each endpoint family at a different base URL. Tests aim all of
    /// them at a local fixture server.
    pub fn with_base_urls(
        kraken_url: &str,
        vod_token_url: &str,
        usher_url: &str,
        gql_url: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Client-ID", HeaderValue::from_static(CLIENT_ID));
        headers.insert(ACCEPT, HeaderValue::from_static(KRAKEN_ACCEPT));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            kraken_url: kraken_url.to_string(),
            vod_token_url: vod_token_url.to_string(),
            usher_url: usher_url.to_string(),
            gql_url: gql_url.to_string(),
        })
    }

    /// The underlying HTTP client, shared with the download pipeline so
    /// connections are pooled across catalog and segment traffic
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    /// Resolve a channel login name to its user record
    pub async fn resolve_channel(&self, login: &str) -> Result<User> {
        let url = format!("{}/users?login={login}", self.kraken_url);
        let response: UsersResponse = self.get_json(&url).await?;

        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| VodError::not_found(format!("channel '{login}'")))
    }

    /// One page of a channel's archived videos
    pub async fn list_videos(
        &self,
        channel_id: &str,
        limit: u32,
        offset: u32,
        sort: &str,
    ) -> Result<VideosPage> {
        let url = format!(
            "{}/channels/{channel_id}/videos\
             ?broadcast_type=archive&limit={limit}&offset={offset}&sort={sort}",
            self.kraken_url
        );
        self.get_json(&url).await
    }

    /// Look up one video by its numeric id
    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        let url = format!("{}/videos/{video_id}", self.kraken_url);
        self.get_json(&url).await
    }

    /// Look up one clip by slug via the GraphQL API
    pub async fn get_clip(&self, slug: &str) -> Result<Clip> {
        let query = format!(
            "{{ clip(slug: \"{slug}\") {{ \
               title durationSeconds game {{ name }} \
               broadcaster {{ login displayName }} \
               videoQualities {{ frameRate quality sourceURL }} \
             }} }}"
        );
        let body = serde_json::json!({ "query": query });

        let response: GqlResponse = self
            .execute_with_retry(&self.gql_url, || self.client.post(&self.gql_url).json(&body))
            .await?;

        response
            .data
            .clip
            .ok_or_else(|| VodError::not_found(format!("clip '{slug}'")))
    }

    /// Obtain the token pair authorizing playlist access for a video
    pub async fn get_access_token(&self, video_id: &str) -> Result<AccessToken> {
        let url = format!("{}/{video_id}/access_token", self.vod_token_url);
        self.get_json(&url).await
    }

    /// Master playlist URL for a video, signed with its access token
    pub fn playlist_url(&self, video_id: &str, token: &AccessToken) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/{video_id}", self.usher_url),
            &[
                ("nauth", token.token.as_str()),
                ("nauthsig", token.sig.as_str()),
                ("allow_source", "true"),
                ("player", "twitchweb"),
            ],
        )?;
        Ok(url)
    }

    /// Fetch the master playlist text for a video
    pub async fn get_playlists(&self, video_id: &str, token: &AccessToken) -> Result<String> {
        let url = self.playlist_url(video_id, token)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VodError::not_found(format!("playlists for video {video_id}")));
        }
        if !status.is_success() {
            return Err(VodError::api_failed(
                format!("unexpected status {status}"),
                Some(status.as_u16()),
                Some(url.to_string()),
            ));
        }
        Ok(response.text().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.execute_with_retry(url, || self.client.get(url)).await
    }

    /// Send a request, retrying server faults and transport errors with
    /// exponential backoff. The builder closure is re-invoked per attempt.
    async fn execute_with_retry<T, F>(&self, endpoint: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error: Option<VodError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = INITIAL_RETRY_DELAY_SECS * 2_u64.pow(attempt - 2);
                tracing::debug!(endpoint, attempt, delay, "retrying request");
                sleep(Duration::from_secs(delay)).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_error = Some(e.into());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(VodError::not_found(endpoint.to_string()));
            }
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(VodError::api_failed(
                    format!("server error: {}", body.trim()),
                    Some(status.as_u16()),
                    Some(endpoint.to_string()),
                ));
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(VodError::api_failed(
                    format!("request failed: {}", body.trim()),
                    Some(status.as_u16()),
                    Some(endpoint.to_string()),
                ));
            }

            let text = response.text().await?;
            return serde_json::from_str(&text).map_err(|e| {
                VodError::InvalidApiResponse(format!("{endpoint}: {e}"))
            });
        }

        Err(last_error.unwrap_or_else(|| {
            VodError::api_failed(
                format!("request failed after {MAX_ATTEMPTS} attempts"),
                None,
                Some(endpoint.to_string()),
            )
        }))
    }
}

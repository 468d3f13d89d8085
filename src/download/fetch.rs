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


//! Concurrent segment fetching
//!
//! A bounded pool of workers (tokio tasks gated by a semaphore) consumes the
//! segment locator list and writes each response body into the workspace.
//! Workers complete in any order; the result is keyed by the original
//! locator sequence, so the assembler never observes completion order.
//!
//! The batch is all-or-nothing: the first failure raises a shared cancel
//! flag, no new fetches start, in-flight results are discarded, and
//! `SegmentFetchFailed` aborts the pipeline before assembly. There is no
//! automatic per-segment retry.

use crate::download::observer::{DownloadEvent, DownloadObserver};
use crate::error::{Result, VodError};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use url::Url;

/// Default number of concurrent fetch workers
pub const DEFAULT_CONCURRENCY: usize = 4;

/// One downloaded segment: its original locator and local file path
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSegment {
    pub locator: String,
    pub path: PathBuf,
}

/// Mapping from requested locators to local paths, in original order.
///
/// Total over its input set: every requested locator appears exactly once,
/// or the whole fetch failed. Partial results never escape the coordinator.
#[derive(Debug, Default)]
pub struct FetchResult {
    entries: Vec<FetchedSegment>,
}

impl FetchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FetchedSegment] {
        &self.entries
    }

    /// Local path for one locator, if it was part of the batch
    pub fn path_for(&self, locator: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.locator == locator)
            .map(|e| e.path.as_path())
    }

    /// Local paths in original locator order, ready for assembly
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.entries.into_iter().map(|e| e.path).collect()
    }
}

/// Downloads an ordered list of remote locators with bounded concurrency
pub struct FetchCoordinator {
    client: Client,
    concurrency: usize,
}

impl FetchCoordinator {
    /// Create a coordinator with `concurrency` workers (minimum 1)
    pub fn new(concurrency: usize) -> Self {
        Self::with_client(Client::new(), concurrency)
    }

    pub fn with_client(client: Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every locator (resolved against `base`) into `dest_dir`,
    /// blocking until all items succeeded or the first failure is observed.
    pub async fn fetch_all(
        &self,
        base: &Url,
        locators: &[String],
        dest_dir: &Path,
        observer: Arc<dyn DownloadObserver>,
    ) -> Result<FetchResult> {
        let total = locators.len();
        tracing::info!(total, concurrency = self.concurrency, "fetching segments");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let cancel = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(total);
        for (index, locator) in locators.iter().enumerate() {
            let url = base
                .join(locator)
                .map_err(|e| VodError::segment_failed(locator, e))?;
            let dest = dest_dir.join(segment_filename(index, locator));

            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = Arc::clone(&cancel);
            let completed = Arc::clone(&completed);
            let observer = Arc::clone(&observer);
            let locator = locator.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| VodError::Cancelled)?;

                // A failure elsewhere in the batch stops unstarted work.
                if cancel.load(Ordering::Relaxed) {
                    return Err(VodError::Cancelled);
                }

                tracing::debug!(%url, "fetching segment");
                match fetch_segment(&client, &url, &dest).await {
                    Ok(()) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        observer.on_event(&DownloadEvent::SegmentFetched {
                            completed: done,
                            total,
                        });
                        Ok(FetchedSegment { locator, path: dest })
                    }
                    Err(e) => {
                        cancel.store(true, Ordering::Relaxed);
                        Err(VodError::segment_failed(&locator, e))
                    }
                }
            }));
        }

        // Collect in original locator order. Results of tasks that were
        // cancelled by another task's failure are discarded; the first real
        // failure wins.
        let mut entries = Vec::with_capacity(total);
        let mut first_error: Option<VodError> = None;
        for (handle, locator) in handles.into_iter().zip(locators) {
            match handle.await {
                Ok(Ok(segment)) => entries.push(segment),
                Ok(Err(VodError::Cancelled)) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(join_error) => {
                    if first_error.is_none() {
                        first_error = Some(VodError::segment_failed(locator, join_error));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if entries.len() != total {
            // Only possible when every missing task saw the cancel flag
            // without any task reporting the underlying failure.
            return Err(VodError::Cancelled);
        }

        tracing::info!(total, "all segments fetched");
        Ok(FetchResult { entries })
    }
}

/// Stream one URL's response body to `dest`, failing on any non-2xx status
pub async fn fetch_to_file(client: &Client, url: &Url, dest: &Path) -> Result<()> {
    fetch_segment(client, url, dest).await
}

async fn fetch_segment(client: &Client, url: &Url, dest: &Path) -> Result<()> {
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(VodError::api_failed(
            format!("unexpected status {}", response.status()),
            Some(response.status().as_u16()),
            Some(url.to_string()),
        ));
    }

    let file = tokio::fs::File::create(dest).await?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        writer.write_all(&chunk?).await?;
    }
    writer.flush().await?;

    Ok(())
}

/// Derive a flat local filename from a segment locator. The sequence index
/// prefix keeps the mapping injective even when flattening or stripping the
/// query string would make two locators collide.
pub(crate) fn segment_filename(index: usize, locator: &str) -> String {
    let stripped = locator
        .split(['?', '#'])
        .next()
        .unwrap_or(locator)
        .trim_matches('/');

    if stripped.is_empty() {
        format!("{index:05}_segment")
    } else {
        format!("{index:05}_{}", stripped.replace('/', "-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::observer::NullObserver;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 fixture server mapping paths to (status, body)
    async fn serve(routes: HashMap<String, (u16, Vec<u8>)>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut read = 0;
                    loop {
                        match socket.read(&mut buf[read..]).await {
                            Ok(0) => return,
                            Ok(n) => read += n,
                            Err(_) => return,
                        }
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                        if read == buf.len() {
                            return;
                        }
                    }
                    let request = String::from_utf8_lossy(&buf[..read]).into_owned();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();

                    let (status, body) = routes
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, b"not found".to_vec()));
                    let reason = match status {
                        200 => "OK",
                        404 => "Not Found",
                        500 => "Internal Server Error",
                        _ => "Error",
                    };
                    let header = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let mut response = header.into_bytes();
                    response.extend_from_slice(&body);
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        addr
    }

    fn segment_routes(count: usize) -> HashMap<String, (u16, Vec<u8>)> {
        (0..count)
            .map(|i| {
                (
                    format!("/vod/{i}.ts"),
                    (200, format!("segment-{i}-payload").into_bytes()),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_all_is_total_and_ordered() {
        let addr = serve(segment_routes(8)).await;
        let base = Url::parse(&format!("http://{addr}/vod/")).unwrap();
        let locators: Vec<String> = (0..8).map(|i| format!("{i}.ts")).collect();

        let dir = tempfile::tempdir().unwrap();
        let coordinator = FetchCoordinator::new(3);
        let result = coordinator
            .fetch_all(&base, &locators, dir.path(), Arc::new(NullObserver))
            .await
            .unwrap();

        assert_eq!(result.len(), locators.len());
        for (entry, locator) in result.entries().iter().zip(&locators) {
            assert_eq!(&entry.locator, locator);
            let body = tokio::fs::read(&entry.path).await.unwrap();
            let index = locator.trim_end_matches(".ts");
            assert_eq!(body, format!("segment-{index}-payload").into_bytes());
        }
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_bytes() {
        let addr = serve(segment_routes(6)).await;
        let base = Url::parse(&format!("http://{addr}/vod/")).unwrap();
        let locators: Vec<String> = (0..6).map(|i| format!("{i}.ts")).collect();

        let mut concatenations = Vec::new();
        for concurrency in [1, 5] {
            let dir = tempfile::tempdir().unwrap();
            let result = FetchCoordinator::new(concurrency)
                .fetch_all(&base, &locators, dir.path(), Arc::new(NullObserver))
                .await
                .unwrap();

            let mut joined = Vec::new();
            for path in result.into_paths() {
                joined.extend(tokio::fs::read(&path).await.unwrap());
            }
            concatenations.push(joined);
        }

        assert_eq!(concatenations[0], concatenations[1]);
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_batch() {
        let mut routes = segment_routes(6);
        routes.insert("/vod/3.ts".to_string(), (500, b"boom".to_vec()));
        let addr = serve(routes).await;
        let base = Url::parse(&format!("http://{addr}/vod/")).unwrap();
        let locators: Vec<String> = (0..6).map(|i| format!("{i}.ts")).collect();

        let dir = tempfile::tempdir().unwrap();
        let err = FetchCoordinator::new(2)
            .fetch_all(&base, &locators, dir.path(), Arc::new(NullObserver))
            .await
            .unwrap_err();

        match err {
            VodError::SegmentFetchFailed { locator, cause } => {
                assert_eq!(locator, "3.ts");
                assert!(cause.contains("500"), "cause was: {cause}");
            }
            other => panic!("expected SegmentFetchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_segment_is_fatal() {
        // 4.ts has no route, so the fixture answers 404.
        let addr = serve(segment_routes(4)).await;
        let base = Url::parse(&format!("http://{addr}/vod/")).unwrap();
        let locators: Vec<String> = (0..5).map(|i| format!("{i}.ts")).collect();

        let dir = tempfile::tempdir().unwrap();
        let err = FetchCoordinator::new(4)
            .fetch_all(&base, &locators, dir.path(), Arc::new(NullObserver))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VodError::SegmentFetchFailed { ref locator, .. } if locator == "4.ts"
        ));
    }

    #[tokio::test]
    async fn test_colliding_locators_get_distinct_files() {
        // Both locators flatten to "a-0.ts"; the index prefix must keep
        // them apart.
        let mut routes = HashMap::new();
        routes.insert("/vod/a/0.ts".to_string(), (200, b"nested".to_vec()));
        routes.insert("/vod/a-0.ts".to_string(), (200, b"flat".to_vec()));
        let addr = serve(routes).await;
        let base = Url::parse(&format!("http://{addr}/vod/")).unwrap();
        let locators = vec!["a/0.ts".to_string(), "a-0.ts".to_string()];

        let dir = tempfile::tempdir().unwrap();
        let result = FetchCoordinator::new(2)
            .fetch_all(&base, &locators, dir.path(), Arc::new(NullObserver))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_ne!(result.entries()[0].path, result.entries()[1].path);
        assert_eq!(
            tokio::fs::read(&result.entries()[0].path).await.unwrap(),
            b"nested"
        );
        assert_eq!(
            tokio::fs::read(&result.entries()[1].path).await.unwrap(),
            b"flat"
        );
    }

    #[test]
    fn test_segment_filename_derivation() {
        assert_eq!(segment_filename(0, "3.ts"), "00000_3.ts");
        assert_eq!(segment_filename(1, "chunked/3.ts"), "00001_chunked-3.ts");
        assert_eq!(segment_filename(2, "3.ts?sig=abc"), "00002_3.ts");
        assert_eq!(segment_filename(3, ""), "00003_segment");
        // Flattening alone is not injective; the index prefix is.
        assert_ne!(segment_filename(4, "a/0.ts"), segment_filename(5, "a-0.ts"));
    }
}

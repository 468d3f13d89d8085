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


//! Scoped temporary workspace for one download attempt
//!
//! The workspace owns every locally-written intermediate file of a download:
//! partial segments, debug playlist copies, the concat manifest. Its path is
//! a deterministic function of the source base URI's path component under
//! the platform temp root, so re-running the same VOD reuses the directory.
//! Release removes the tree recursively unless the caller asked to retain it
//! for diagnostics.

use crate::error::{Result, VodError};
use std::path::{Path, PathBuf};
use url::Url;

/// Namespace directory under the platform temp root
const TEMP_NAMESPACE: &str = "vodfetch";

/// A uniquely-named directory owning one download's intermediate files
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create (idempotently, mkdir-with-parents semantics) the workspace
    /// directory derived from the base URI's path component.
    ///
    /// Re-acquisition of the same derived path is not an error; creation
    /// failure is fatal (`WorkspaceUnavailable`).
    pub async fn acquire(base_uri: &Url) -> Result<Self> {
        let root = Self::derive_path(base_uri);

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| VodError::workspace_unavailable(&root, &e))?;

        tracing::debug!(path = %root.display(), "workspace acquired");
        Ok(Self { root })
    }

    /// Deterministic workspace path for a base URI
    fn derive_path(base_uri: &Url) -> PathBuf {
        let key = base_uri.path().trim_matches('/');
        std::env::temp_dir().join(TEMP_NAMESPACE).join(key)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Remove the workspace tree, or leave it intact when `retain` is set.
    ///
    /// Returns the retained path, if any. Deletion failure is reported but
    /// never rolls back a completed download: cleanup is best-effort.
    pub async fn release(self, retain: bool) -> Option<PathBuf> {
        if retain {
            tracing::info!(path = %self.root.display(), "workspace retained");
            return Some(self.root);
        }

        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            tracing::warn!(
                path = %self.root.display(),
                error = %e,
                "failed to remove workspace"
            );
        } else {
            tracing::debug!(path = %self.root.display(), "workspace removed");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_base(tag: &str) -> Url {
        Url::parse(&format!(
            "https://vod.example.com/ws-test-{}-{}/chunked/",
            tag,
            std::process::id()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_acquire_creates_directory_with_parents() {
        let base = unique_base("create");
        let ws = Workspace::acquire(&base).await.unwrap();
        assert!(ws.path().is_dir());
        ws.release(false).await;
    }

    #[tokio::test]
    async fn test_acquire_is_idempotent() {
        let base = unique_base("idempotent");
        let first = Workspace::acquire(&base).await.unwrap();
        let first_path = first.path().to_path_buf();

        // Same base URI must yield the same path without error.
        let second = Workspace::acquire(&base).await.unwrap();
        assert_eq!(second.path(), first_path.as_path());

        second.release(false).await;
    }

    #[tokio::test]
    async fn test_path_is_derived_from_uri_path() {
        let base = unique_base("derived");
        let ws = Workspace::acquire(&base).await.unwrap();
        let path = ws.path().to_string_lossy().into_owned();
        assert!(path.contains(TEMP_NAMESPACE));
        assert!(path.contains("chunked"));
        ws.release(false).await;
    }

    #[tokio::test]
    async fn test_release_removes_tree() {
        let base = unique_base("release");
        let ws = Workspace::acquire(&base).await.unwrap();
        let path = ws.path().to_path_buf();
        tokio::fs::write(path.join("0.ts"), b"data").await.unwrap();

        let retained = ws.release(false).await;
        assert!(retained.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_with_retain_keeps_tree() {
        let base = unique_base("retain");
        let ws = Workspace::acquire(&base).await.unwrap();
        let path = ws.path().to_path_buf();
        tokio::fs::write(path.join("0.ts"), b"data").await.unwrap();

        let retained = ws.release(true).await;
        assert_eq!(retained.as_deref(), Some(path.as_path()));
        assert!(path.join("0.ts").exists());

        tokio::fs::remove_dir_all(&path).await.unwrap();
    }
}

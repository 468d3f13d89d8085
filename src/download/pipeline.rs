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


//! End-to-end download pipeline
//!
//! Orchestrates one download from a master playlist URL to a finished
//! artifact: rendition selection, media playlist fetch, segment selection,
//! concurrent segment fetch, assembly, cleanup. Stages run strictly in that
//! order and any stage failure aborts the run.
//!
//! The workspace is removed at the end of a run, successful or not, unless
//! retention was requested; cleanup is best-effort and never masks the
//! run's own outcome.

use crate::assemble::Assembler;
use crate::download::fetch::{FetchCoordinator, DEFAULT_CONCURRENCY};
use crate::download::observer::{DownloadEvent, DownloadObserver, NullObserver};
use crate::download::workspace::Workspace;
use crate::error::{Result, VodError};
use crate::playlist::{
    self, parse_master, parse_media, select_segments, FirstListed, RenditionStrategy, TimeWindow,
};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Names of the playlist copies kept in the workspace for diagnostics
const MASTER_COPY: &str = "playlists.m3u8";
const MEDIA_COPY: &str = "playlist.m3u8";

/// Current stage of a [`DownloadPipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SelectingRendition,
    FetchingManifest,
    SelectingSegments,
    FetchingSegments,
    Assembling,
    CleaningUp,
    Completed,
    Failed,
}

/// Per-run knobs for the pipeline
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Optional trim window over the source timeline
    pub window: TimeWindow,

    /// Output container extension passed to the concat tool via the target
    /// filename, e.g. "mkv" or "mp4"
    pub format: String,

    /// Keep the workspace after a successful run
    pub keep_workspace: bool,

    /// Number of concurrent segment fetch workers
    pub concurrency: usize,

    /// Directory receiving the final artifact
    pub output_dir: PathBuf,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            window: TimeWindow::unbounded(),
            format: "mp4".to_string(),
            keep_workspace: false,
            concurrency: DEFAULT_CONCURRENCY,
            output_dir: PathBuf::from("."),
        }
    }
}

/// One-shot download orchestrator. Construct, optionally swap in a custom
/// strategy or observer, then [`run`](Self::run) once.
pub struct DownloadPipeline {
    client: Client,
    strategy: Box<dyn RenditionStrategy>,
    observer: Arc<dyn DownloadObserver>,
    assembler: Assembler,
    options: DownloadOptions,
    state: PipelineState,
}

impl DownloadPipeline {
    pub fn new(options: DownloadOptions) -> Self {
        Self {
            client: Client::new(),
            strategy: Box::new(FirstListed),
            observer: Arc::new(NullObserver),
            assembler: Assembler::new(),
            options,
            state: PipelineState::Idle,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_strategy(mut self, strategy: Box<dyn RenditionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DownloadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the whole pipeline for one master playlist URL, producing
    /// `<output_dir>/<target_name>` on success.
    pub async fn run(&mut self, master_url: &Url, target_name: &str) -> Result<PathBuf> {
        let result = self.execute(master_url, target_name).await;
        self.state = match result {
            Ok(_) => PipelineState::Completed,
            Err(_) => PipelineState::Failed,
        };
        result
    }

    async fn execute(&mut self, master_url: &Url, target_name: &str) -> Result<PathBuf> {
        // Window sanity is checked before any network traffic.
        self.options.window.validate()?;

        self.state = PipelineState::SelectingRendition;
        let master_text = self.fetch_text(master_url).await?;
        let renditions = parse_master(&master_text)?;
        let rendition = self.strategy.select(&renditions)?.clone();
        self.observer.on_event(&DownloadEvent::RenditionSelected {
            label: rendition.label.clone(),
            uri: rendition.uri.clone(),
        });

        self.state = PipelineState::FetchingManifest;
        let rendition_url = master_url.join(&rendition.uri)?;
        let media_text = self.fetch_text(&rendition_url).await?;
        let segments = parse_media(&media_text)?;
        self.observer.on_event(&DownloadEvent::ManifestFetched {
            segment_count: segments.len(),
            total_duration: playlist::total_duration(&segments),
        });

        // Segment locators are relative to the media playlist's directory.
        let base = rendition_url.join(".")?;
        let workspace = Workspace::acquire(&base).await?;

        let outcome = self
            .fetch_and_assemble(&workspace, &base, &master_text, &media_text, &segments, target_name)
            .await;

        // Cleanup runs on success and failure alike; retention is the only
        // way to keep the tree around.
        self.state = PipelineState::CleaningUp;
        if let Some(path) = workspace.release(self.options.keep_workspace).await {
            self.observer
                .on_event(&DownloadEvent::WorkspaceRetained { path });
        }

        outcome
    }

    async fn fetch_and_assemble(
        &mut self,
        workspace: &Workspace,
        base: &Url,
        master_text: &str,
        media_text: &str,
        segments: &[playlist::Segment],
        target_name: &str,
    ) -> Result<PathBuf> {
        tokio::fs::write(workspace.path().join(MASTER_COPY), master_text).await?;
        tokio::fs::write(workspace.path().join(MEDIA_COPY), media_text).await?;

        self.state = PipelineState::SelectingSegments;
        let locators = select_segments(segments, self.options.window);
        self.observer.on_event(&DownloadEvent::SegmentsSelected {
            selected: locators.len(),
            total: segments.len(),
        });
        if locators.is_empty() {
            return Err(VodError::AssemblyFailed(
                "time window selected no segments".to_string(),
            ));
        }

        self.state = PipelineState::FetchingSegments;
        let coordinator =
            FetchCoordinator::with_client(self.client.clone(), self.options.concurrency);
        let fetched = coordinator
            .fetch_all(base, &locators, workspace.path(), Arc::clone(&self.observer))
            .await?;

        self.state = PipelineState::Assembling;
        tokio::fs::create_dir_all(&self.options.output_dir).await?;
        let target = self.options.output_dir.join(target_name);
        self.observer.on_event(&DownloadEvent::AssemblyStarted {
            target: target.clone(),
        });
        self.assembler
            .assemble(&fetched.into_paths(), workspace.path(), &target)
            .await?;
        self.observer.on_event(&DownloadEvent::AssemblyCompleted {
            target: target.clone(),
        });

        Ok(target)
    }

    async fn fetch_text(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(VodError::api_failed(
                format!("unexpected status {}", response.status()),
                Some(response.status().as_u16()),
                Some(url.to_string()),
            ));
        }
        Ok(response.text().await?)
    }
}

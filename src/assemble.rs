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


//! Final artifact assembly via an external concat tool
//!
//! Fetched segments are concatenated into the output container by ffmpeg's
//! concat demuxer. The assembler writes a manifest file in the workspace
//! listing the segment basenames in playback order, then invokes the tool
//! with the workspace as working directory. Source segments are never
//! modified or deleted here; the workspace owns their lifetime.

use crate::error::{Result, VodError};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Concat manifest filename inside the workspace
const MANIFEST_NAME: &str = "files.txt";

/// Runs the external concatenation tool over an ordered segment list
pub struct Assembler {
    program: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Use a different executable, e.g. a wrapper script or a full path
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Concatenate `sources` (in the given order) into `target`.
    ///
    /// All sources must live inside `workspace`. A non-zero exit status is
    /// `AssemblyFailed` and removes any partial target; a missing executable
    /// is `FfmpegNotFound`.
    pub async fn assemble(
        &self,
        sources: &[PathBuf],
        workspace: &Path,
        target: &Path,
    ) -> Result<()> {
        if sources.is_empty() {
            return Err(VodError::AssemblyFailed(
                "no segments selected, nothing to assemble".to_string(),
            ));
        }

        let manifest = workspace.join(MANIFEST_NAME);
        tokio::fs::write(&manifest, manifest_text(sources)?).await?;

        // The tool runs with the workspace as cwd so the manifest can use
        // bare basenames; the target must stay valid from there.
        let target = absolute(target)?;

        tracing::info!(
            program = %self.program,
            sources = sources.len(),
            target = %target.display(),
            "assembling"
        );

        let output = Command::new(&self.program)
            .current_dir(workspace)
            .arg("-f")
            .arg("concat")
            .arg("-i")
            .arg(MANIFEST_NAME)
            .arg("-c")
            .arg("copy")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    VodError::FfmpegNotFound
                } else {
                    VodError::IoError(e)
                }
            })?;

        if !output.status.success() {
            // Never leave a truncated artifact behind.
            let _ = tokio::fs::remove_file(&target).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VodError::AssemblyFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Concat demuxer manifest: one `file <basename>` line per source, in order
fn manifest_text(sources: &[PathBuf]) -> Result<String> {
    let mut text = String::new();
    for source in sources {
        let basename = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                VodError::AssemblyFailed(format!(
                    "segment path has no usable filename: {}",
                    source.display()
                ))
            })?;
        text.push_str("file ");
        text.push_str(basename);
        text.push('\n');
    }
    Ok(text)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

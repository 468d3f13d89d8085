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


use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use vodfetch::api::TwitchClient;
use vodfetch::download::{fetch_to_file, TracingObserver, DEFAULT_CONCURRENCY};
use vodfetch::{naming, parse_reference, ContentRef, DownloadOptions, DownloadPipeline, TimeWindow};

#[derive(Parser)]
#[command(name = "vodfetch")]
#[command(about = "Download Twitch VODs and clips", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a channel's archived videos
    Videos {
        /// Channel login name
        channel: String,
        /// Number of videos to fetch
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        /// Listing offset for pagination
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
        /// Sort order: time or views
        #[arg(short, long, default_value = "time")]
        sort: String,
    },
    /// Download a video or clip by id, slug or URL
    Download {
        /// Video id, clip slug, or a twitch.tv URL
        reference: String,
        /// Number of concurrent segment downloads
        #[arg(short = 'w', long, default_value_t = DEFAULT_CONCURRENCY)]
        max_workers: usize,
        /// Output container format
        #[arg(short, long, default_value = "mp4")]
        format: String,
        /// Download from this offset, in seconds
        #[arg(short, long)]
        start: Option<f64>,
        /// Download up to this offset, in seconds
        #[arg(short, long)]
        end: Option<f64>,
        /// Keep temporary segment files after a successful download
        #[arg(short, long)]
        keep: bool,
        /// Directory to place the finished file in
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Videos {
            channel,
            limit,
            offset,
            sort,
        } => list_videos(&channel, limit, offset, &sort).await,
        Commands::Download {
            reference,
            max_workers,
            format,
            start,
            end,
            keep,
            output_dir,
        } => {
            let options = DownloadOptions {
                window: TimeWindow::new(start, end),
                format,
                keep_workspace: keep,
                concurrency: max_workers,
                output_dir,
            };
            download(&reference, options).await
        }
    }
}

async fn list_videos(channel: &str, limit: u32, offset: u32, sort: &str) -> anyhow::Result<()> {
    let client = TwitchClient::new()?;

    let user = client.resolve_channel(channel).await?;
    let page = client.list_videos(&user.id, limit, offset, sort).await?;

    if page.videos.is_empty() {
        println!("No videos found for {}", user.display_name);
        return Ok(());
    }

    println!(
        "Showing {}-{} of {} videos for {}\n",
        offset + 1,
        offset + page.videos.len() as u32,
        page.total,
        user.display_name
    );

    for video in &page.videos {
        let id = video.id.strip_prefix('v').unwrap_or(&video.id);
        println!("{}  {}", id, video.title);
        println!(
            "    published {}  length {}  {}",
            format_published(&video.published_at),
            format_duration(video.length),
            video.game.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

async fn download(reference: &str, options: DownloadOptions) -> anyhow::Result<()> {
    match parse_reference(reference)? {
        ContentRef::Video { id } => download_video(&id, options).await,
        ContentRef::Clip { slug } => download_clip(&slug, &options.output_dir).await,
    }
}

async fn download_video(video_id: &str, options: DownloadOptions) -> anyhow::Result<()> {
    let client = TwitchClient::new()?;

    let video = client.get_video(video_id).await?;
    println!("Found: {} by {}", video.title, video.channel.display_name);

    let token = client.get_access_token(video_id).await?;
    let master_url = client.playlist_url(video_id, &token)?;

    let target_name =
        naming::video_target_filename(&video.id, &video.published_at, &options.format)?;

    let mut pipeline = DownloadPipeline::new(options)
        .with_client(client.http_client())
        .with_observer(Arc::new(TracingObserver));

    let target = pipeline.run(&master_url, &target_name).await?;
    println!("Downloaded: {}", target.display());

    Ok(())
}

async fn download_clip(slug: &str, output_dir: &std::path::Path) -> anyhow::Result<()> {
    let client = TwitchClient::new()?;

    let clip = client.get_clip(slug).await?;
    println!(
        "Found: {} by {} ({})",
        clip.title,
        clip.broadcaster.display_name,
        format_duration(clip.duration_seconds.round() as u64),
    );

    // Qualities are listed best first.
    let quality = clip
        .video_qualities
        .first()
        .context("clip has no downloadable qualities")?;
    let url = Url::parse(&quality.source_url)?;

    let extension = std::path::Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let filename =
        naming::clip_target_filename(&clip.broadcaster.login, &clip.title, &extension);

    tokio::fs::create_dir_all(output_dir).await?;
    let target = output_dir.join(filename);

    println!("Downloading {} quality...", quality.quality);
    fetch_to_file(&client.http_client(), &url, &target).await?;
    println!("Downloaded: {}", target.display());

    Ok(())
}

fn format_published(published_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(published_at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| published_at.to_string())
}

fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

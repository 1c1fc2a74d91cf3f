//! Command-line interface for songbook.
//!
//! Provides commands for adding, updating, removing and searching songs,
//! listing tags, and managing audio references. Every command builds the
//! catalog manager from the resolved configuration, loads it, runs the
//! operation, and prints plain text.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::{GitHubStore, RemoteStore};
use crate::catalog::{
    youtube_video_id, AudioReference, CatalogManager, SongDraft, SongPatch, SortOrder,
};
use crate::config;
use crate::storage::LocalStore;

/// songbook - Song lyrics catalog with remote and local persistence
#[derive(Parser, Debug)]
#[command(name = "songbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a song to the catalog
    Add {
        /// Song name
        name: String,

        /// Composer or author
        #[arg(short, long, default_value = "")]
        composer: String,

        /// Lyrics file (reads from stdin if not provided)
        #[arg(short, long)]
        lyrics: Option<PathBuf>,

        /// Tags to apply (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// Demo text (a fixed placeholder if not specified)
        #[arg(long)]
        demo_text: Option<String>,

        /// Audio link (classified as youtube or generic url)
        #[arg(long)]
        audio_url: Option<String>,

        /// Audio file to attach (wins over --audio-url)
        #[arg(long)]
        audio_file: Option<PathBuf>,
    },

    /// List songs in the catalog
    List {
        /// Maximum number of songs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show details of a song
    Show {
        /// Song id
        id: String,

        /// Show full lyrics
        #[arg(short, long)]
        full: bool,
    },

    /// Update fields of an existing song
    Update {
        /// Song id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New composer
        #[arg(long)]
        composer: Option<String>,

        /// Lyrics file
        #[arg(short, long)]
        lyrics: Option<PathBuf>,

        /// New tags (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// New demo text
        #[arg(long)]
        demo_text: Option<String>,

        /// New audio link
        #[arg(long)]
        audio_url: Option<String>,

        /// New audio file (wins over --audio-url)
        #[arg(long)]
        audio_file: Option<PathBuf>,
    },

    /// Remove a song and its audio reference
    Remove {
        /// Song id
        id: String,
    },

    /// Search the catalog
    Search {
        /// Search query (matches name, composer, lyrics and tags)
        #[arg(default_value = "")]
        query: String,

        /// Keep only songs matching at least one of these tags
        /// (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// Sort order by name
        #[arg(short, long, value_enum, default_value_t = SortArg::Az)]
        sort: SortArg,
    },

    /// List all tags across the catalog
    Tags,

    /// Show or replace a song's audio reference
    Audio {
        /// Song id
        id: String,

        /// New audio link
        #[arg(long)]
        url: Option<String>,

        /// New audio file (wins over --url)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Sort order for CLI search (maps to SortOrder)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// A to Z
    Az,

    /// Z to A
    Za,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Az => SortOrder::Ascending,
            SortArg::Za => SortOrder::Descending,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Add {
                name,
                composer,
                lyrics,
                tags,
                demo_text,
                audio_url,
                audio_file,
            } => add_song(name, composer, lyrics, tags, demo_text, audio_url, audio_file).await,
            Commands::List { limit } => list_songs(limit).await,
            Commands::Show { id, full } => show_song(&id, full).await,
            Commands::Update {
                id,
                name,
                composer,
                lyrics,
                tags,
                demo_text,
                audio_url,
                audio_file,
            } => update_song(&id, name, composer, lyrics, tags, demo_text, audio_url, audio_file)
                .await,
            Commands::Remove { id } => remove_song(&id).await,
            Commands::Search { query, tags, sort } => search_songs(&query, tags, sort).await,
            Commands::Tags => list_tags().await,
            Commands::Audio { id, url, file } => manage_audio(&id, url, file).await,
            Commands::Config => show_config(),
        }
    }
}

/// Build and load the catalog manager from the resolved configuration
async fn open_catalog() -> Result<CatalogManager> {
    let config = config::config()?;

    let local = LocalStore::new(config.home.clone());
    let remote: Option<Box<dyn RemoteStore>> = config.remote.clone().map(|remote_config| {
        Box::new(GitHubStore::new(remote_config).with_token_file(config.token_file.clone()))
            as Box<dyn RemoteStore>
    });

    let mut manager = CatalogManager::new(remote, local);
    manager.load().await;
    Ok(manager)
}

/// Read lyrics from a file, or from stdin when no file is given
fn read_lyrics(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read lyrics file: {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read lyrics from stdin")?;
            Ok(buffer)
        }
    }
}

/// Read an audio file into the opaque payload form (base64)
fn read_audio_payload(path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
            Ok(Some(BASE64.encode(bytes)))
        }
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
async fn add_song(
    name: String,
    composer: String,
    lyrics: Option<PathBuf>,
    tags: Option<String>,
    demo_text: Option<String>,
    audio_url: Option<String>,
    audio_file: Option<PathBuf>,
) -> Result<()> {
    let lyrics = read_lyrics(lyrics)?;
    let audio_payload = read_audio_payload(audio_file)?;

    let mut draft = SongDraft::new(name, composer, lyrics);
    if let Some(tags) = tags {
        draft = draft.with_tags(tags.as_str());
    }
    if let Some(demo_text) = demo_text {
        draft = draft.with_demo_text(demo_text);
    }

    let mut catalog = open_catalog().await?;
    let song = catalog.add(draft, audio_payload, audio_url).await;

    println!("Added {} ({})", song.name, song.id);
    if let Some(audio) = catalog.audio(&song.id) {
        println!("  audio: {}", describe_audio(audio));
    }
    Ok(())
}

async fn list_songs(limit: usize) -> Result<()> {
    let catalog = open_catalog().await?;

    let songs = catalog.songs();
    if songs.is_empty() {
        println!("Catalog is empty");
        return Ok(());
    }

    for song in songs.iter().take(limit) {
        println!("{}  {} - {}", song.id, song.name, song.composer);
    }
    if songs.len() > limit {
        println!("... and {} more", songs.len() - limit);
    }
    Ok(())
}

async fn show_song(id: &str, full: bool) -> Result<()> {
    let catalog = open_catalog().await?;

    let Some(view) = catalog.get(id) else {
        println!("No song with id {}", id);
        return Ok(());
    };

    println!("Name:     {}", view.song.name);
    println!("Composer: {}", view.song.composer);
    println!("Tags:     {}", view.song.tags.join(", "));
    println!("Demo:     {}", view.song.demo_text);
    match &view.audio {
        Some(audio) => println!("Audio:    {}", describe_audio(audio)),
        None => println!("Audio:    none"),
    }

    if full {
        println!("\n{}", view.song.lyrics);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn update_song(
    id: &str,
    name: Option<String>,
    composer: Option<String>,
    lyrics: Option<PathBuf>,
    tags: Option<String>,
    demo_text: Option<String>,
    audio_url: Option<String>,
    audio_file: Option<PathBuf>,
) -> Result<()> {
    let lyrics = match lyrics {
        Some(path) => Some(read_lyrics(Some(path))?),
        None => None,
    };
    let audio_payload = read_audio_payload(audio_file)?;

    let patch = SongPatch {
        id: None,
        name,
        composer,
        lyrics,
        tags: tags.map(|raw| raw.as_str().into()),
        demo_text,
    };

    let mut catalog = open_catalog().await?;
    if catalog.update(id, patch, audio_payload, audio_url).await {
        println!("Updated {}", id);
    } else {
        println!("No song with id {}", id);
    }
    Ok(())
}

async fn remove_song(id: &str) -> Result<()> {
    let mut catalog = open_catalog().await?;

    if catalog.remove(id).await {
        println!("Removed {}", id);
    } else {
        println!("No song with id {}", id);
    }
    Ok(())
}

async fn search_songs(query: &str, tags: Option<String>, sort: SortArg) -> Result<()> {
    let catalog = open_catalog().await?;

    let tag_filters: Vec<String> = tags
        .map(|raw| {
            raw.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let results = catalog.search(query, sort.into(), &tag_filters);
    if results.is_empty() {
        println!("No songs found");
        return Ok(());
    }

    for song in results {
        println!("{}  {} - {}", song.id, song.name, song.composer);
    }
    Ok(())
}

async fn list_tags() -> Result<()> {
    let catalog = open_catalog().await?;

    for tag in catalog.list_tags() {
        println!("{}", tag);
    }
    Ok(())
}

async fn manage_audio(id: &str, url: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let mut catalog = open_catalog().await?;

    if catalog.get(id).is_none() {
        println!("No song with id {}", id);
        return Ok(());
    }

    let audio_payload = read_audio_payload(file)?;
    if audio_payload.is_some() || url.is_some() {
        catalog.set_audio(id, audio_payload, url).await;
    }

    match catalog.audio(id) {
        Some(audio) => println!("{}", describe_audio(audio)),
        None => println!("No audio reference"),
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("Home:       {}", config.home.display());
    println!("Token file: {}", config.token_file.display());
    match &config.config_file {
        Some(path) => println!("Config:     {}", path.display()),
        None => println!("Config:     (defaults)"),
    }
    match &config.remote {
        Some(remote) => println!(
            "Remote:     {}/{} ({}, {})",
            remote.owner, remote.repo, remote.branch, remote.data_file
        ),
        None => println!("Remote:     none"),
    }
    Ok(())
}

/// One-line description of an audio reference
fn describe_audio(audio: &AudioReference) -> String {
    match audio {
        AudioReference::File(data) => format!("file payload ({} chars)", data.len()),
        AudioReference::Url(url) => format!("url {}", url),
        AudioReference::YouTube(url) => match youtube_video_id(url) {
            Some(video_id) => format!("youtube {} (video {})", url, video_id),
            None => format!("youtube {}", url),
        },
    }
}

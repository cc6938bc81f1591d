mod app;
mod art;
mod catalog;
mod config;
mod download;
mod input;
mod lyrics;
mod player;
mod storage;
mod tui;

use anyhow::Context;
use catalog::albums::{self, AlbumQuery, Resolution};
use catalog::models::{SearchItem, SearchScope, Track};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "encore", version, about = "Terminal music player with synced lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui,
    /// Search the catalog and print results to stdout (headless).
    Search {
        query: String,
        /// Restrict results to tracks or albums.
        #[arg(long, value_parser = ["all", "tracks", "albums"], default_value = "all")]
        scope: String,
    },
    /// Reconstruct an album's track listing and print it (headless).
    Album {
        album_title: String,
        artist: String,
    },
    /// Fetch lyrics for a track and print them as LRC (headless).
    Lyrics {
        title: String,
        artist: String,
        /// Track length in seconds, as a match hint.
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Dump raw search JSON to stdout (headless).
    SearchJson {
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            let mut app = app::App::new(cfg)?;
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Search { query, scope } => {
            let scope = match scope.as_str() {
                "tracks" => SearchScope::Tracks,
                "albums" => SearchScope::Albums,
                _ => SearchScope::All,
            };
            let catalog = catalog::CatalogClient::new()?;
            let items = catalog.search(&query, scope).await?;
            print_items(&items);
        }
        Command::Album {
            album_title,
            artist,
        } => {
            let catalog = catalog::CatalogClient::new()?;
            let query = AlbumQuery::new(&album_title, &artist);
            match albums::resolve_album_tracks(&catalog, &query, cfg.resolver.fallback_cap).await {
                Resolution::Found(tracks) => print_tracks(&tracks),
                Resolution::NotFound {
                    album_title,
                    artist,
                } => {
                    eprintln!("No tracks found for \"{album_title}\" by {artist}");
                    std::process::exit(1);
                }
            }
        }
        Command::Lyrics {
            title,
            artist,
            duration,
        } => {
            let client = lyrics::LrclibClient::new();
            match lyrics::fetch_lyrics(&client, &title, &artist, duration).await {
                Some(sheet) => print!("{}", sheet.to_lrc()),
                None => {
                    eprintln!("No lyrics found for \"{title}\" by {artist}");
                    std::process::exit(1);
                }
            }
        }
        Command::SearchJson { query } => {
            let catalog = catalog::CatalogClient::new()?;
            let v = catalog.search_raw(&query, SearchScope::All).await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
    }

    Ok(())
}

fn print_tracks(tracks: &[Track]) {
    for (i, t) in tracks.iter().enumerate() {
        println!(
            "{:02}. {} — {}  (id={})",
            i + 1,
            t.title,
            t.artist_line(),
            t.video_id
        );
    }
}

fn print_items(items: &[SearchItem]) {
    for (i, item) in items.iter().enumerate() {
        match item {
            SearchItem::Track(t) => println!(
                "{:02}. [track]    {} — {}  (id={})",
                i + 1,
                t.title,
                t.artist_line(),
                t.video_id
            ),
            SearchItem::Album(a) => println!(
                "{:02}. [album]    {} — {}{}",
                i + 1,
                a.title,
                a.artist,
                a.track_count
                    .map(|c| format!("  ({c} tracks)"))
                    .unwrap_or_default()
            ),
            SearchItem::Playlist(p) => println!(
                "{:02}. [playlist] {} — {}{}",
                i + 1,
                p.title,
                p.author,
                p.track_count
                    .map(|c| format!("  ({c} tracks)"))
                    .unwrap_or_default()
            ),
        }
    }
}

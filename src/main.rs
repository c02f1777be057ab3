use anyhow::{Result, anyhow};
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vidplay::{
    Category, DurationStyle, LoadOptions, PlayerConfig, PlayerHandle,
    catalog::BASE_MEDIA_URL,
    get_readable_duration,
    player::{Notification, SimulatedBackend, SimulatedBehavior, Subscription, ThumbnailSize},
};

#[derive(Parser, Debug)]
#[command(name = "vidplay", about = "Play a video from the catalog through a simulated engine")]
struct Cli {
    /// Catalog JSON file; the bundled catalog is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Player configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog entry to play
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Print the catalog and exit
    #[arg(long)]
    list: bool,

    /// How long to keep the session running
    #[arg(long, default_value_t = 8)]
    seconds: u64,

    /// Make the engine hang while opening
    #[arg(long)]
    fail_open: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vidplay=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => Category::load_from_file(path)?,
        None => Category::bundled()?,
    };

    if catalog.is_empty() {
        return Err(anyhow!("Catalog {} has no videos", catalog.name));
    }

    if cli.list {
        println!("{} ({} videos)", catalog.name, catalog.len());
        for (idx, video) in catalog.videos.iter().enumerate() {
            println!("{idx:>3}  {}  ({})", video.title, video.subtitle);
            println!("     {}", video.thumb_url(BASE_MEDIA_URL));
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => PlayerConfig::load_from_file(path)?,
        None => PlayerConfig::load()?,
    };

    let video = catalog
        .videos
        .get(cli.index)
        .ok_or_else(|| {
            anyhow!(
                "No catalog entry at index {} (catalog has {})",
                cli.index,
                catalog.len()
            )
        })?;
    let url = video
        .primary_source()
        .ok_or_else(|| anyhow!("{} has no playable source", video.title))?;

    let behavior = match cli.fail_open {
        true => SimulatedBehavior::StallOnOpen,
        false => SimulatedBehavior::default(),
    };
    let run_for = match cli.fail_open {
        true => config.opening_timeout() + config.watchdog_interval(),
        false => Duration::from_secs(cli.seconds),
    };

    let player = PlayerHandle::spawn(Box::new(SimulatedBackend::new(behavior)), config)?;
    let events = player.subscribe();

    info!("Playing {} from {url}", video.title);
    player.load_session(url, LoadOptions::default().with_thumbnail(ThumbnailSize::new(160, 90)))?;

    let started = Instant::now();
    let mut exercised = false;
    while started.elapsed() < run_for {
        print_next(&events, &player)?;

        // Exercise the transport once playback is underway
        if !exercised && player.current_time() >= 3 {
            exercised = true;
            player.pause()?;
            player.forward()?;
            player.play()?;
            player.backward()?;
        }
    }

    player.stop()?;
    for notification in events.drain() {
        println!("{}", describe(&notification));
    }

    Ok(())
}

fn print_next(events: &Subscription, player: &PlayerHandle) -> Result<()> {
    match events.recv_timeout(Duration::from_millis(250)) {
        Ok(notification) => println!("{}", describe(&notification)),
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => {
            warn!("player stopped publishing (state {:?})", player.state());
            return Err(anyhow!("player core went away"));
        }
    }
    Ok(())
}

fn describe(notification: &Notification) -> String {
    match notification {
        Notification::StateChanged(state) => format!("state      {state:?}"),
        Notification::TimeUpdated { current, total } => format!(
            "time       {} / {}",
            get_readable_duration(Duration::from_secs(*current), DurationStyle::Compact),
            get_readable_duration(Duration::from_secs(*total), DurationStyle::Compact),
        ),
        Notification::StartedPlaying => String::from("started    first frame"),
        Notification::ThumbnailReady(Some(thumb)) => {
            format!("thumbnail  {}x{}", thumb.width, thumb.height)
        }
        Notification::ThumbnailReady(None) => String::from("thumbnail  unavailable"),
        Notification::ConnectivityChanged(online) => format!("network    online={online}"),
    }
}

//! Binary entrypoint: runs a configured slideshow on a headless surface and
//! takes playback commands from stdin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use easy_slideshow::animation::TweenAnimator;
use easy_slideshow::config::Configuration;
use easy_slideshow::console::ConsoleCommand;
use easy_slideshow::preload::FilePreloader;
use easy_slideshow::surface::HeadlessSurface;
use easy_slideshow::{EventKind, SlideshowBuilder, SlideshowHandle, listener};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "easy-slideshow",
    version,
    about = "Cross-fading slideshow driven from the terminal"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Start paused; type `play` to begin advancing
    #[arg(long)]
    paused: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("easy_slideshow={level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        paused,
        verbose,
    } = Args::parse();
    init_tracing(verbose);

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    info!(slides = cfg.slides.len(), "loaded configuration from {}", config.display());

    let cancel = CancellationToken::new();
    let surface = HeadlessSurface::new(cfg.container.id.clone(), cfg.container.tag.clone());
    let show = SlideshowBuilder::from_config(&cfg)
        .container(surface)
        .animator(TweenAnimator::new(cfg.frame_interval))
        .preloader(FilePreloader::new(cfg.image_root.clone()))
        .resizer(|| tracing::trace!("fit slides to container"))
        .cancel_token(cancel.clone())
        .spawn()
        .context("failed to start the slideshow")?;

    show.add_slide_change_end_listener(
        &listener(|ev| {
            info!(
                index = ev.index,
                src = %ev.slide().src,
                link = ev.slide().link.as_deref().unwrap_or("-"),
                "now showing"
            );
        }),
        false,
    );
    show.add_listener(
        EventKind::SlideChangeStart,
        &listener(|ev| info!(index = ev.index, "changing slide")),
    );

    if paused {
        show.pause().await?;
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(cmd) => {
                        if let Err(err) = execute(&show, cmd, &cfg).await {
                            warn!("{err:#}");
                        }
                    }
                    Err(err) => warn!("{err:#}"),
                },
                None => {
                    info!("stdin closed; initiating shutdown");
                    break;
                }
            },
        }
    }

    show.shutdown();
    Ok(())
}

async fn execute(show: &SlideshowHandle, cmd: ConsoleCommand, cfg: &Configuration) -> Result<()> {
    match cmd {
        ConsoleCommand::Resume => show.resume().await?,
        ConsoleCommand::Pause => show.pause().await?,
        ConsoleCommand::Next => show.advance().await?,
        ConsoleCommand::Jump(index) => show.jump_to(index).await?,
        ConsoleCommand::Status => {
            let snapshot = show.snapshot();
            let slide = show.current_slide();
            let shown_for = cfg
                .default_duration
                .map(|d| slide.display_duration(d))
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_default();
            info!(
                index = snapshot.index,
                of = show.slides().len(),
                playing = snapshot.playing,
                transitioning = snapshot.transitioning,
                duration = %shown_for,
                src = %slide.src,
                "status"
            );
        }
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

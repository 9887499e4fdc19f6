//! Rite CLI
//!
//! Command-line surface for the Digital Fragments ritual. Every generator is
//! reachable on its own, and `cycle` / `auto` drive the full rite headless.
//!
//! # Usage
//!
//! ```bash
//! # Seed and composition for a prompt
//! rite seed 光
//! rite compose --prompt 光
//!
//! # Render a mandala to PNG
//! rite render --prompt 光 -o light.png
//!
//! # One full create/destroy cycle, printed as a JSON record
//! rite cycle --prompt 光 > light.json
//! rite replay light.json
//!
//! # Unattended installation mode, one JSON message per line
//! rite auto --cycles 3
//! ```
//!
//! # Environment Variables
//!
//! - `RITE_CONFIG`: Config file path (default: `$XDG_CONFIG_HOME/digital-fragments/rite.toml`)
//! - `RITE_*`: Individual settings, see `rite_core::config`
//! - `RUST_LOG`: Log level (logs go to stderr)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use rite_core::config::{load_config, load_config_from_path};
use rite_core::rite::TICK_PERIOD;
use rite_core::{
    extract_keywords, extract_palette, generate_composition, render_afterglow,
    render_composition, seed_from_text, verify_replay, AutoRite, ConfigOverrides, CycleRecord,
    MythicText, ParticleShatter, PixelBuffer, Rite, RiteConfigFile, RiteEvent, RiteMessage, Seed,
    StandardExtractor,
};

/// Digital Fragments: create, destroy, regenerate
#[derive(Debug, Parser)]
#[command(name = "rite", version, about)]
struct Cli {
    /// Config file to load instead of the default location
    #[arg(long, global = true, env = "RITE_CONFIG")]
    config: Option<PathBuf>,

    /// Countdown shown after create, in seconds
    #[arg(long, global = true)]
    countdown_secs: Option<u64>,

    /// Destruction length in milliseconds
    #[arg(long, global = true)]
    shatter_ms: Option<u64>,

    /// Square canvas size in pixels
    #[arg(long, global = true)]
    canvas_size: Option<u32>,

    /// Unattended cycle length in seconds
    #[arg(long, global = true)]
    auto_cycle_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the seed derived from a text
    Seed {
        /// Text to hash
        text: String,
    },

    /// Print a composition as JSON
    Compose {
        /// Explicit seed
        #[arg(conflicts_with = "prompt")]
        seed: Option<u32>,
        /// Derive the seed from this prompt
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Print the prose generated for a prompt
    Text {
        /// Prompt offered (may be empty)
        #[arg(default_value = "")]
        prompt: String,
    },

    /// Print the keywords found in a text
    Keywords {
        /// Text to scan
        text: String,
        /// Keywords to keep
        #[arg(long)]
        max: Option<usize>,
    },

    /// Print the dominant colors of a PNG
    Palette {
        /// Image to sample
        png: PathBuf,
        /// Colors to keep
        #[arg(long)]
        buckets: Option<usize>,
    },

    /// Render a composition to PNG
    Render {
        /// Prompt to render (empty uses the default phrase)
        #[arg(long, default_value = "")]
        prompt: String,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run one full create/destroy cycle and print the record as JSON
    Cycle {
        /// Prompt to offer
        #[arg(long, default_value = "")]
        prompt: String,
        /// Also write the afterglow of the residue to this PNG
        #[arg(long)]
        afterglow: Option<PathBuf>,
    },

    /// Check that a recorded cycle regenerates exactly
    Replay {
        /// Record written by `rite cycle`
        record: PathBuf,
    },

    /// Run unattended cycles, printing each message as a JSON line
    Auto {
        /// Cycles to run before stopping
        #[arg(long, default_value_t = 1)]
        cycles: u32,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            countdown_secs: self.countdown_secs,
            shatter_ms: self.shatter_ms,
            canvas_size: self.canvas_size,
            auto_cycle_secs: self.auto_cycle_secs,
        }
    }

    fn load_config(&self) -> anyhow::Result<RiteConfigFile> {
        let mut config = match &self.config {
            Some(path) => load_config_from_path(Some(path.clone()))
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => load_config().context("loading config")?,
        };
        self.overrides().apply(&mut config);
        config.validate().context("invalid command-line override")?;
        info!(source = %config.source(), "Configuration ready");
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rite_cli=info".parse()?)
                .add_directive("rite_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Seed { text } => {
            println!("{}", seed_from_text(&text));
        }

        Command::Compose { seed, prompt } => {
            let seed = match (seed, prompt) {
                (Some(value), _) => Seed(value),
                (None, Some(prompt)) => seed_from_text(&prompt),
                (None, None) => seed_from_text(&config.default_phrase),
            };
            let composition = generate_composition(seed);
            println!("{}", serde_json::to_string_pretty(&composition)?);
        }

        Command::Text { prompt } => {
            println!("{}", MythicText::from_prompt(prompt.trim()));
        }

        Command::Keywords { text, max } => {
            for keyword in extract_keywords(&text, max.unwrap_or(config.max_keywords)) {
                println!("{keyword}");
            }
        }

        Command::Palette { png, buckets } => {
            let frame = read_png(&png)?;
            for color in extract_palette(&frame, buckets.unwrap_or(config.palette_buckets)) {
                println!("{color}");
            }
        }

        Command::Render { prompt, output } => {
            let prompt = prompt.trim();
            let phrase = if prompt.is_empty() {
                config.default_phrase.as_str()
            } else {
                prompt
            };
            let composition = generate_composition(seed_from_text(phrase));
            let frame = render_composition(&composition, config.canvas_width, config.canvas_height);
            write_png(&output, frame)?;
            info!(path = %output.display(), seed = %composition.seed(), "Rendered composition");
        }

        Command::Cycle { prompt, afterglow } => {
            let record = run_cycle(&config, prompt).await?;
            if let Some(path) = afterglow {
                let frame = render_afterglow(
                    &record.residue.palette,
                    config.canvas_width,
                    config.canvas_height,
                );
                write_png(&path, frame)?;
                info!(path = %path.display(), "Rendered afterglow");
            }
            println!("{}", record.to_json()?);
        }

        Command::Replay { record } => {
            let json = std::fs::read_to_string(&record)
                .with_context(|| format!("reading {}", record.display()))?;
            let parsed = CycleRecord::from_json(&json)
                .with_context(|| format!("parsing {}", record.display()))?;
            verify_replay(&parsed).with_context(|| format!("replaying {}", record.display()))?;
            println!("ok {} {}", parsed.seed, parsed.prompt);
        }

        Command::Auto { cycles } => {
            run_auto(&config, cycles).await?;
        }
    }

    Ok(())
}

/// Drive one create/destroy cycle and return its record
async fn run_cycle(config: &RiteConfigFile, prompt: String) -> anyhow::Result<CycleRecord> {
    let (tx, mut rx) = mpsc::channel(32);
    let mut rite = Rite::new(
        ParticleShatter::new(config.shatter.clone()),
        StandardExtractor,
        config.rite_config(),
        tx,
    );

    rite.handle_event(RiteEvent::PromptChanged { text: prompt }).await;
    rite.handle_event(RiteEvent::Create).await;
    rite.handle_event(RiteEvent::Destroy).await;
    if rite.await_destruction().await.is_none() {
        bail!("destruction did not complete");
    }
    drop(rite);

    while let Some(msg) = rx.recv().await {
        if let RiteMessage::Record { record } = msg {
            return Ok(*record);
        }
    }
    bail!("cycle finished without a record")
}

/// Run unattended cycles until `cycles` have completed or Ctrl+C
async fn run_auto(config: &RiteConfigFile, cycles: u32) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<RiteMessage>(256);
    let printer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Failed to encode message: {}", e),
            }
        }
    });

    let mut rite = Rite::new(
        ParticleShatter::new(config.shatter.clone()),
        StandardExtractor,
        config.rite_config(),
        tx,
    );
    let mut schedule = AutoRite::new(config.auto_cycle);
    info!(cycles, cycle = ?schedule.cycle(), "Starting unattended rite");

    let start = Instant::now();
    let mut ticker = tokio::time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        let elapsed = start.elapsed();
        if schedule.cycle_index(elapsed) >= u128::from(cycles) {
            break;
        }
        for event in schedule.step(elapsed) {
            rite.handle_event(event).await;
        }
        rite.handle_event(RiteEvent::Tick).await;
    }

    rite.handle_event(RiteEvent::Quit).await;
    drop(rite);
    printer.await.context("message printer failed")?;
    Ok(())
}

fn read_png(path: &Path) -> anyhow::Result<PixelBuffer> {
    let image = image::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(PixelBuffer::from_raw(width, height, image.into_raw())?)
}

fn write_png(path: &Path, frame: PixelBuffer) -> anyhow::Result<()> {
    let (width, height) = (frame.width(), frame.height());
    let image = image::RgbaImage::from_raw(width, height, frame.into_bytes())
        .context("frame does not match its dimensions")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

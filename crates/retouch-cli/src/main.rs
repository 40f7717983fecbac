mod config;
mod logger;
mod script;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use retouch_core::{ChannelLayout, Session};
use tracing::info;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(version, about = "Scriptable image editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an edit script on an image and save the result
    Edit {
        /// Input image
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image (format from extension)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// YAML edit script; without one the image is only re-encoded
        #[arg(short, long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Session config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print per-channel histogram bins
    Histogram {
        /// Input image
        input: PathBuf,

        /// Number of bins
        #[arg(short, long, value_name = "N", default_value = "50")]
        bins: usize,
    },

    /// Show image dimensions and the session limits that apply to it
    Info {
        /// Input image
        input: PathBuf,

        /// Session config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Edit {
            input,
            output,
            script,
            config,
        } => cmd_edit(&input, &output, script.as_deref(), config.as_deref()),
        Commands::Histogram { input, bins } => cmd_histogram(&input, bins),
        Commands::Info { input, config } => cmd_info(&input, config.as_deref()),
    }
}

fn open_session(input: &Path, config: Option<&Path>) -> Result<Session> {
    let config = config::load_session_config(config)?;
    let mut session = Session::with_config(config);
    session
        .load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    Ok(session)
}

fn cmd_edit(
    input: &Path,
    output: &Path,
    script_path: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let steps = match script_path {
        Some(path) => script::load_script(path)?,
        None => Vec::new(),
    };
    let mut session = open_session(input, config)?;

    let base_dir = script_path
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    script::run_script(&mut session, &steps, base_dir)?;

    session
        .save(output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    info!(
        steps = steps.len(),
        output = %output.display(),
        "Edit complete"
    );
    Ok(())
}

fn cmd_histogram(input: &Path, bins: usize) -> Result<()> {
    if bins == 0 {
        bail!("Bin count must be at least 1");
    }
    let session = open_session(input, None)?;
    let Some(histogram) = session.histogram_bins(bins) else {
        bail!("Failed to compute histogram for {}", input.display());
    };

    let names: &[&str] = if histogram.channel_count() == 1 {
        &["gray"]
    } else {
        &["red", "green", "blue"]
    };
    for (name, counts) in names.iter().zip(histogram.channels()) {
        let line: Vec<String> = counts.iter().map(u32::to_string).collect();
        println!("{name:>5}: {}", line.join(" "));
    }
    Ok(())
}

fn cmd_info(input: &Path, config: Option<&Path>) -> Result<()> {
    let session = open_session(input, config)?;
    let (Some(original), Some(base)) = (session.original(), session.base()) else {
        bail!("{} did not load", input.display());
    };

    let layout = match original.layout() {
        ChannelLayout::Gray => "gray",
        ChannelLayout::Rgb => "rgb",
        ChannelLayout::Rgba => "rgba",
    };
    println!("File:        {}", input.display());
    println!("Dimensions:  {}x{}", original.width(), original.height());
    println!("Layout:      {layout}");
    match session.reduction_factor() {
        Some(factor) => println!(
            "Preview:     {}x{} (x{factor:.3})",
            base.width(),
            base.height()
        ),
        None => println!("Preview:     full resolution"),
    }
    if let Some(max) = session.max_history() {
        println!("Max history: {max}");
    }
    Ok(())
}

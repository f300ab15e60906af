use anyhow::{Context, Result};
use cli::{Args, Command, parse_args};
use conf::{APP_NAME, Conf, load_config};
use cv::capture::{CaptureOptions, capture_images};
use cv::grid::{GridOptions, display_images};
use cv::infer::{InferenceOptions, run_inference};
use cv::{CaptureSource, HighguiViewer};
use log::logger::AdvancedLogger;
use log::{LogLevel, critical, info, warning};
use std::time::Duration;

mod cli;
mod conf;
mod copy;
mod cv;
mod error;
mod model;
mod tree;

fn main() {
    let args = parse_args();

    let level = if args.debug {
        LogLevel::Debug
    } else if args.quiet {
        LogLevel::Warning
    } else {
        LogLevel::Info
    };
    if let Err(e) = AdvancedLogger::init(level, APP_NAME) {
        eprintln!("Failed to initialize logger: {e}");
    }

    if let Err(e) = run(args) {
        critical!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;

    match args.command {
        Command::Capture {
            classes,
            num_imgs,
            out,
            device,
            delay,
            no_show,
        } => {
            let opts = CaptureOptions {
                num_imgs,
                classes,
                img_path: out,
                delay: secs(delay.unwrap_or(cfg.capture.delay_secs)),
                label_pause: secs(cfg.capture.label_pause_secs),
                extension: cfg.capture.extension.clone(),
                show: !no_show,
                window: cfg.capture.window.clone(),
                quit_key: cfg.inference.quit_key,
            };
            let mut source = CaptureSource::Device(device).open()?;
            let summary = capture_images(&mut source, &mut HighguiViewer::new(), &opts)?;
            if summary.interrupted {
                warning!("Capture stopped early after {} images", summary.written.len());
            } else {
                info!("Captured {} images", summary.written.len());
            }
        }
        Command::Grid { dir, columns } => {
            let opts = GridOptions {
                columns: columns.unwrap_or(cfg.grid.columns),
                tile_size: cfg.grid.tile_size,
                window: cfg.grid.window.clone(),
            };
            display_images(&dir, &mut HighguiViewer::new(), &opts)
                .with_context(|| format!("Failed to display images in {}", dir.display()))?;
        }
        Command::Infer { models, source } => {
            let source = source
                .capture_source()
                .context("Either --video or --device is required")?;
            infer(&cfg, &models, source)?;
        }
        Command::LatestModel { models } => {
            let path = model::latest_weights(&models, &cfg.model.weights)?;
            println!("{}", path.display());
        }
        Command::Copy {
            source,
            destination,
        } => {
            // failures are logged by the copy itself
            copy::copy_with_unique_name(&source, &destination);
        }
        Command::Tree { path, files } => tree::print_tree(&path, files)?,
    }

    Ok(())
}

fn infer(cfg: &Conf, models: &std::path::Path, source: CaptureSource) -> Result<()> {
    let (mut model, weights) = model::get_trained_model(models, &cfg.model)?;
    info!("Loaded weights from {}", weights.display());

    let opts = InferenceOptions {
        window: cfg.inference.window.clone(),
        quit_key: cfg.inference.quit_key,
        log_every: 100,
    };
    let mut capture = source.open()?;
    let frames = run_inference(&mut capture, &mut model, &mut HighguiViewer::new(), &opts)?;
    info!("Processed {} frames from {}", frames, source);
    Ok(())
}

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.))
}

//! face-enhance - Face-aware single image enhancement
//!
//! CLI entry point

use clap::error::ErrorKind;
use clap::Parser;
use std::path::Path;
use tracing::{warn, Level};

use face_enhance::restore::MAX_FRAME_SCALE;
use face_enhance::{exit_codes, Cli, Config, EnhanceError, Enhancer, RunConfig};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::USAGE,
            };
            // Printing can only fail if stdout/stderr is closed
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    std::process::exit(match run(&cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<EnhanceError>()
                .map_or(exit_codes::PROCESSING_ERROR, EnhanceError::exit_code)
        }
    });
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // An explicit --config must load; discovered files only warn
    let file_config = match &cli.config {
        Some(path) => Config::load_from_path(path).map_err(EnhanceError::from)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            Config::default()
        }),
    };

    let run_config = file_config.merge_with_cli(&cli.overrides());

    if cli.dry_run {
        print_execution_plan(&run_config);
        return Ok(());
    }

    let report = Enhancer::new(run_config).run()?;
    println!("Saved: {}", report.output.as_deref().unwrap_or(cli.output.as_path()).display());
    Ok(())
}

// ============ Helper Functions ============

fn describe_model(path: Option<&Path>) -> String {
    match path {
        Some(p) if p.is_file() => format!("{} (found)", p.display()),
        Some(p) => format!("{} (missing)", p.display()),
        None => "none".to_string(),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ENABLED"
    } else {
        "DISABLED"
    }
}

/// Print execution plan for dry-run mode
fn print_execution_plan(config: &RunConfig) {
    let p = &config.params;

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", config.input.display());
    println!("Output: {}", config.output.display());
    println!();
    println!("Models:");
    println!("  Super-resolution: {}", describe_model(config.sr_model.as_deref()));
    println!("  Detector proto: {}", describe_model(config.detector_proto.as_deref()));
    println!("  Detector weights: {}", describe_model(config.detector_weights.as_deref()));
    println!("  Cascade: {}", describe_model(config.cascade.as_deref()));
    println!("  Confidence threshold: {}", config.confidence);
    println!();
    println!("Pipeline:");
    println!("  1. Locate face (neural, then cascade)");
    if config.face_only {
        println!(
            "  2. Face found: restore region x{}, composite back",
            config.scale
        );
        println!(
            "     No face: restore whole frame x{}",
            config.scale.min(MAX_FRAME_SCALE)
        );
    } else {
        println!(
            "  2. Restore whole frame x{} (face-only mode off)",
            config.scale.min(MAX_FRAME_SCALE)
        );
    }
    println!(
        "  3. Final pass: {} (contrast clip {}, sharpen {})",
        on_off(config.final_pass),
        p.global_contrast_clip,
        p.global_sharpen_amount
    );
    println!();
    println!("Parameters:");
    println!("  Local contrast clip: {}", p.local_contrast_clip);
    println!("  Local sharpen amount: {}", p.local_sharpen_amount);
    println!("  Gamma: {}", p.gamma);
    println!(
        "  Bilateral: d={} sigma_color={} sigma_space={}",
        p.bilateral_diameter, p.bilateral_color_sigma, p.bilateral_space_sigma
    );
    println!(
        "  Detail enhance: sigma_s={} sigma_r={}",
        p.detail_sigma_space, p.detail_sigma_range
    );
}

//! Score text or an image for hidden content and print the JSON report.
//!
//! Run with: cargo run --example scan -- "text to scan"
//!       or: cargo run --example scan -- --image photo.png --samples photo.rgb
//!
//! Reads text from stdin when no text argument is given. Set `RUST_LOG=debug`
//! to watch the cascade.

use std::io::Read;
use std::path::PathBuf;

use stegscan::{Config, FusionEngine, ScanInput, ScoreReport};
use tracing_subscriber::EnvFilter;

fn media_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn main() -> stegscan::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut image_path: Option<PathBuf> = None;
    let mut samples_path: Option<PathBuf> = None;
    let mut text: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                config_path = args.get(i).map(PathBuf::from);
            }
            "--image" | "-i" => {
                i += 1;
                image_path = args.get(i).map(PathBuf::from);
            }
            "--samples" | "-s" => {
                i += 1;
                samples_path = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                println!("Usage: scan [OPTIONS] [TEXT]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>    TOML configuration");
                println!("  -i, --image <FILE>     Image container to scan");
                println!("  -s, --samples <FILE>   Decoded channel samples for --image");
                println!("  -h, --help             Show this help");
                return Ok(());
            }
            other => text = Some(other.to_string()),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let engine = FusionEngine::with_config(config);

    let input = match image_path {
        Some(path) => {
            let buffer = std::fs::read(&path)?;
            let media_type = media_type_for(&path);
            match samples_path {
                Some(samples) => {
                    ScanInput::image_with_samples(buffer, media_type, std::fs::read(samples)?)
                }
                None => ScanInput::image(buffer, media_type),
            }
        }
        None => match text {
            Some(text) => ScanInput::text(text),
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                ScanInput::text(buf)
            }
        },
    };

    let report = ScoreReport::new(engine.scan(&input)?);
    println!("{}", report.to_json()?);
    Ok(())
}

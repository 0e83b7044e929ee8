//! Venus3 Board Exercise Tool
//!
//! Opens the board, reads its identification and walks the left controller
//! through a short sequence of settings changes.
//!
//! Usage:
//!   cargo run --example venus3_demo -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: auto-detect by description)
//!   --timeout MS      Response timeout in ms (default: 500)
//!   --config FILE     Load connection settings from a JSON file
//!
//! Set `RUST_LOG=venuslink_core=debug` to see every frame.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use venuslink_core::device::{InputSource, Orientation, Rgb, TestPattern, Venus3};
use venuslink_core::protocol::{Connection, ConnectionConfig, Side};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut timeout_ms: Option<u64> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                if i < args.len() {
                    port_name = Some(args[i].clone());
                }
            }
            "--timeout" | "-t" => {
                i += 1;
                if i < args.len() {
                    timeout_ms = args[i].parse().ok();
                }
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            arg if !arg.starts_with('-') => {
                port_name = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
            }
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => ConnectionConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ConnectionConfig::default(),
    };
    if port_name.is_some() {
        config.port_name = port_name;
    }
    if let Some(ms) = timeout_ms {
        config.timeout_ms = ms;
    }

    println!("Available ports:");
    for port in Connection::list_ports() {
        println!(
            "  {} {}",
            port.name,
            port.description.as_deref().unwrap_or("")
        );
    }
    println!();

    let mut dlp = Venus3::connect(config).context("opening Venus3 board")?;
    println!(
        "Connected on {}",
        dlp.connection().port_name().unwrap_or("?")
    );

    let side = Side::Left;

    println!("ASIC:          {}", dlp.get_asic_device_id(side)?);
    let dmd = dlp.get_dmd_device_id(side)?;
    println!(
        "DMD:           id {} type {}",
        dmd.device_id,
        dmd.type_hex()
    );
    println!("Flash version: {}", dlp.get_flash_version(side)?);

    dlp.set_image_orientation(
        side,
        Orientation {
            flip_x: true,
            flip_y: false,
            rot_90: false,
        },
    )?;
    let look = dlp.get_look(side)?;
    println!(
        "Look:          {} (sequence {}, {} Hz)",
        look.look_id, look.sequence_id, look.frame_rate
    );
    dlp.set_look(side, 1)?;
    println!("CAIC enabled:  {}", dlp.get_caic_enable(side)?);
    dlp.set_caic_enable(side, true)?;
    println!("Orientation:   {:?}", dlp.get_image_orientation(side)?);

    dlp.set_input_source(side, InputSource::TestPatternGenerator)?;
    println!("Input source:  {:?}", dlp.get_input_source(side)?);
    dlp.set_test_pattern(side, TestPattern::ColorBars)?;
    dlp.set_rgb_currents(side, Rgb::new(200, 200, 200))?;
    println!("LED currents:  {:?}", dlp.get_rgb_currents(side)?);
    dlp.set_input_source(side, InputSource::ExternalVideoPort)?;

    println!("Frozen:        {}", dlp.get_image_freeze(side)?);
    dlp.set_image_freeze(side, true)?;
    println!("Frozen:        {}", dlp.get_image_freeze(side)?);
    dlp.set_image_freeze(side, false)?;

    let (tx_bytes, rx_bytes, tx_frames, rx_frames) = dlp.connection().get_counters();
    println!();
    println!(
        "Sent {} frames ({} bytes), received {} frames ({} bytes)",
        tx_frames, tx_bytes, rx_frames, rx_bytes
    );

    dlp.connection_mut().disconnect();
    Ok(())
}

fn print_help() {
    println!("Venus3 Board Exercise Tool");
    println!();
    println!("Usage: venus3_demo [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  -p, --port PORT       Serial port (default: auto-detect)");
    println!("  -t, --timeout MS      Response timeout in ms (default: 500)");
    println!("  -c, --config FILE     Load connection settings from JSON");
    println!("  -h, --help            Show this help");
}

//! CLI tool for vgrid - computes the frame for a grid description
//!
//! Usage:
//!   vgrid_cli <grid.json>                                # Frame JSON to stdout
//!   vgrid_cli <grid.json> --scroll-x 240 --scroll-y 480  # Scrolled frame
//!   vgrid_cli <grid.json> -o frame.json                  # Frame JSON to file
//!
//! Set `RUST_LOG=vgrid=debug` to trace the recomputation passes.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;
use vgrid::layout::ScrollConfig;
use vgrid::{GridInput, ScrollControl, VirtualGrid};

const USAGE: &str = "Usage: vgrid_cli <grid.json> [--scroll-x N] [--scroll-y N] [-o output.json]";

struct Args {
    input_path: String,
    output_path: Option<String>,
    scroll_x: f32,
    scroll_y: f32,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input_path = None;
    let mut output_path = None;
    let mut scroll_x = 0.0;
    let mut scroll_y = 0.0;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" => output_path = Some(iter.next().ok_or("-o needs a path")?.clone()),
            "--scroll-x" | "--scroll-y" => {
                let value = iter.next().ok_or(format!("{arg} needs a value"))?;
                let value: f32 = value
                    .parse()
                    .map_err(|e| format!("invalid {arg} value {value:?}: {e}"))?;
                if arg == "--scroll-x" {
                    scroll_x = value;
                } else {
                    scroll_y = value;
                }
            }
            _ if input_path.is_none() => input_path = Some(arg.clone()),
            _ => return Err(format!("unexpected argument {arg:?}")),
        }
    }

    Ok(Args {
        input_path: input_path.ok_or("missing input file")?,
        output_path,
        scroll_x,
        scroll_y,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    // Read input file
    let json = match fs::read_to_string(&args.input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.input_path, e);
            std::process::exit(1);
        }
    };

    // Build grid
    let grid = GridInput::from_json(&json).and_then(VirtualGrid::from_input);
    let mut grid = match grid {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error loading grid: {}", e);
            std::process::exit(1);
        }
    };

    grid.scroll_to(&ScrollConfig {
        left: Some(args.scroll_x),
        top: Some(args.scroll_y),
        ..ScrollConfig::default()
    });

    // Serialize to JSON
    let frame = match serde_json::to_string_pretty(grid.frame()) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match args.output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &frame) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(frame.as_bytes()).unwrap();
            println!();
        }
    }
}

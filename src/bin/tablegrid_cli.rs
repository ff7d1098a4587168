//! CLI tool for tablegrid - builds the grid of one page and outputs JSON
//!
//! Usage:
//!   tablegrid_cli <page.json>              # Output JSON to stdout
//!   tablegrid_cli <page.json> -o out.json  # Output JSON to file
//!
//! Set `RUST_LOG=debug` to see cut pruning and row retirement.

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};

use tablegrid::{GridSnapshot, PageDocument, TableContentProducer, TableLayoutProducer};

fn run(input_path: &str) -> tablegrid::Result<String> {
    let json = fs::read_to_string(input_path)?;
    let doc = PageDocument::from_json(&json)?;

    let mut layout = TableLayoutProducer::new(doc.config);
    layout.update(&doc.tree, &doc.page, false)?;

    let mut content = TableContentProducer::new(layout.into_layout(), doc.config);
    content.compute(&doc.tree, &doc.page, false)?;
    let snapshot = GridSnapshot::capture(&mut content, &doc.tree)?;
    snapshot.to_json_pretty()
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let Some(input_path) = args.get(1) else {
        eprintln!("Usage: tablegrid_cli <page.json> [-o output.json]");
        std::process::exit(1);
    };
    let output_path = match (args.get(2), args.get(3)) {
        (Some(flag), Some(path)) if flag == "-o" => Some(path),
        _ => None,
    };

    let json = match run(input_path) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error processing {input_path}: {e}");
            std::process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {path}: {e}");
                std::process::exit(1);
            }
            eprintln!("Written: {path}");
        }
        None => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{json}") {
                eprintln!("Error writing output: {e}");
                std::process::exit(1);
            }
        }
    }
}

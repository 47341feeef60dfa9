//! # samplescope - Main Entry Point
//!
//! Prints totals for one sample database, plus the hottest symbols when an
//! `nm` listing of the sampled image is supplied.

// Percentages are display-only
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use samplescope::cli::Args;
use samplescope::{SampleDatabase, SymbolResolver, SymbolTable};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut symbols = match &args.symbols {
        Some(path) => Some(
            SymbolTable::from_nm_file(path)
                .with_context(|| format!("Failed to load symbols from {}", path.display()))?
                .with_load_base(args.load_base),
        ),
        None => None,
    };

    let mut db = SampleDatabase::new(&args.database);
    if !db.has_samples() {
        println!("No samples in {}", db.path().display());
        return Ok(());
    }

    let total = db.count();
    let samples = db.samples(symbols.as_mut().map(|table| table as &mut dyn SymbolResolver));
    info!("{} distinct addresses", samples.len());

    println!("{}: {total} samples", db.path().display());
    if args.quiet {
        return Ok(());
    }

    let percent = |count: u64| if total > 0 { count as f64 * 100.0 / total as f64 } else { 0.0 };

    match &symbols {
        Some(table) => {
            for (_, symbol) in table.hot_symbols().into_iter().take(args.top) {
                println!("{:>10} {:>6.2}%  {symbol}", symbol.count(), percent(symbol.count()));
            }
            let unresolved = samples.unresolved_count();
            if unresolved > 0 {
                println!("{unresolved:>10} {:>6.2}%  <unresolved>", percent(unresolved));
            }
        }
        None => {
            for sample in samples.sorted_by_count().into_iter().take(args.top) {
                println!("{sample}  {:>6.2}%", percent(sample.count));
            }
        }
    }

    Ok(())
}

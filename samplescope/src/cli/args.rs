//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "samplescope",
    about = "Summarize a profiler sample database by address and symbol",
    after_help = "\
EXAMPLES:
    samplescope samples/current/{root}/usr/bin/app/TIMER.0.0.all.all.all
    samplescope --symbols app.nm --load-base 0x400000 <SAMPLE_FILE>
    RUST_LOG=debug samplescope <SAMPLE_FILE>      Show unresolved samples"
)]
pub struct Args {
    /// Sample database file to read
    #[arg(value_name = "SAMPLE_FILE")]
    pub database: PathBuf,

    /// `nm` listing of the sampled image (`nm -S <binary>`) for symbol resolution
    #[arg(short, long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Address user-space sample offsets are relative to
    #[arg(long, value_name = "ADDR", default_value = "0", value_parser = parse_address)]
    pub load_base: u64,

    /// Number of symbols (or samples, without --symbols) to list
    #[arg(short = 'n', long, default_value = "10")]
    pub top: usize,

    /// Only print the totals
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse a decimal or `0x`-prefixed hex address
fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x400000"), Ok(0x40_0000));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xzz").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["samplescope", "--load-base", "0x1000", "-n", "3", "db"]);
        assert_eq!(args.load_base, 0x1000);
        assert_eq!(args.top, 3);
        assert_eq!(args.database, PathBuf::from("db"));
        assert!(args.symbols.is_none());
    }
}

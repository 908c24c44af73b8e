//! Command-line surface.

use clap::Parser;

use crate::engine::SearchMode;

/// Search for secp256k1 private keys whose P2PKH address starts with the
/// given Base58 prefixes (or matches full addresses exactly).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base58 prefixes or complete addresses to search for
    #[arg(value_name = "PREFIX")]
    pub prefixes: Vec<String>,

    /// Read additional prefixes from a file, one per line
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<String>,

    /// Append found keys to this file (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// Exit once every prefix has been found
    #[arg(long = "stop")]
    pub stop: bool,

    /// Number of CPU worker threads (default: all cores)
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Enable GPU workers
    #[arg(long = "gpu")]
    pub gpu: bool,

    /// GPU device ids, comma separated
    #[arg(long = "gpu-id", value_name = "LIST", value_delimiter = ',', default_value = "0")]
    pub gpu_ids: Vec<usize>,

    /// Grid size per GPU, comma separated (-1 = driver default)
    #[arg(short = 'g', long = "grid", value_name = "LIST", value_delimiter = ',')]
    pub grid: Vec<i32>,

    /// Master seed for deterministic starting keys
    #[arg(short = 's', long = "seed", value_name = "SEED")]
    pub seed: Option<String>,

    /// Rekey interval in millions of keys (0 = never)
    #[arg(short = 'r', long = "rekey", value_name = "MKEYS", default_value_t = 0)]
    pub rekey: u64,

    /// Search uncompressed addresses only
    #[arg(short = 'u', long = "uncompressed", conflicts_with = "compressed")]
    pub uncompressed: bool,

    /// Search compressed addresses only
    #[arg(short = 'c', long = "compressed")]
    pub compressed: bool,
}

impl Cli {
    pub fn search_mode(&self) -> SearchMode {
        if self.uncompressed {
            SearchMode::Uncompressed
        } else if self.compressed {
            SearchMode::Compressed
        } else {
            SearchMode::Both
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["vanityhunt", "1Test"]);
        assert_eq!(cli.prefixes, vec!["1Test".to_string()]);
        assert_eq!(cli.rekey, 0);
        assert!(!cli.stop);
        assert!(!cli.gpu);
        assert_eq!(cli.gpu_ids, vec![0]);
        assert_eq!(cli.search_mode(), SearchMode::Both);
    }

    #[test]
    fn mode_flags() {
        let cli = Cli::parse_from(["vanityhunt", "-c", "1Test"]);
        assert_eq!(cli.search_mode(), SearchMode::Compressed);
        let cli = Cli::parse_from(["vanityhunt", "-u", "1Test"]);
        assert_eq!(cli.search_mode(), SearchMode::Uncompressed);
        assert!(Cli::try_parse_from(["vanityhunt", "-u", "-c", "1Test"]).is_err());
    }

    #[test]
    fn list_arguments_split_on_commas() {
        let cli = Cli::parse_from(["vanityhunt", "--gpu", "--gpu-id", "0,2", "-g", "256,128", "1T"]);
        assert_eq!(cli.gpu_ids, vec![0, 2]);
        assert_eq!(cli.grid, vec![256, 128]);
    }

    #[test]
    fn search_parameters() {
        let cli = Cli::parse_from([
            "vanityhunt", "-t", "4", "-r", "50", "-s", "seed", "-o", "out.txt", "--stop", "1AB",
        ]);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.rekey, 50);
        assert_eq!(cli.seed.as_deref(), Some("seed"));
        assert_eq!(cli.output.as_deref(), Some("out.txt"));
        assert!(cli.stop);
    }
}

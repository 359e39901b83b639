use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "roster", about = "Harvest the licensee roster into ids.txt and a CSV table")]
pub struct Cli {
    /// Index pages to walk instead of the count derived from the record counter
    #[arg(short = 'p', long = "pages")]
    pub pages: Option<usize>,

    /// JSON array of identifiers to use instead of walking the index
    #[arg(long = "ids", value_name = "FILE")]
    pub ids: Option<PathBuf>,

    /// RON file overriding URLs, output names and fetch limits
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving the output files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log and skip detail pages without any fields instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// Also write the log to ./roster.log
    #[arg(long)]
    pub log_file: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

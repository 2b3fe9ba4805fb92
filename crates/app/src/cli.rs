//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "nimbus")]
#[command(about = "Weather lookups through a TTL- and size-bounded cache pool", long_about = None)]
pub struct Cli {
    /// Locations to look up; the configured default is used when none are given
    pub locations: Vec<String>,

    /// Bypass cached reports and fetch fresh ones
    #[arg(short, long)]
    pub refresh: bool,

    /// Print cache statistics after the reports
    #[arg(short, long)]
    pub stats: bool,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep reading locations from stdin, one per line, until EOF or Ctrl-C
    #[arg(short, long)]
    pub interactive: bool,

    /// Configuration file (TOML or JSON); without it `NIMBUS_*` variables are
    /// tried first, then the usual config file locations
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Locations for the one-shot run; `None` selects the default location
    pub fn queries(&self) -> Vec<Option<&str>> {
        if self.locations.is_empty() {
            vec![None]
        } else {
            self.locations.iter().map(|l| Some(l.as_str())).collect()
        }
    }
}

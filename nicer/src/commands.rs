use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nicer", version, about = "NICER interactive plot client")]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Server base URL, overrides the settings file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Write the resulting page as HTML
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Suggest observation ids for a partial input
    Search { partial: String },
    /// Request plots for an observation
    Plot {
        #[command(flatten)]
        plot: PlotArgs,
    },
    /// Request plots, then refine one of them by GTI selection
    Refine {
        #[command(flatten)]
        plot: PlotArgs,
        /// Slot id of the plot to refine
        #[arg(long)]
        slot: String,
        /// GTI numbers and ranges, e.g. "0,2-4"
        #[arg(long)]
        gti: String,
        /// Minimum counts per bin
        #[arg(long)]
        min_value: Option<i64>,
    },
    /// Print the slot id derived from a plot markup file
    Slug { file: PathBuf },
    /// Validate a GTI selection
    GtiCheck {
        spec: String,
        #[arg(long)]
        max_gti: u32,
    },
}

#[derive(clap::Args)]
pub struct PlotArgs {
    #[arg(long)]
    pub obs_id: String,
    #[arg(long)]
    pub quality: Option<String>,
    /// Plot type names to request; all configured types when omitted
    #[arg(long = "plot-type")]
    pub plot_types: Vec<String>,
}

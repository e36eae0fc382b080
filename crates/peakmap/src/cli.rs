//! Clap derive structures for the `peakmap` CLI.
//!
//! Defines the command tree, global flags, and the facet flags shared by
//! every query command.

use clap::{Args, Parser, Subcommand, ValueEnum};

use peakmap_core::{ALL, FacetState, LayerId, YearSelection};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// peakmap -- filter peak-hour traffic counts across intersection layers
#[derive(Debug, Parser)]
#[command(
    name = "peakmap",
    version,
    about = "Filter and report peak-hour traffic counts from an ArcGIS feature service",
    long_about = "Query the intersection layers of a Traffic Analysis PEAK feature service.\n\n\
        Facet flags (--data-type, --year, --period, --street) build one where clause\n\
        per layer; layers that cannot honour a facet match nothing.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 's', env = "PEAKMAP_SERVICE", global = true)]
    pub service: Option<String>,

    /// FeatureServer URL (overrides profile)
    #[arg(long, env = "PEAKMAP_URL", global = true)]
    pub url: Option<String>,

    /// Layer ids to load, e.g. "1-101" or "1,2,5-9" (overrides profile)
    #[arg(long, env = "PEAKMAP_LAYERS", global = true)]
    pub layers: Option<String>,

    /// Access token for secured services
    #[arg(long, env = "PEAKMAP_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PEAKMAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PEAKMAP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PEAKMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the service's layers and their fields
    #[command(alias = "ls")]
    Layers,

    /// Print the where clause each layer gets for the given facets
    Where(WhereArgs),

    /// List the years still reachable under the given facets
    Years(FacetArgs),

    /// List, check, or complete street names
    Streets(StreetsArgs),

    /// Select locations and show the matching counts
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Build the traffic analytics report for selected locations
    Report(SelectionArgs),

    /// Compute the map snapshot extent for selected locations
    Extent(SelectionArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Facet Arguments ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FacetArgs {
    /// Data type, e.g. "AM Peak" ("All" disables the facet)
    #[arg(long, short = 'd', default_value = ALL)]
    pub data_type: String,

    /// Year to include (repeatable; "All" disables the facet)
    #[arg(long, short = 'y')]
    pub year: Vec<String>,

    /// Period, e.g. "Weekday" ("All" disables the facet)
    #[arg(long, short = 'p', default_value = ALL)]
    pub period: String,

    /// Street text, matched against either street of an intersection
    #[arg(long, default_value = "")]
    pub street: String,
}

impl FacetArgs {
    pub fn to_facets(&self) -> FacetState {
        FacetState {
            data_type: self.data_type.clone(),
            years: self.years(),
            period: self.period.clone(),
            street: self.street.clone(),
        }
    }

    pub fn years(&self) -> YearSelection {
        if self.year.is_empty() {
            YearSelection::All
        } else {
            YearSelection::from_selected(&self.year)
        }
    }
}

// ── Subcommand Arguments ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WhereArgs {
    #[command(flatten)]
    pub facets: FacetArgs,

    /// Only show these layers (repeatable)
    #[arg(long, short = 'l')]
    pub layer: Vec<u32>,
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct StreetsArgs {
    /// Report whether NAME is a known street
    #[arg(long, value_name = "NAME")]
    pub check: Option<String>,

    /// Complete TEXT the way pressing Enter in the street box does
    #[arg(long, value_name = "TEXT")]
    pub complete: Option<String>,
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    #[command(flatten)]
    pub facets: FacetArgs,

    /// Select this location layer (repeatable)
    #[arg(long, short = 'l')]
    pub layer: Vec<u32>,
}

impl SelectionArgs {
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = Vec::with_capacity(self.layer.len());
        for id in self.layer.iter().copied().map(LayerId) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Sort the table by this column
    #[arg(long, value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending (sorting the same column twice)
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved service configuration
    Show,

    /// Write a config file with the built-in service profile
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! CLI command definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::compliance::InventoryFilter;
use crate::model::{Category, LifecycleStatus, Verdict};

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Equipment registry commands.
#[derive(Debug, Subcommand)]
pub enum EquipmentCommand {
    /// List registered fire extinguishers
    List {
        /// Only show units in this state for the current month
        #[arg(short, long, value_enum)]
        filter: Option<FilterArg>,

        /// Match code or location (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Register a new fire extinguisher
    Add(AddEquipment),

    /// Change the registration of a fire extinguisher
    Edit(EditEquipment),

    /// Withdraw a fire extinguisher from service
    Retire {
        /// Code of the unit
        code: String,

        /// Retire date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print or save the QR label of a fire extinguisher (SVG)
    Label {
        /// Code of the unit
        code: String,

        /// Write the label to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Minimum label size in pixels
        #[arg(long, default_value_t = 256)]
        size: u32,
    },

    /// Delete a fire extinguisher and its inspection history
    Delete {
        /// Code of the unit
        code: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for `equipment add`.
#[derive(Debug, Args)]
pub struct AddEquipment {
    /// Code printed on the unit's QR label, e.g. FE-003
    #[arg(long)]
    pub code: String,

    /// Extinguishing agent (dry_chemical, co2, foam, water, clean_agent)
    #[arg(long)]
    pub category: Category,

    /// Install location
    #[arg(long)]
    pub location: String,

    /// Owning department
    #[arg(long)]
    pub department: String,

    /// Nominal capacity, e.g. "15 lbs"
    #[arg(long)]
    pub capacity: String,

    /// Install date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub installed: Option<NaiveDate>,

    /// Lifecycle status (active, retired, under-maintenance)
    #[arg(long, default_value = "active")]
    pub status: LifecycleStatus,

    /// Retire date, required with --status retired
    #[arg(long)]
    pub retired_on: Option<NaiveDate>,
}

/// Arguments for `equipment edit`; omitted fields are unchanged.
#[derive(Debug, Args)]
pub struct EditEquipment {
    /// Current code of the unit
    pub code: String,

    /// New code
    #[arg(long = "new-code")]
    pub new_code: Option<String>,

    /// Extinguishing agent
    #[arg(long)]
    pub category: Option<Category>,

    /// Install location
    #[arg(long)]
    pub location: Option<String>,

    /// Owning department
    #[arg(long)]
    pub department: Option<String>,

    /// Nominal capacity
    #[arg(long)]
    pub capacity: Option<String>,

    /// Install date (YYYY-MM-DD)
    #[arg(long)]
    pub installed: Option<NaiveDate>,

    /// Lifecycle status
    #[arg(long)]
    pub status: Option<LifecycleStatus>,

    /// Retire date
    #[arg(long)]
    pub retired_on: Option<NaiveDate>,
}

/// Scan a QR label from still images.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// An image file, or a directory of PNG/JPEG frames
    pub source: PathBuf,

    /// Give up after this many seconds without a match
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,
}

/// Stage 1: officer check.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Code of the unit (as scanned or typed)
    pub code: String,

    /// Officer name
    #[arg(long)]
    pub officer: String,

    /// Hose condition (normal, defective)
    #[arg(long)]
    pub hose: Option<String>,

    /// Lever condition (normal, defective)
    #[arg(long)]
    pub lever: Option<String>,

    /// Body condition (normal, defective)
    #[arg(long)]
    pub body: Option<String>,

    /// Pressure (normal, abnormal)
    #[arg(long)]
    pub pressure: Option<String>,

    /// Obstruction (absent, present)
    #[arg(long)]
    pub obstruction: Option<String>,

    /// Free-text note
    #[arg(long)]
    pub note: Option<String>,
}

/// Stage 2: technician confirmation.
#[derive(Debug, Args)]
pub struct ConfirmCommand {
    /// Code of the unit (as scanned or typed)
    pub code: String,

    /// Technician name
    #[arg(long)]
    pub technician: String,

    /// Final verdict (normal, abnormal)
    #[arg(long, default_value = "normal")]
    pub verdict: Verdict,

    /// Technical note
    #[arg(long)]
    pub note: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

/// Inventory filter for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    /// Units not retired
    Active,
    /// Confirmed this month
    Checked,
    /// Not yet confirmed this month
    Pending,
    /// Retired units
    Retired,
}

impl From<FilterArg> for InventoryFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Active => Self::Active,
            FilterArg::Checked => Self::Checked,
            FilterArg::Pending => Self::Pending,
            FilterArg::Retired => Self::Retired,
        }
    }
}

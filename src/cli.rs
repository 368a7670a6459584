use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::entities::params::{KeyColumn, SplitMode, StartRow};
use crate::usecase::ports::host::HostMode;

#[derive(Debug, Parser)]
#[command(name = "xlsplit")]
#[command(about = "Split one workbook by a key column, or merge many into one", long_about = None)]
pub struct Cli {
    /// Automation host used by perfect split and clean
    #[arg(long, global = true, value_enum)]
    pub host: Option<HostArg>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split a workbook into one file per key
    Split {
        file: PathBuf,
        /// First data row, 1-based
        #[arg(short, long)]
        start_row: StartRow,
        /// Key column as a number or letter (3 or C)
        #[arg(short, long)]
        key_column: KeyColumn,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Fast)]
        mode: ModeArg,
        /// Defaults to a timestamped folder next to the source
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Merge the valid rows of every workbook in a folder
    Merge {
        folder: PathBuf,
        #[arg(short, long)]
        start_row: StartRow,
        /// Template workbook; defaults to the first scanned file
        #[arg(short, long, conflicts_with = "template_index")]
        template: Option<PathBuf>,
        /// 1-based position of the template in the scan list
        #[arg(long)]
        template_index: Option<usize>,
        /// Defaults to the scanned folder
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print row statistics for every workbook in a folder
    Scan {
        folder: PathBuf,
        #[arg(short, long)]
        start_row: StartRow,
        /// Also write the table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Preview how a split would distribute rows across keys
    Analyze {
        file: PathBuf,
        #[arg(short, long)]
        start_row: StartRow,
        #[arg(short, long)]
        key_column: KeyColumn,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Remove fully blank rows and columns, saving a cleaned copy
    Clean { file: PathBuf },
    /// Report which automation hosts are available
    Hosts,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Fast,
    Perfect,
}

impl From<ModeArg> for SplitMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Fast => SplitMode::Fast,
            ModeArg::Perfect => SplitMode::Perfect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HostArg {
    Auto,
    Primary,
    Alternate,
}

impl From<HostArg> for HostMode {
    fn from(value: HostArg) -> Self {
        match value {
            HostArg::Auto => HostMode::Auto,
            HostArg::Primary => HostMode::Primary,
            HostArg::Alternate => HostMode::Alternate,
        }
    }
}

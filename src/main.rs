mod cli;
mod config;
mod logging;
mod progress;

mod domain {
    pub mod error;
    pub mod entities {
        pub mod cancel;
        pub mod cell;
        pub mod params;
        pub mod partition;
        pub mod row_union;
        pub mod source_file;
    }
}

mod usecase {
    pub mod ports {
        pub mod host;
        pub mod progress;
    }
    pub mod services {
        pub mod analysis_service;
        pub mod clean_service;
        pub mod host_service;
        pub mod merge_service;
        pub mod partition_service;
        pub mod sanitize_service;
        pub mod scan_service;
        pub mod split_service;
    }
}

mod infra {
    pub mod fs;
    pub mod export {
        pub mod csv;
        pub mod xlsx;
    }
    pub mod host {
        pub mod embedded;
    }
    pub mod import {
        pub mod csv;
        pub mod reader;
        pub mod xlsx;
    }
    pub mod workbook {
        pub mod template;
    }
}


use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{error, info, warn};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::domain::entities::params::{KeyColumn, SplitMode, StartRow};
use crate::infra::export::csv::{export_key_report_to_csv, export_scan_to_csv};
use crate::infra::fs::{create_dir, create_output_dir};
use crate::infra::host::embedded::EmbeddedLauncher;
use crate::progress::{reporter, stop_on_request};
use crate::usecase::ports::host::{HostIdentity, HostLauncher, HostMode};
use crate::usecase::services::analysis_service::analyze;
use crate::usecase::services::clean_service::clean_and_save;
use crate::usecase::services::host_service::{probe, resolve_identity};
use crate::usecase::services::merge_service::{merge, MergeRequest};
use crate::usecase::services::scan_service::{scan_folder, ScanCache};
use crate::usecase::services::split_service::{split_fast, split_perfect, SplitOutcome, SplitRequest};

fn main() {
    let args = Cli::parse();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {err}");
            process::exit(1);
        }
    };
    logging::init_logger(&config.log_level);

    let host_mode = args.host.map(HostMode::from).unwrap_or(config.host.mode);
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    if let Err(err) = run(command, &config, host_mode) {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run(command: Commands, config: &AppConfig, host_mode: HostMode) -> Result<()> {
    match command {
        Commands::Split {
            file,
            start_row,
            key_column,
            mode,
            output_dir,
        } => run_split(
            config,
            host_mode,
            &file,
            start_row,
            key_column,
            mode.into(),
            output_dir,
        ),
        Commands::Merge {
            folder,
            start_row,
            template,
            template_index,
            output_dir,
        } => run_merge(config, &folder, start_row, template, template_index, output_dir),
        Commands::Scan {
            folder,
            start_row,
            csv,
        } => run_scan(config, &folder, start_row, csv),
        Commands::Analyze {
            file,
            start_row,
            key_column,
            csv,
        } => run_analyze(config, &file, start_row, key_column, csv),
        Commands::Clean { file } => run_clean(config, host_mode, &file),
        Commands::Hosts => {
            let launcher = EmbeddedLauncher::default();
            for (identity, available) in probe(&launcher) {
                let state = if available { "available" } else { "not installed" };
                println!("{identity:<10} {state}");
            }
            Ok(())
        }
        Commands::PrintConfig => {
            println!("Configuration: {config:#?}");
            if let Some(path) = config::user_config_path() {
                println!("User config file: {}", path.display());
            }
            Ok(())
        }
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }
    Ok(())
}

fn host_identity(launcher: &dyn HostLauncher, mode: HostMode) -> Result<HostIdentity> {
    resolve_identity(launcher, mode).context("perfect split and clean need an automation host")
}

fn run_split(
    config: &AppConfig,
    host_mode: HostMode,
    file: &Path,
    start_row: StartRow,
    key_column: KeyColumn,
    mode: SplitMode,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    ensure_file(file)?;
    let launcher = EmbeddedLauncher::default();
    let identity = match mode {
        SplitMode::Perfect => Some(host_identity(&launcher, host_mode)?),
        SplitMode::Fast => None,
    };

    let output_dir = match output_dir {
        Some(dir) => {
            create_dir(&dir)?;
            dir
        }
        None => create_output_dir(file, &config.split.output_dir_prefix)?,
    };
    info!(
        start_row = %start_row,
        key_column = %key_column,
        output_dir = %output_dir.display(),
        "split parameters"
    );

    let request = SplitRequest {
        source: file,
        start_row,
        key_column,
        output_dir: &output_dir,
    };
    let settings = config.split_settings();
    let reporter = reporter();
    let cancel = stop_on_request();
    let outcome: SplitOutcome = match identity {
        Some(identity) => split_perfect(request, &settings, &launcher, identity, &*reporter, &cancel),
        None => split_fast(request, &settings, &*reporter, &cancel),
    }
    .with_context(|| format!("failed to split {}", file.display()))?;

    for output in &outcome.outputs {
        println!("{}", output.display());
    }
    if outcome.is_complete() {
        info!(files = outcome.outputs.len(), folder = %output_dir.display(), "split complete");
        return Ok(());
    }
    let written = outcome.outputs.len();
    let cause = outcome
        .aborted
        .map_or_else(|| anyhow!("split was not finished"), |err| anyhow!(err));
    Err(cause.context(format!("split stopped after {written} files")))
}

fn run_merge(
    config: &AppConfig,
    folder: &Path,
    start_row: StartRow,
    template: Option<PathBuf>,
    template_index: Option<usize>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let index = match template_index {
        Some(0) => bail!("template index starts at 1"),
        Some(n) => Some(n - 1),
        None => None,
    };

    let cache = ScanCache::new();
    let reporter = reporter();
    let snapshot = cache.replace(scan_folder(
        folder,
        start_row,
        &config.scan_settings(),
        &*reporter,
    )?);
    if snapshot.files.is_empty() {
        bail!("no spreadsheet files to merge in {}", folder.display());
    }
    let template = cache.choose_template(template.as_deref(), index)?;
    let output_dir = match output_dir {
        Some(dir) => {
            create_dir(&dir)?;
            dir
        }
        None => folder.to_path_buf(),
    };

    let files = snapshot.paths();
    let outcome = merge(
        MergeRequest {
            files: &files,
            start_row,
            template: &template,
            output_dir: &output_dir,
            output_prefix: &config.merge.output_prefix,
        },
        &*reporter,
        &stop_on_request(),
    )
    .context("merge failed")?;

    for file in outcome.files.iter().filter(|f| f.rows.is_none()) {
        warn!(file = %file.path.display(), "not merged");
    }
    println!("{}", outcome.output.display());
    info!(
        rows = outcome.row_count,
        template_rows_stripped = outcome.stripped_rows,
        "merged rows"
    );
    Ok(())
}

fn run_scan(config: &AppConfig, folder: &Path, start_row: StartRow, csv: Option<PathBuf>) -> Result<()> {
    let reporter = reporter();
    let snapshot = scan_folder(folder, start_row, &config.scan_settings(), &*reporter)?;
    println!(
        "{} (start row {})",
        snapshot.folder.display(),
        snapshot.start_row
    );

    println!(
        "{:>4}  {:<40} {:>8} {:>8} {:>8} {:>6} {:>10}",
        "#", "文件名", "总行数", "有效行", "空行", "列数", "大小(KB)"
    );
    for (idx, file) in snapshot.files.iter().enumerate() {
        println!(
            "{:>4}  {:<40} {:>8} {:>8} {:>8} {:>6} {:>10.1}",
            idx + 1,
            file.file_name(),
            file.physical_rows.to_string(),
            file.valid_rows,
            file.blank_rows.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            file.max_columns,
            file.size_kb()
        );
    }
    println!("valid rows total: {}", snapshot.total_valid_rows());

    if let Some(path) = csv {
        let rows = export_scan_to_csv(&snapshot, &path)?;
        info!(rows, csv = %path.display(), "scan exported");
    }
    Ok(())
}

fn run_analyze(
    config: &AppConfig,
    file: &Path,
    start_row: StartRow,
    key_column: KeyColumn,
    csv: Option<PathBuf>,
) -> Result<()> {
    ensure_file(file)?;
    let report = analyze(file, start_row, key_column, config.analysis.row_ceiling)
        .with_context(|| format!("failed to analyze {}", file.display()))?;
    println!("{}", report.render());

    if let Some(path) = csv {
        let rows = export_key_report_to_csv(&report, &path)?;
        info!(rows, csv = %path.display(), "key report exported");
    }
    Ok(())
}

fn run_clean(config: &AppConfig, host_mode: HostMode, file: &Path) -> Result<()> {
    ensure_file(file)?;
    let launcher = EmbeddedLauncher::default();
    let identity = host_identity(&launcher, host_mode)?;
    let outcome = clean_and_save(
        &launcher,
        identity,
        file,
        &config.clean.output_marker,
        config.split.delete_batch_size,
    )
    .with_context(|| format!("failed to clean {}", file.display()))?;
    info!(
        rows = outcome.rows_removed,
        columns = outcome.columns_removed,
        "blank lines removed"
    );
    println!("{}", outcome.output.display());
    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::source_file::ScanSnapshot;
use crate::usecase::services::analysis_service::KeyReport;

pub fn export_scan_to_csv(snapshot: &ScanSnapshot, csv_path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create csv: {}", csv_path.display()))?;

    writer
        .write_record(["序号", "文件名", "总行数", "有效行", "空行", "列数", "大小(KB)"])
        .context("failed to write csv header")?;

    for (idx, file) in snapshot.files.iter().enumerate() {
        writer
            .write_record([
                (idx + 1).to_string(),
                file.file_name(),
                file.physical_rows.to_string(),
                file.valid_rows.to_string(),
                file.blank_rows.map(|n| n.to_string()).unwrap_or_default(),
                file.max_columns.to_string(),
                format!("{:.1}", file.size_kb()),
            ])
            .with_context(|| format!("failed to write csv row for {}", file.path.display()))?;
    }

    writer.flush().context("failed to flush csv")?;
    Ok(snapshot.files.len())
}

pub fn export_key_report_to_csv(report: &KeyReport, csv_path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create csv: {}", csv_path.display()))?;

    writer
        .write_record(["分类", "行数"])
        .context("failed to write csv header")?;
    for entry in &report.counts {
        writer
            .write_record([entry.key.clone(), entry.count.to_string()])
            .with_context(|| format!("failed to write csv row for key {}", entry.key))?;
    }

    writer.flush().context("failed to flush csv")?;
    Ok(report.counts.len())
}

// src/output.rs
use crate::types::{
    ExportFormat, OutputConfig, OutputFormat, ProbeResult, ScanReport, ScanStats, UserFinderError,
};
use crate::utils::{terminal_width, truncate};
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const PLATFORM_WIDTH: usize = 20;
const CATEGORY_WIDTH: usize = 12;

#[derive(Debug, Serialize)]
struct ExportSummary {
    found: usize,
    not_found: usize,
    errors: usize,
}

/// Document written by `--export json`. Only the hits are listed.
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    username: &'a str,
    scan_date: String,
    summary: ExportSummary,
    results: Vec<&'a ProbeResult>,
}

pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Print the report to stdout and write the export file if one was requested.
    pub fn write_report(&self, report: &ScanReport) -> Result<Option<PathBuf>, UserFinderError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.write_report_to(&mut handle, report)
    }

    /// Only table mode adds the export notice to `writer`, so JSON and silent output stay machine-readable.
    pub fn write_report_to<W: Write>(
        &self,
        writer: &mut W,
        report: &ScanReport,
    ) -> Result<Option<PathBuf>, UserFinderError> {
        self.write_output(writer, report)?;

        let Some(format) = self.config.export else {
            return Ok(None);
        };
        let dir = self
            .config
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let path = self.export_report(report, format, &dir, Local::now())?;

        if !self.config.silent && self.config.format == OutputFormat::Table {
            writeln!(
                writer,
                "{} Results exported to {}",
                "✓".green(),
                path.display().to_string().cyan()
            )
            .map_err(io_error)?;
        } else {
            info!("Results exported to {}", path.display());
        }
        Ok(Some(path))
    }

    pub fn write_output<W: Write>(&self, writer: &mut W, report: &ScanReport) -> Result<(), UserFinderError> {
        if self.config.silent {
            return self.write_silent_output(writer, report);
        }
        match self.config.format {
            OutputFormat::Table => self.write_table_output(writer, report),
            OutputFormat::Json => self.write_json_output(writer, report),
        }
    }

    fn write_silent_output<W: Write>(&self, writer: &mut W, report: &ScanReport) -> Result<(), UserFinderError> {
        for result in report.found() {
            writeln!(writer, "{}", result.url).map_err(io_error)?;
        }
        Ok(())
    }

    fn write_json_output<W: Write>(&self, writer: &mut W, report: &ScanReport) -> Result<(), UserFinderError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| UserFinderError::OutputError(format!("Failed to serialize JSON: {}", e)))?;
        writeln!(writer, "{}", json).map_err(io_error)?;
        Ok(())
    }

    fn write_table_output<W: Write>(&self, writer: &mut W, report: &ScanReport) -> Result<(), UserFinderError> {
        let found: Vec<&ProbeResult> = report.found().collect();
        writeln!(writer).map_err(io_error)?;

        if found.is_empty() {
            writeln!(writer, "{}", "No accounts found.".yellow()).map_err(io_error)?;
        } else {
            let title = format!("✓ Found on {} platforms", found.len());
            write_table(writer, &title.green().bold(), &found, |r| r.url.clone(), |s| s.blue())?;
        }

        if self.config.show_all {
            let not_found: Vec<&ProbeResult> = report.not_found().collect();
            if !not_found.is_empty() {
                let title = format!("✗ Not found on {} platforms", not_found.len());
                write_table(writer, &title.dimmed(), &not_found, |r| r.url.clone(), |s| s.dimmed())?;
            }

            let errors: Vec<&ProbeResult> = report.errors().collect();
            if !errors.is_empty() {
                let title = format!("⚠ {} errors/unknown", errors.len());
                write_table(
                    writer,
                    &title.yellow().bold(),
                    &errors,
                    |r| r.error.clone().unwrap_or_else(|| "unknown".to_string()),
                    |s| s.yellow(),
                )?;
            }
        } else if report.stats.errors > 0 {
            writeln!(
                writer,
                "\n{}",
                format!("⚠ {} errors/timeouts occurred", report.stats.errors).dimmed()
            )
            .map_err(io_error)?;
        }

        write_summary(writer, &report.username, &report.stats)
    }

    /// Write `{username}_{timestamp}.{ext}` into `dir`, creating it when missing.
    pub fn export_report(
        &self,
        report: &ScanReport,
        format: ExportFormat,
        dir: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf, UserFinderError> {
        fs::create_dir_all(dir)
            .map_err(|e| UserFinderError::OutputError(format!("Failed to create directory: {}", e)))?;

        let filename = format!(
            "{}_{}.{}",
            sanitize_filename(&report.username),
            now.format("%Y%m%d_%H%M%S"),
            format.extension()
        );
        let path = dir.join(filename);
        let mut file = File::create(&path)
            .map_err(|e| UserFinderError::OutputError(format!("Failed to create file: {}", e)))?;

        match format {
            ExportFormat::Txt => write_text_export(&mut file, report, now)?,
            ExportFormat::Json => write_json_export(&mut file, report, now)?,
        }

        Ok(path)
    }
}

fn write_table<W, F>(
    writer: &mut W,
    title: &ColoredString,
    rows: &[&ProbeResult],
    detail: F,
    paint: fn(&str) -> ColoredString,
) -> Result<(), UserFinderError>
where
    W: Write,
    F: Fn(&ProbeResult) -> String,
{
    let detail_width = terminal_width()
        .saturating_sub(PLATFORM_WIDTH + CATEGORY_WIDTH + 4)
        .max(20);

    writeln!(writer, "{}", title).map_err(io_error)?;
    writeln!(
        writer,
        "{:<pw$}  {:<cw$}  {}",
        "Platform".bold(),
        "Category".bold(),
        "Detail".bold(),
        pw = PLATFORM_WIDTH,
        cw = CATEGORY_WIDTH
    )
    .map_err(io_error)?;

    for row in rows {
        let category = row.category.as_deref().unwrap_or("-");
        writeln!(
            writer,
            "{:<pw$}  {:<cw$}  {}",
            truncate(&row.site, PLATFORM_WIDTH).cyan(),
            truncate(category, CATEGORY_WIDTH),
            paint(&truncate(&detail(row), detail_width)),
            pw = PLATFORM_WIDTH,
            cw = CATEGORY_WIDTH
        )
        .map_err(io_error)?;
    }
    writeln!(writer).map_err(io_error)?;
    Ok(())
}

fn write_summary<W: Write>(writer: &mut W, username: &str, stats: &ScanStats) -> Result<(), UserFinderError> {
    writeln!(writer, "{} {}", "Scan Complete:".bold(), username.yellow()).map_err(io_error)?;
    writeln!(writer, "  Found:     {}", stats.found.to_string().green()).map_err(io_error)?;
    writeln!(writer, "  Not Found: {}", stats.not_found.to_string().dimmed()).map_err(io_error)?;
    writeln!(writer, "  Errors:    {}", stats.errors.to_string().yellow()).map_err(io_error)?;
    writeln!(writer, "  Duration:  {:.2}s\n", stats.duration.as_secs_f64()).map_err(io_error)?;
    Ok(())
}

fn write_text_export<W: Write>(
    writer: &mut W,
    report: &ScanReport,
    now: DateTime<Local>,
) -> Result<(), UserFinderError> {
    let found: Vec<&ProbeResult> = report.found().collect();

    writeln!(writer, "Username Check Results: {}", report.username).map_err(io_error)?;
    writeln!(writer, "Scan Date: {}", now.format("%Y-%m-%d %H:%M:%S")).map_err(io_error)?;
    writeln!(writer, "{}\n", "=".repeat(60)).map_err(io_error)?;

    if found.is_empty() {
        writeln!(writer, "No accounts found.").map_err(io_error)?;
        return Ok(());
    }

    writeln!(writer, "FOUND ON {} PLATFORMS:\n", found.len()).map_err(io_error)?;
    for result in found {
        writeln!(writer, "  • {}", result.site).map_err(io_error)?;
        writeln!(writer, "    {}\n", result.url).map_err(io_error)?;
    }
    Ok(())
}

fn write_json_export<W: Write>(
    writer: &mut W,
    report: &ScanReport,
    now: DateTime<Local>,
) -> Result<(), UserFinderError> {
    let document = ExportDocument {
        username: &report.username,
        scan_date: now.to_rfc3339(),
        summary: ExportSummary {
            found: report.stats.found,
            not_found: report.stats.not_found,
            errors: report.stats.errors,
        },
        results: report.found().collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|e| UserFinderError::OutputError(format!("Failed to serialize JSON: {}", e)))?;
    writeln!(writer).map_err(io_error)?;
    Ok(())
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

fn io_error(e: std::io::Error) -> UserFinderError {
    UserFinderError::OutputError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionType, ProbeStatus, Site};
    use chrono::TimeZone;
    use std::time::Duration;

    fn sample_report() -> ScanReport {
        let github = Site::new("GitHub", "https://github.com/{username}", DetectionType::StatusCode)
            .with_category("development");
        let steam = Site::new("Steam", "https://steamcommunity.com/id/{username}", DetectionType::MessageBody);
        let flaky = Site::new("Flaky", "https://flaky.example/{username}", DetectionType::StatusCode);

        let results = vec![
            ProbeResult::new(&github, "https://github.com/alice".to_string(), ProbeStatus::Found),
            ProbeResult::new(&steam, "https://steamcommunity.com/id/alice".to_string(), ProbeStatus::NotFound),
            ProbeResult::new(&flaky, "https://flaky.example/alice".to_string(), ProbeStatus::Error)
                .with_error("Timeout"),
        ];
        let stats = ScanStats::from_results(&results, Duration::from_millis(1200));
        ScanReport {
            username: "alice".to_string(),
            results,
            stats,
            timestamp: "2026-01-02T03:04:05+00:00".to_string(),
        }
    }

    fn render(config: OutputConfig, report: &ScanReport) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        OutputManager::new(config).write_output(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_table_lists_found_and_summary() {
        let out = render(OutputConfig::default(), &sample_report());
        assert!(out.contains("Found on 1 platforms"));
        assert!(out.contains("GitHub"));
        assert!(out.contains("development"));
        assert!(!out.contains("steamcommunity"));
        assert!(out.contains("1 errors/timeouts occurred"));
        assert!(out.contains("Not Found: 1"));
    }

    #[test]
    fn test_table_show_all_includes_misses_and_errors() {
        let config = OutputConfig {
            show_all: true,
            ..OutputConfig::default()
        };
        let out = render(config, &sample_report());
        assert!(out.contains("Not found on 1 platforms"));
        assert!(out.contains("Steam"));
        assert!(out.contains("Timeout"));
    }

    #[test]
    fn test_silent_prints_only_found_urls() {
        let config = OutputConfig {
            silent: true,
            ..OutputConfig::default()
        };
        let out = render(config, &sample_report());
        assert_eq!(out, "https://github.com/alice\n");
    }

    #[test]
    fn test_json_output_is_full_report() {
        let config = OutputConfig {
            format: OutputFormat::Json,
            ..OutputConfig::default()
        };
        let out = render(config, &sample_report());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
        assert_eq!(value["results"][2]["status"], "error");
        assert_eq!(value["stats"]["errors"], 1);
    }

    #[test]
    fn test_text_export() {
        let dir = tempfile::tempdir().unwrap();
        let manager = OutputManager::new(OutputConfig::default());
        let path = manager
            .export_report(&sample_report(), ExportFormat::Txt, &dir.path().join("out"), fixed_time())
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "alice_20260102_030405.txt");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("Username Check Results: alice\n"));
        assert!(contents.contains(&"=".repeat(60)));
        assert!(contents.contains("FOUND ON 1 PLATFORMS:"));
        assert!(contents.contains("  • GitHub\n    https://github.com/alice\n"));
        assert!(!contents.contains("Steam"));
    }

    #[test]
    fn test_text_export_without_hits() {
        let mut report = sample_report();
        report.results.retain(|r| r.status != ProbeStatus::Found);
        report.stats = ScanStats::from_results(&report.results, Duration::ZERO);

        let mut buf = Vec::new();
        write_text_export(&mut buf, &report, fixed_time()).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("No accounts found.\n"));
    }

    #[test]
    fn test_json_export_lists_only_hits() {
        let dir = tempfile::tempdir().unwrap();
        let manager = OutputManager::new(OutputConfig::default());
        let path = manager
            .export_report(&sample_report(), ExportFormat::Json, dir.path(), fixed_time())
            .unwrap();

        assert_eq!(path.extension().unwrap(), "json");
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["summary"]["found"], 1);
        assert_eq!(value["summary"]["not_found"], 1);
        assert_eq!(value["summary"]["errors"], 1);
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
        assert_eq!(value["results"][0]["site"], "GitHub");
    }

    #[test]
    fn test_json_report_with_export_keeps_stdout_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            format: OutputFormat::Json,
            export: Some(ExportFormat::Txt),
            export_dir: Some(dir.path().to_path_buf()),
            ..OutputConfig::default()
        };
        let mut buf = Vec::new();
        let path = OutputManager::new(config)
            .write_report_to(&mut buf, &sample_report())
            .unwrap()
            .unwrap();

        assert!(path.exists());
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["username"], "alice");
    }

    #[test]
    fn test_table_report_with_export_prints_notice() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            export: Some(ExportFormat::Json),
            export_dir: Some(dir.path().to_path_buf()),
            ..OutputConfig::default()
        };
        let mut buf = Vec::new();
        OutputManager::new(config)
            .write_report_to(&mut buf, &sample_report())
            .unwrap();

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Results exported to"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("john.doe-1"), "john.doe-1");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
    }
}

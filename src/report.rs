// src/report.rs
// =============================================================================
// Report writers.
//
// The scanner hands its retained results to a ReportWriter when asked to
// save; serialization details stay out of the engine.
//
// Formats:
// - json:  pretty-printed array of ProbeResult (body and headers omitted)
// - plain: one aligned line per result, same layout as the terminal table
// =============================================================================

use crate::config::ReportFormat;
use crate::error::ReportError;
use crate::probe::ProbeResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub trait ReportWriter: Send + Sync {
    fn write(&self, results: &[ProbeResult], path: &Path) -> Result<(), ReportError>;
}

/// Writer for the configured format
pub fn report_writer(format: ReportFormat) -> Box<dyn ReportWriter> {
    match format {
        ReportFormat::Json => Box::new(JsonReportWriter),
        ReportFormat::Plain => Box::new(PlainReportWriter),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn write(&self, results: &[ProbeResult], path: &Path) -> Result<(), ReportError> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, results)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainReportWriter;

impl ReportWriter for PlainReportWriter {
    fn write(&self, results: &[ProbeResult], path: &Path) -> Result<(), ReportError> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(render_table(results).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

// Formats results as an aligned table:
//
//   STATUS     SIZE  URL
//   200        1532  https://example.com/admin/  [dir]  "Admin"
//   301           0  https://example.com/old  -> /new
//   ERR           0  https://example.com/x  (request timed out)
pub fn render_table(results: &[ProbeResult]) -> String {
    let mut table = format!("{:<6} {:>9}  {}\n", "STATUS", "SIZE", "URL");

    for result in results {
        let status = result
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "ERR".to_string());

        let mut line = format!("{:<6} {:>9}  {}", status, result.content_length, result.url);
        if result.is_directory {
            line.push_str("  [dir]");
        }
        if let Some(redirect) = &result.redirect {
            line.push_str(&format!("  -> {}", redirect));
        }
        if !result.title.is_empty() {
            line.push_str(&format!("  \"{}\"", result.title));
        }
        if let Some(error) = &result.error {
            line.push_str(&format!("  ({})", error));
        }
        table.push_str(&line);
        table.push('\n');
    }

    table
}

//! Output formatting.
//!
//! Human mode prints aligned text; JSON mode prints one pretty-printed
//! document per command.

use std::fmt::Write;
use std::path::Path;

use rekorder::{ContainerInfo, DaqRecord, Error, FileHeader, LogSummary};
use serde_json::{json, Value};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Text for terminals
    Human,
    /// JSON for scripts
    Json,
}

fn ratio_text(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.3}", r),
        None => "n/a".to_string(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Header of one file.
pub fn format_info(path: &Path, header: &FileHeader, file_len: u64, mode: OutputMode) -> String {
    let compression = if header.is_zstd() { "zstd" } else { "lz4" };
    match mode {
        OutputMode::Json => pretty(&json!({
            "path": path.display().to_string(),
            "file_len": file_len,
            "version": format!("{:#06x}", header.version),
            "options": header.options,
            "compression": compression,
            "num_containers": header.num_containers,
            "record_count": header.record_count,
            "size_compressed": header.size_compressed,
            "size_uncompressed": header.size_uncompressed,
            "compression_ratio": header.compression_ratio(),
        })),
        OutputMode::Human => {
            let mut out = String::new();
            let _ = writeln!(out, "file:              {}", path.display());
            let _ = writeln!(out, "file length:       {}", file_len);
            let _ = writeln!(out, "version:           {:#06x}", header.version);
            let _ = writeln!(out, "compression:       {}", compression);
            let _ = writeln!(out, "containers:        {}", header.num_containers);
            let _ = writeln!(out, "records:           {}", header.record_count);
            let _ = writeln!(out, "size compressed:   {}", header.size_compressed);
            let _ = writeln!(out, "size uncompressed: {}", header.size_uncompressed);
            let _ = write!(
                out,
                "ratio:             {}",
                ratio_text(header.compression_ratio())
            );
            out
        }
    }
}

/// Container table.
pub fn format_containers(containers: &[ContainerInfo], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_value(containers)
            .map(|v| pretty(&v))
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputMode::Human => {
            let mut out = format!(
                "{:>6} {:>12} {:>8} {:>12} {:>12}",
                "index", "offset", "records", "compressed", "uncompressed"
            );
            for c in containers {
                let _ = write!(
                    out,
                    "\n{:>6} {:>12} {:>8} {:>12} {:>12}{}",
                    c.index,
                    c.offset,
                    c.record_count,
                    c.size_compressed,
                    c.size_uncompressed,
                    if c.is_stored() { "  (stored)" } else { "" }
                );
            }
            out
        }
    }
}

/// One record per line (human) or an array (JSON).
pub fn format_records(records: &[DaqRecord], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&Value::Array(
            records
                .iter()
                .map(|r| {
                    json!({
                        "category": r.category,
                        "counter": r.counter,
                        "timestamp": r.timestamp,
                        "payload": hex(&r.payload),
                    })
                })
                .collect(),
        )),
        OutputMode::Human => records
            .iter()
            .map(|r| {
                format!(
                    "{:>3} {:>5} {:>14.6} {}",
                    r.category,
                    r.counter,
                    r.timestamp,
                    hex(&r.payload)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Result of a successful verification.
pub fn format_summary(summary: &LogSummary, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(&json!({
            "ok": true,
            "summary": summary,
            "compression_ratio": summary.compression_ratio(),
        })),
        OutputMode::Human => format!(
            "OK: {} containers ({} stored), {} records, {} -> {} bytes, ratio {}, {} trailing bytes",
            summary.containers,
            summary.stored_containers,
            summary.records,
            summary.size_uncompressed,
            summary.size_compressed,
            ratio_text(summary.compression_ratio()),
            summary.trailing_bytes
        ),
    }
}

/// Error for stderr.
pub fn format_error(e: &Error, mode: OutputMode) -> String {
    let kind = match e {
        Error::Io(_) => "io",
        Error::Format(_) => "format",
        Error::Closed | Error::InvalidConfig(_) => "usage",
        Error::CapacityExceeded(_) => "capacity",
    };
    match mode {
        OutputMode::Json => json!({ "error": e.to_string(), "kind": kind }).to_string(),
        OutputMode::Human => format!("(error) {}", e),
    }
}

//! Plain-text table rendering for listings.

use crate::models::{bucket::Bucket, object::ObjectEntry};
use chrono::{DateTime, Utc};
use std::io::{self, Write};

const SIZE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human-readable size with binary multiples, `-` when unknown.
///
/// At most two decimals are kept and trailing zeros dropped: `1536 -> "1.5 KB"`.
pub fn format_size(bytes: Option<i64>) -> String {
    let Some(bytes) = bytes else {
        return "-".into();
    };
    if bytes <= 0 {
        return format!("{} Bytes", bytes.max(0));
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// `YYYY-MM-DD HH:MM` in UTC, `-` when unknown.
pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn write_buckets<W: Write>(out: &mut W, buckets: &[Bucket]) -> io::Result<()> {
    if buckets.is_empty() {
        return writeln!(out, "No buckets found");
    }

    let width = name_width(buckets.iter().map(|b| b.name.len()));
    writeln!(out, "{:<width$}  {}", "NAME", "CREATED")?;
    for bucket in buckets {
        writeln!(
            out,
            "{:<width$}  {}",
            bucket.name,
            format_date(bucket.created_at.as_ref())
        )?;
    }
    Ok(())
}

/// Directories are shown with a trailing `/`.
pub fn write_objects<W: Write>(out: &mut W, entries: &[ObjectEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No objects found");
    }

    let display: Vec<String> = entries
        .iter()
        .map(|e| {
            if e.is_dir {
                format!("{}/", e.key)
            } else {
                e.key.clone()
            }
        })
        .collect();
    let width = name_width(display.iter().map(String::len));

    writeln!(out, "{:<width$}  {:>10}  {}", "NAME", "SIZE", "LAST MODIFIED")?;
    for (entry, name) in entries.iter().zip(&display) {
        writeln!(
            out,
            "{:<width$}  {:>10}  {}",
            name,
            format_size(entry.size),
            format_date(entry.last_modified.as_ref())
        )?;
    }
    Ok(())
}

fn name_width(lengths: impl Iterator<Item = usize>) -> usize {
    lengths.max().unwrap_or(0).max("NAME".len())
}

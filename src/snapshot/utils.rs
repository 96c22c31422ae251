// src/snapshot/utils.rs
//! Utility functions for snapshot generation

use std::fs;
use std::path::Path;

use crate::Result;

const SNAPSHOT_SUBDIRS: [&str; 2] = ["decisions", "forecasts"];
pub(crate) const README_FILE: &str = "README.md";

/// Convert a title to a URL-safe slug
///
/// - Converts to lowercase
/// - Replaces spaces and special chars with hyphens
/// - Collapses consecutive hyphens and trims them at both ends
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// File name for a record: `{id:03}-{slug}.md`
pub fn record_filename(id: u64, title: &str) -> String {
    format!("{:03}-{}.md", id, slugify(title))
}

/// Ensure the snapshot directory structure exists
pub fn ensure_snapshot_dirs(snapshot_dir: &Path) -> Result<()> {
    for subdir in SNAPSHOT_SUBDIRS {
        fs::create_dir_all(snapshot_dir.join(subdir))?;
    }
    Ok(())
}

/// Remove previously generated snapshot entries. Anything else in the
/// directory is left alone.
pub fn clear_snapshot_dir(snapshot_dir: &Path) -> Result<()> {
    for subdir in SNAPSHOT_SUBDIRS {
        let path = snapshot_dir.join(subdir);
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        }
    }
    let readme = snapshot_dir.join(README_FILE);
    if readme.is_file() {
        fs::remove_file(readme)?;
    }
    Ok(())
}

/// Write content to a file, creating parent directories if needed
pub fn write_snapshot_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Format a DateTime as full ISO timestamp
pub fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Render a signed amount with thousands separators, e.g. `-25,000`.
pub fn format_amount(amount: i128) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

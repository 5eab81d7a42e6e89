//! Small helpers shared across modules: sizes and output names.

use chrono::{DateTime, Utc};

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

/// Suggested name for a merged artifact, `<prefix>_<unix-millis>.pdf`.
pub fn output_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.pdf", at.timestamp_millis())
}

/// [`output_file_name`] stamped with the current time.
pub fn timestamped_output_name(prefix: &str) -> String {
    output_file_name(prefix, Utc::now())
}

/// Case-insensitive check that `name` ends in `.<extension>`.
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.to_lowercase()
        .ends_with(&format!(".{}", extension.to_lowercase()))
}

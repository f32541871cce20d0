//! Human-readable sizes and names for progress output.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const MAX_NAME_LEN: usize = 32;
const TRUNCATED_NAME_LEN: usize = 23;

/// Formats a byte count with binary (1024) steps and up to two decimals.
///
/// ```
/// use media_transfer::display::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit + 1 < UNITS.len() && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / divisor as f64;
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Shortens long file names for single-line display.
///
/// Names of 32 characters or more keep their first 23 characters followed by
/// `...`.
#[must_use]
pub fn format_file_name(name: &str) -> String {
    if name.chars().count() >= MAX_NAME_LEN {
        let head: String = name.chars().take(TRUNCATED_NAME_LEN).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

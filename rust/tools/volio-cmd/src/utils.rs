//! Common utilities for volio-cmd

/// Formats a byte count in human-readable form.
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Formats `size` exactly when `bytes` is set, human-readable otherwise.
pub fn display_size(size: u64, bytes: bool) -> String {
    if bytes {
        size.to_string()
    } else {
        format_size(size)
    }
}

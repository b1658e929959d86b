//! Human-readable byte counts and tallies for summaries.
//!
//! Sizes are `u64` bytes everywhere in the pipeline; floating point only
//! appears here, at the display boundary.

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Format a byte count using binary multiples (1 KB = 1024 B).
///
/// Bytes are shown exactly; KB and MB with one decimal, GB and above with two.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit >= 2 {
        format!("{value:.2} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Format a count with thousands separators (`1234567` → `1,234,567`).
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

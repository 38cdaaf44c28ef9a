const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Round to `digits` significant decimal digits, half up.
/// So 1_234_567 becomes 1_230_000 with 3 digits.
pub fn round_sig(value: u64, digits: u32) -> u64 {
    if value == 0 || digits == 0 {
        return value;
    }
    let len = value.ilog10() + 1;
    if len <= digits {
        return value;
    }
    let factor = 10u64.pow(len - digits);
    let truncated = value / factor;
    let up = u64::from(value % factor >= factor / 2);
    //rounding up the largest values would overflow, fall back to truncation
    (truncated + up)
        .checked_mul(factor)
        .unwrap_or(truncated * factor)
}

/// Human readable size with a 1024 base
pub fn human_size(size: u64) -> String {
    match size {
        s if s >= GB => format!("{:.2} GB", s as f64 / GB as f64),
        s if s >= MB => format!("{:.2} MB", s as f64 / MB as f64),
        s if s >= KB => format!("{:.2} KB", s as f64 / KB as f64),
        s => format!("{s} B"),
    }
}

/// Parse `10`, `1.5MB`, `20kb` into bytes
pub fn parse_size(input: &str) -> Option<u64> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let number: f64 = number.parse().ok()?;
    let multiplier = match unit.to_uppercase().as_str() {
        "" | "B" => 1,
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        _ => return None,
    };
    Some((number * multiplier as f64) as u64)
}

use crate::state::channel::ChannelRole;

// Match on word starts so "Time Stamp" is not mistaken for "Amp".
fn has_word_prefix(text: &str, prefixes: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| prefixes.iter().any(|p| word.starts_with(p)))
}

/// Guess which channel a column holds from its header.
pub fn infer_role(column_name: &str) -> Option<ChannelRole> {
    let lower = column_name.trim().to_lowercase();

    if has_word_prefix(&lower, &["amp", "current"]) {
        Some(ChannelRole::Current)
    } else if has_word_prefix(&lower, &["volt", "clamp"]) {
        Some(ChannelRole::Companion)
    } else {
        None
    }
}

/// Whether a header names the relative-time column.
pub fn is_time_column(column_name: &str) -> bool {
    let lower = column_name.trim().to_lowercase();
    lower.contains("time") && !lower.contains("stamp")
}

/// Infer the measurement unit from a column name.
pub fn infer_unit(column_name: &str) -> String {
    let lower = column_name.to_lowercase();

    if let (Some(open), Some(close)) = (column_name.find('['), column_name.rfind(']')) {
        if open < close {
            return column_name[open + 1..close].trim().to_string();
        }
    }

    match infer_role(column_name) {
        Some(ChannelRole::Current) => "A".to_string(),
        Some(ChannelRole::Companion) => "V".to_string(),
        None if lower.contains("time") => "s".to_string(),
        None => "units".to_string(),
    }
}

//! Field-name humanization
//!
//! Labels fall back to a formatted version of the field name when no
//! override supplies one: each underscore-delimited word is
//! title-cased, except for a fixed list of abbreviations that stay in
//! capitals (and their irregular plurals).

// ============================================================================
// Abbreviation dictionary
// ============================================================================

/// Words rendered in capitals instead of title case, including the
/// irregular plurals ("TLs", not "Tls").
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("ids", "IDs"),
    ("url", "URL"),
    ("urls", "URLs"),
    ("fy", "FY"),
    ("fys", "FYs"),
    ("tl", "TL"),
    ("tls", "TLs"),
    ("gpa", "GPA"),
];

// ============================================================================
// Humanize
// ============================================================================

/// Format a snake_case field name as a human-readable label.
///
/// `"school_id"` becomes `"School ID"`, `"fy_start"` becomes
/// `"FY Start"`, `"amount_issued"` becomes `"Amount Issued"`.
pub fn humanize(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(format_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((_, replacement)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == lower) {
        return (*replacement).to_string();
    }

    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_humanize_simple() {
        assert_eq!(humanize("email"), "Email");
        assert_eq!(humanize("amount_issued"), "Amount Issued");
        assert_eq!(humanize("created_at"), "Created At");
    }

    #[test]
    fn test_humanize_abbreviations() {
        assert_eq!(humanize("school_id"), "School ID");
        assert_eq!(humanize("photo_url"), "Photo URL");
        assert_eq!(humanize("fy_start"), "FY Start");
        assert_eq!(humanize("current_tl"), "Current TL");
    }

    #[test]
    fn test_humanize_irregular_plurals() {
        assert_eq!(humanize("tls"), "TLs");
        assert_eq!(humanize("report_object_ids"), "Report Object IDs");
        assert_eq!(humanize("public_urls"), "Public URLs");
    }

    #[test]
    fn test_humanize_collapses_empty_segments() {
        assert_eq!(humanize("__weird__name"), "Weird Name");
        assert_eq!(humanize(""), "");
    }
}

//! Value transformation
//!
//! Turns raw cell values into display strings against a resolved field
//! descriptor: label substitution, array truncation, Yes/No booleans,
//! date and currency formatting, and attachment-id to public-URL
//! resolution. Everything except the attachment path is pure.

use crate::config::EngineConfig;
use crate::resolver::FieldDescriptor;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tabula_core::{FieldType, ObjectStore, OptionItem, Row};

// ============================================================================
// Raw text
// ============================================================================

/// The plain-text form of a raw value: strings unquoted, null empty,
/// everything else in its JSON form.
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Format a number as currency with zero decimal places and thousands
/// grouping: `1000` becomes `"$1,000"`.
pub fn format_currency(symbol: &str, value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round() as i64;
    let grouped = group_thousands(rounded.unsigned_abs());
    if rounded < 0 {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

fn group_thousands(mut n: u64) -> String {
    let mut parts = Vec::new();
    loop {
        if n < 1000 {
            parts.push(n.to_string());
            break;
        }
        parts.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    parts.reverse();
    parts.join(",")
}

/// Parse a stored date string and render it with the configured
/// format. Returns `None` when the value does not parse, so the caller
/// can fall back to the raw value instead of failing.
pub fn format_date(raw: &str, format: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format(format).to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.format(format).to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format(format).to_string());
    }
    None
}

/// Substitute a raw value for its option label, falling back to the
/// raw text when no option matches.
pub fn substitute_label(text: &str, options: &[OptionItem]) -> String {
    options
        .iter()
        .find(|option| option.value == text)
        .map_or_else(|| text.to_string(), |option| option.label.clone())
}

/// Label-substitute and join an array, truncating to `max_entries`
/// with a `"+N more"` suffix where N is the hidden remainder.
pub fn join_labels(
    values: &[Value],
    options: Option<&[OptionItem]>,
    separator: &str,
    max_entries: Option<u32>,
) -> String {
    let labels: Vec<String> = values
        .iter()
        .map(|value| {
            let text = raw_text(value);
            match options {
                Some(options) => substitute_label(&text, options),
                None => text,
            }
        })
        .collect();

    match max_entries.map(|m| m as usize) {
        Some(max) if labels.len() > max => {
            let shown = labels[..max].join(separator);
            format!("{shown} +{} more", labels.len() - max)
        }
        _ => labels.join(separator),
    }
}

// ============================================================================
// Scalar display
// ============================================================================

/// Render every non-attachment value. Pure.
pub fn display_scalar(
    value: &Value,
    descriptor: &FieldDescriptor,
    options: Option<&[OptionItem]>,
    config: &EngineConfig,
    max_entries: Option<u32>,
) -> String {
    if value.is_null() {
        return String::new();
    }

    match descriptor.field_type {
        FieldType::Boolean => match value {
            Value::Bool(true) => "Yes".to_string(),
            Value::Bool(false) => "No".to_string(),
            other => raw_text(other),
        },

        FieldType::Date => {
            let text = raw_text(value);
            format_date(&text, &config.date_format).unwrap_or(text)
        }

        FieldType::Number => match value.as_f64() {
            Some(number) if config.is_currency_field(&descriptor.field) => {
                format_currency(&config.currency_symbol, number)
            }
            _ => raw_text(value),
        },

        FieldType::Enum => {
            let text = raw_text(value);
            match options {
                Some(options) => substitute_label(&text, options),
                None => text,
            }
        }

        FieldType::Array => match value {
            Value::Array(items) => join_labels(
                items,
                options,
                &config.array_separator,
                max_entries.or(descriptor.max_array_entries),
            ),
            other => raw_text(other),
        },

        FieldType::Json => value.to_string(),

        FieldType::String => raw_text(value),

        // Attachments resolve through the async path; the raw id is
        // the best a synchronous caller can get
        FieldType::Attachment | FieldType::AttachmentArray => raw_text(value),
    }
}

// ============================================================================
// Attachment display
// ============================================================================

/// Render an attachment field: URL-shaped values pass through, object
/// ids resolve to public URLs, and unresolvable ids fall back to a
/// sibling URL or the raw id.
pub async fn display_attachment<B: ObjectStore>(
    value: &Value,
    descriptor: &FieldDescriptor,
    row: &Row,
    objects: &B,
    config: &EngineConfig,
) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(items) => {
            let mut urls = Vec::with_capacity(items.len());
            for item in items {
                let url = resolve_one(item, descriptor, row, objects, config).await;
                if !url.is_empty() {
                    urls.push(url);
                }
            }
            urls.join(&config.array_separator)
        }
        scalar => resolve_one(scalar, descriptor, row, objects, config).await,
    }
}

async fn resolve_one<B: ObjectStore>(
    raw: &Value,
    descriptor: &FieldDescriptor,
    row: &Row,
    objects: &B,
    config: &EngineConfig,
) -> String {
    let text = raw_text(raw);
    if text.is_empty() {
        return text;
    }
    if text.starts_with("http://") || text.starts_with("https://") {
        return text;
    }

    let path = match objects.object_path(&text).await {
        Ok(Some(path)) => Some(path),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(id = %text, error = %e, "primary object lookup failed");
            None
        }
    };

    let path = match path {
        Some(path) => Some(path),
        None => match objects.object_path_fallback(&text).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(id = %text, error = %e, "fallback object lookup failed");
                None
            }
        },
    };

    match path {
        Some(path) => {
            let bucket = descriptor
                .bucket
                .as_deref()
                .unwrap_or_else(|| config.bucket_for(&descriptor.field, &descriptor.table.table));
            objects.public_url(bucket, &path)
        }
        None => sibling_url(row).unwrap_or_else(|| {
            tracing::warn!(id = %text, field = %descriptor.field, "attachment unresolved, showing raw id");
            text
        }),
    }
}

/// Last-resort heuristic: a sibling field on the same row that already
/// holds a ready-made URL.
fn sibling_url(row: &Row) -> Option<String> {
    row.iter().find_map(|(field, value)| {
        if !field.contains("url") {
            return None;
        }
        value
            .as_str()
            .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
            .map(str::to_string)
    })
}

// ============================================================================
// Dispatch
// ============================================================================

/// Render one field of a row against its descriptor.
pub async fn render_value<B: ObjectStore>(
    value: &Value,
    descriptor: &FieldDescriptor,
    options: Option<&[OptionItem]>,
    row: &Row,
    objects: &B,
    config: &EngineConfig,
    max_entries: Option<u32>,
) -> String {
    if descriptor.field_type.is_attachment() {
        display_attachment(value, descriptor, row, objects, config).await
    } else {
        display_scalar(value, descriptor, options, config, max_entries)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjects;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tabula_core::{TableRef, UpdateMode};

    fn descriptor(field: &str, field_type: FieldType) -> FieldDescriptor {
        FieldDescriptor {
            table: TableRef::parse("loans"),
            field: field.to_string(),
            label: field.to_string(),
            field_type,
            is_array: false,
            multiline: false,
            width: None,
            options: None,
            editable: true,
            required: false,
            max_length: None,
            max_array_entries: None,
            write_table: None,
            write_key_column: None,
            bucket: None,
            is_image: false,
            visible_when: None,
            update_mode: UpdateMode::Yes,
            schema_known: true,
        }
    }

    #[test]
    fn test_raw_text_forms() {
        assert_eq!(raw_text(&json!(null)), "");
        assert_eq!(raw_text(&json!("open")), "open");
        assert_eq!(raw_text(&json!(12.5)), "12.5");
        assert_eq!(raw_text(&json!(true)), "true");
        assert_eq!(raw_text(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency("$", 1000.0), "$1,000");
        assert_eq!(format_currency("$", 0.0), "$0");
        assert_eq!(format_currency("$", 1_234_567.0), "$1,234,567");
        assert_eq!(format_currency("$", 999.6), "$1,000");
        assert_eq!(format_currency("$", -1234.0), "-$1,234");
    }

    #[test]
    fn test_date_formats() {
        let fmt = "%b %-d, %Y";
        assert_eq!(format_date("2024-01-01", fmt).as_deref(), Some("Jan 1, 2024"));
        assert_eq!(
            format_date("2024-03-15T10:30:00+00:00", fmt).as_deref(),
            Some("Mar 15, 2024")
        );
        assert_eq!(
            format_date("2024-03-15 10:30:00", fmt).as_deref(),
            Some("Mar 15, 2024")
        );
        assert!(format_date("not a date", fmt).is_none());
    }

    #[test]
    fn test_invalid_date_displays_raw() {
        let config = EngineConfig::default();
        let d = descriptor("issue_date", FieldType::Date);
        assert_eq!(
            display_scalar(&json!("soonish"), &d, None, &config, None),
            "soonish"
        );
    }

    #[test]
    fn test_boolean_yes_no() {
        let config = EngineConfig::default();
        let d = descriptor("repaid", FieldType::Boolean);
        assert_eq!(display_scalar(&json!(false), &d, None, &config, None), "No");
        assert_eq!(display_scalar(&json!(true), &d, None, &config, None), "Yes");
    }

    #[test]
    fn test_currency_applies_by_field_name() {
        let config = EngineConfig::default();
        let amount = descriptor("amount_issued", FieldType::Number);
        assert_eq!(
            display_scalar(&json!(1000), &amount, None, &config, None),
            "$1,000"
        );

        let other = descriptor("score", FieldType::Number);
        assert_eq!(display_scalar(&json!(1000), &other, None, &config, None), "1000");
    }

    #[test]
    fn test_enum_label_substitution_with_fallback() {
        let config = EngineConfig::default();
        let d = descriptor("school_id", FieldType::Enum);
        let options = [OptionItem::new("S1", "Hilltop")];

        assert_eq!(
            display_scalar(&json!("S1"), &d, Some(&options), &config, None),
            "Hilltop"
        );
        assert_eq!(
            display_scalar(&json!("S9"), &d, Some(&options), &config, None),
            "S9"
        );
    }

    #[test]
    fn test_array_truncation_suffix() {
        let config = EngineConfig::default();
        let d = descriptor("borrowers", FieldType::Array);
        let options = [
            OptionItem::new("P1", "Imani"),
            OptionItem::new("P2", "Wanjiru"),
        ];

        let value = json!(["P1", "P2", "P3", "P4", "P5"]);
        let display = display_scalar(&value, &d, Some(&options), &config, Some(2));

        assert_eq!(display, "Imani, Wanjiru +3 more");
        assert!(display.ends_with("+3 more"));
    }

    #[test]
    fn test_array_without_limit_joins_all() {
        let config = EngineConfig::default();
        let d = descriptor("borrowers", FieldType::Array);
        let display = display_scalar(&json!(["a", "b"]), &d, None, &config, None);
        assert_eq!(display, "a, b");
    }

    #[test]
    fn test_null_displays_empty() {
        let config = EngineConfig::default();
        for field_type in [FieldType::String, FieldType::Number, FieldType::Date] {
            let d = descriptor("anything", field_type);
            assert_eq!(display_scalar(&Value::Null, &d, None, &config, None), "");
        }
    }

    #[tokio::test]
    async fn test_url_shaped_attachment_passes_through() {
        let objects = MemoryObjects::new("https://objects.example");
        let config = EngineConfig::default();
        let d = descriptor("photo_object_id", FieldType::Attachment);
        let row = Row::new();

        let display = display_attachment(
            &json!("https://cdn.example/photo.jpg"),
            &d,
            &row,
            &objects,
            &config,
        )
        .await;

        assert_eq!(display, "https://cdn.example/photo.jpg");
        // The object store must not be consulted at all
        assert_eq!(objects.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_object_id_resolves_to_public_url() {
        let objects = MemoryObjects::new("https://objects.example")
            .with_object("11111111-1111-1111-1111-111111111111", "2024/photo.jpg");
        let config = EngineConfig::default();
        let d = descriptor("photo_object_id", FieldType::Attachment);

        let display = display_attachment(
            &json!("11111111-1111-1111-1111-111111111111"),
            &d,
            &Row::new(),
            &objects,
            &config,
        )
        .await;

        assert_eq!(display, "https://objects.example/attachments/2024/photo.jpg");
    }

    #[tokio::test]
    async fn test_fallback_view_consulted_after_primary_miss() {
        let objects = MemoryObjects::new("https://objects.example")
            .with_fallback_object("legacy-1", "old/scan.pdf");
        let config = EngineConfig::default();
        let mut d = descriptor("report_object_id", FieldType::Attachment);
        d.bucket = Some("reports".to_string());

        let display =
            display_attachment(&json!("legacy-1"), &d, &Row::new(), &objects, &config).await;

        assert_eq!(display, "https://objects.example/reports/old/scan.pdf");
    }

    #[tokio::test]
    async fn test_unresolved_attachment_uses_sibling_url() {
        let objects = MemoryObjects::new("https://objects.example");
        let config = EngineConfig::default();
        let d = descriptor("photo_object_id", FieldType::Attachment);

        let mut row = Row::new();
        row.insert(
            "photo_public_url".to_string(),
            json!("https://cdn.example/fallback.jpg"),
        );

        let display = display_attachment(&json!("missing-id"), &d, &row, &objects, &config).await;
        assert_eq!(display, "https://cdn.example/fallback.jpg");
    }

    #[tokio::test]
    async fn test_unresolved_attachment_without_sibling_shows_raw_id() {
        let objects = MemoryObjects::new("https://objects.example");
        let config = EngineConfig::default();
        let d = descriptor("photo_object_id", FieldType::Attachment);

        let display =
            display_attachment(&json!("missing-id"), &d, &Row::new(), &objects, &config).await;
        assert_eq!(display, "missing-id");
    }
}

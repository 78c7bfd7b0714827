//! Naming-convention type inference
//!
//! When neither an override nor the schema catalog pins a field's
//! type, the field name itself decides. The rules live in one ordered
//! table; evaluation is first-match-wins, so the precedence is
//! enforceable and testable in isolation from the rest of the
//! resolver.

// ============================================================================
// InferredType
// ============================================================================

/// What naming-convention inference can conclude about a field.
///
/// `Lookup` is an intermediate: it never appears on a resolved
/// descriptor. A lookup scalar becomes `Enum` once options attach and
/// degrades to `String` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Attachment,
    AttachmentArray,
    Enum,
    Lookup,
    Date,
    String,
}

// ============================================================================
// FieldFacts
// ============================================================================

/// The facts a rule may inspect.
#[derive(Debug, Clone, Copy)]
pub struct FieldFacts<'a> {
    /// Field name
    pub field: &'a str,

    /// Whether the column holds an array
    pub is_array: bool,

    /// Database enum backing the column, if any
    pub enum_ref: Option<&'a str>,
}

// ============================================================================
// Rule table
// ============================================================================

/// One inference rule: a named predicate and the type it concludes.
pub struct InferenceRule {
    /// Stable rule name, for diagnostics
    pub name: &'static str,

    /// Predicate over the field facts
    pub matches: fn(&FieldFacts) -> bool,

    /// Type concluded when the predicate holds
    pub inferred: InferredType,
}

/// The ordered rule table. Order is load-bearing: the plural
/// `object_ids` rule must precede the singular substring match, and
/// the enum-reference rule must precede the `_id` suffix rule.
pub const INFERENCE_RULES: &[InferenceRule] = &[
    InferenceRule {
        name: "object_id_list",
        matches: |f| f.field.contains("object_ids"),
        inferred: InferredType::Attachment,
    },
    InferenceRule {
        name: "object_id",
        matches: |f| f.field.contains("object_id"),
        inferred: InferredType::Attachment,
    },
    InferenceRule {
        name: "public_url_list",
        matches: |f| f.field.contains("public_url") && f.is_array,
        inferred: InferredType::AttachmentArray,
    },
    InferenceRule {
        name: "enum_reference",
        matches: |f| f.enum_ref.is_some(),
        inferred: InferredType::Enum,
    },
    InferenceRule {
        name: "id_suffix",
        // The primary key itself and archival bookkeeping columns stay raw
        matches: |f| f.field.ends_with("_id") && f.field != "id" && !f.field.starts_with("archived"),
        inferred: InferredType::Lookup,
    },
    InferenceRule {
        name: "date_name",
        matches: |f| f.field.contains("date") || f.field.contains("_at"),
        inferred: InferredType::Date,
    },
];

/// Run the rule table over a field. First match wins; no match means
/// plain string.
pub fn infer(facts: &FieldFacts) -> InferredType {
    INFERENCE_RULES
        .iter()
        .find(|rule| (rule.matches)(facts))
        .map_or(InferredType::String, |rule| rule.inferred)
}

/// Name of the rule that decided a field, for diagnostics.
pub fn matching_rule(facts: &FieldFacts) -> Option<&'static str> {
    INFERENCE_RULES
        .iter()
        .find(|rule| (rule.matches)(facts))
        .map(|rule| rule.name)
}

// ============================================================================
// Tests
// ============================================================================

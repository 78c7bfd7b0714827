//! Field descriptor resolution
//!
//! Merges three partially-overlapping metadata sources into one
//! complete, self-consistent field descriptor:
//!
//! 1. hand-authored overrides (always win),
//! 2. generated schema metadata + lookup registry output,
//! 3. naming-convention inference (the fallback).
//!
//! Resolution is total: a field absent from every source still yields
//! a usable string descriptor, because override-only virtual fields
//! are legal.

use crate::infer::{self, FieldFacts, InferredType};
use std::sync::Arc;
use tabula_catalog::{
    ColumnInfo, FieldOverride, LookupRef, LookupRegistry, LookupSpec, SchemaCatalog, VisibilityRule,
};
use tabula_core::{FieldType, OptionItem, TableRef, UpdateMode, humanize};

// ============================================================================
// OptionsSource
// ============================================================================

/// Where a field's option set comes from.
///
/// The resolver is synchronous and never queries the store, so lookup
/// options are carried as a spec for the option cache to materialize.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsSource {
    /// Fixed options known at resolution time (enum catalogue,
    /// explicit override list)
    Static(Vec<OptionItem>),

    /// Options served by a lookup table, loaded through the option
    /// cache
    Lookup(LookupSpec),
}

// ============================================================================
// FieldDescriptor
// ============================================================================

/// The fully resolved metadata for one field.
///
/// Invariants: `field_type` and `label` are always present; when
/// `options` is set, `field_type` is `Enum` or `Array`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Table the field is read from
    pub table: TableRef,

    /// Field name
    pub field: String,

    /// Display label
    pub label: String,

    /// Resolved type
    pub field_type: FieldType,

    /// Whether the field holds an array
    pub is_array: bool,

    /// Render as a multi-line editor
    pub multiline: bool,

    /// Column width hint, in pixels
    pub width: Option<u32>,

    /// Option set, when the field is a selection
    pub options: Option<OptionsSource>,

    /// Whether edits are accepted
    pub editable: bool,

    /// Whether a value is required on save
    pub required: bool,

    /// Maximum text length
    pub max_length: Option<u32>,

    /// Maximum displayed array entries before truncation
    pub max_array_entries: Option<u32>,

    /// Table this field is read from and written to instead of the
    /// entity's own table
    pub write_table: Option<String>,

    /// Column on `write_table` keyed by the entity id
    pub write_key_column: Option<String>,

    /// Storage bucket for attachment fields
    pub bucket: Option<String>,

    /// Treat the attachment as an image
    pub is_image: bool,

    /// Visibility predicate
    pub visible_when: Option<VisibilityRule>,

    /// Write participation
    pub update_mode: UpdateMode,

    /// Whether the schema catalog knows this field
    pub schema_known: bool,
}

impl FieldDescriptor {
    /// Check whether the descriptor carries a lookup to materialize
    pub fn lookup_spec(&self) -> Option<&LookupSpec> {
        match &self.options {
            Some(OptionsSource::Lookup(spec)) => Some(spec),
            _ => None,
        }
    }

    /// Static options, when already known at resolution time
    pub fn static_options(&self) -> Option<&[OptionItem]> {
        match &self.options {
            Some(OptionsSource::Static(options)) => Some(options.as_slice()),
            _ => None,
        }
    }
}

// ============================================================================
// InferredDefaults
// ============================================================================

/// What the catalogs and naming conventions conclude before the
/// override is consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredDefaults {
    /// Humanized label
    pub label: String,

    /// Preliminary type (before options normalization)
    pub field_type: FieldType,

    /// Whether inference concluded a lookup scalar
    pub is_lookup: bool,

    /// Array-ness from the schema
    pub is_array: bool,

    /// Default editability (schema-known and cross-table fields are
    /// editable; virtual fields are not)
    pub editable: bool,

    /// Whether the schema catalog knows this field
    pub schema_known: bool,
}

// ============================================================================
// FieldResolver
// ============================================================================

/// Resolves `(table, field, override)` triples into descriptors.
///
/// Cheap to clone; the catalogs are shared.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    schema: Arc<SchemaCatalog>,
    lookups: Arc<LookupRegistry>,
}

impl FieldResolver {
    /// Create a resolver over the loaded catalogs
    pub fn new(schema: Arc<SchemaCatalog>, lookups: Arc<LookupRegistry>) -> Self {
        Self { schema, lookups }
    }

    /// Resolve one field. Total: unknown fields degrade to a plain
    /// string descriptor instead of failing.
    pub fn resolve(
        &self,
        table: &TableRef,
        field: &str,
        override_: Option<&FieldOverride>,
    ) -> FieldDescriptor {
        let default_override = FieldOverride::default();
        let override_ = override_.unwrap_or(&default_override);

        // Cross-table fields carry their column metadata on the table
        // they are actually stored in.
        let column = self.schema.column(table, field).or_else(|| {
            override_
                .write_table
                .as_deref()
                .and_then(|wt| self.schema.column(&TableRef::parse(wt), field))
        });

        if column.is_none() && override_.is_empty() {
            tracing::debug!(table = %table, field, "schema catalog miss, degrading to string descriptor");
        }

        let inferred = self.inferred_defaults(field, column, override_);
        let options = self.resolve_options(table, field, column, override_, &inferred);

        merge(table, field, inferred, options, override_)
    }

    /// Build the pre-override conclusions for a field.
    fn inferred_defaults(
        &self,
        field: &str,
        column: Option<&ColumnInfo>,
        override_: &FieldOverride,
    ) -> InferredDefaults {
        let schema_known = column.is_some();
        let is_array = column.map_or(false, |c| c.is_array);

        let facts = FieldFacts {
            field,
            is_array,
            enum_ref: column.and_then(|c| c.enum_ref.as_deref()),
        };

        // Typed schema columns win; strings fall through to the naming
        // conventions.
        let base = column.map(|c| c.base_type.field_type());
        let (field_type, is_lookup) = match base {
            Some(t @ (FieldType::Boolean | FieldType::Number | FieldType::Date | FieldType::Enum)) => {
                (t, false)
            }
            _ => match infer::infer(&facts) {
                InferredType::Attachment => (FieldType::Attachment, false),
                InferredType::AttachmentArray => (FieldType::AttachmentArray, false),
                InferredType::Enum => (FieldType::Enum, false),
                InferredType::Date => (FieldType::Date, false),
                InferredType::Lookup => (FieldType::String, true),
                InferredType::String => (FieldType::String, false),
            },
        };

        InferredDefaults {
            label: humanize(field),
            field_type,
            is_lookup,
            is_array,
            editable: schema_known || override_.write_table.is_some(),
            schema_known,
        }
    }

    /// The options precedence ladder. First success wins.
    fn resolve_options(
        &self,
        table: &TableRef,
        field: &str,
        column: Option<&ColumnInfo>,
        override_: &FieldOverride,
        inferred: &InferredDefaults,
    ) -> Option<OptionsSource> {
        // Attachments never carry option sets
        if inferred.field_type.is_attachment() {
            return None;
        }

        // Explicit option lists bypass the ladder entirely
        if let Some(options) = &override_.options {
            return Some(OptionsSource::Static(options.clone()));
        }

        // (a) override names an enum from the catalogue
        if let Some(name) = &override_.enum_name {
            if let Some(options) = self.lookups.enum_options(name) {
                return Some(OptionsSource::Static(options));
            }
            tracing::warn!(field, enum_name = %name, "override references unknown enum");
        }

        // (b) override names a registered lookup, or carries a spec
        match &override_.lookup {
            Some(LookupRef::Named(name)) => {
                if let Some(spec) = self.lookups.lookup(name) {
                    return Some(OptionsSource::Lookup(spec.clone()));
                }
                tracing::warn!(field, lookup = %name, "override references unknown lookup");
            }
            Some(LookupRef::Spec(spec)) => {
                return Some(OptionsSource::Lookup(spec.clone()));
            }
            None => {}
        }

        // (c) schema column carries a catalogued enum reference
        if let Some(enum_ref) = column.and_then(|c| c.enum_ref.as_ref()) {
            if let Some(options) = self.lookups.enum_options(enum_ref) {
                return Some(OptionsSource::Static(options));
            }
        }

        // (d) derived enum-name pairing from inference. A bare-field
        // lookup match outranks it: lookup-table labels beat
        // enum-value echo.
        if self.lookups.lookup(field).is_none() {
            if let Some(options) = self.lookups.enum_options(field) {
                return Some(OptionsSource::Static(options));
            }
        }

        // (e) direct schema.table.field -> enum mapping
        if let Some(enum_name) = self.lookups.field_enum(&table.schema, &table.table, field) {
            if let Some(options) = self.lookups.enum_options(enum_name) {
                return Some(OptionsSource::Static(options));
            }
        }

        // (f) foreign-key reference, label column guessed per table
        if let Some(fk) = column.and_then(|c| c.foreign_keys.first()) {
            let fk_table = TableRef::parse(&fk.table);
            let label_column = self.lookups.label_column_for(&fk_table.table);
            return Some(OptionsSource::Lookup(LookupSpec::new(
                fk.table.clone(),
                fk.column.clone(),
                label_column,
            )));
        }

        // (g) exact lookup-table match on the bare field name
        if let Some(spec) = self.lookups.lookup(field) {
            return Some(OptionsSource::Lookup(spec.clone()));
        }

        None
    }
}

// ============================================================================
// Merge
// ============================================================================

/// Merge inferred defaults, a resolved option source, and an authored
/// override into the final descriptor. Pure: neither input is mutated,
/// and override values always win.
pub fn merge(
    table: &TableRef,
    field: &str,
    inferred: InferredDefaults,
    options: Option<OptionsSource>,
    override_: &FieldOverride,
) -> FieldDescriptor {
    let is_array = override_.array.unwrap_or(inferred.is_array);

    let mut field_type = override_.field_type.unwrap_or(inferred.field_type);

    // Close the invariant: a non-empty option set forces enum (scalar)
    // or array; an optionless lookup scalar degrades to string.
    let has_options = match &options {
        Some(OptionsSource::Static(items)) => !items.is_empty(),
        Some(OptionsSource::Lookup(_)) => true,
        None => false,
    };
    if override_.field_type.is_none() {
        if has_options {
            field_type = if is_array { FieldType::Array } else { FieldType::Enum };
        } else {
            if inferred.is_lookup {
                field_type = FieldType::String;
            }
            if is_array && field_type == FieldType::String {
                field_type = FieldType::Array;
            }
        }
    }

    let editable = if override_.update_mode == UpdateMode::No {
        false
    } else {
        override_.editable.unwrap_or(inferred.editable)
    };

    FieldDescriptor {
        table: table.clone(),
        field: field.to_string(),
        label: override_.label.clone().unwrap_or(inferred.label),
        field_type,
        is_array,
        multiline: override_.multiline.unwrap_or(false),
        width: override_.width,
        options,
        editable,
        required: override_.required.unwrap_or(false),
        max_length: override_.max_length,
        max_array_entries: override_.max_array_entries,
        write_table: override_.write_table.clone(),
        write_key_column: override_.write_key_column.clone(),
        bucket: override_.bucket.clone(),
        is_image: override_.is_image.unwrap_or(false),
        visible_when: override_.visible_when.clone(),
        update_mode: override_.update_mode,
        schema_known: inferred.schema_known,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_catalog::ColumnInfo;
    use tabula_core::SchemaBaseType;

    fn catalogs() -> (Arc<SchemaCatalog>, Arc<LookupRegistry>) {
        let mut schema = SchemaCatalog::new();
        let loans = TableRef::parse("loans");
        schema.add_column(&loans, "id", ColumnInfo::new(SchemaBaseType::String));
        schema.add_column(
            &loans,
            "amount_issued",
            ColumnInfo::new(SchemaBaseType::Number),
        );
        schema.add_column(&loans, "issue_date", ColumnInfo::new(SchemaBaseType::Date));
        schema.add_column(&loans, "repaid", ColumnInfo::new(SchemaBaseType::Boolean));
        schema.add_column(
            &loans,
            "status",
            ColumnInfo::new(SchemaBaseType::Enum).with_enum("loan_status"),
        );
        schema.add_column(
            &loans,
            "school_id",
            ColumnInfo::new(SchemaBaseType::String).with_foreign_key("schools", "id"),
        );
        schema.add_column(
            &loans,
            "borrowers",
            ColumnInfo::new(SchemaBaseType::String).array(),
        );

        let people = TableRef::parse("people");
        schema.add_column(&people, "id", ColumnInfo::new(SchemaBaseType::String));

        let assoc = TableRef::parse("people_roles_associations");
        schema.add_column(&assoc, "role", ColumnInfo::new(SchemaBaseType::String));

        let mut lookups = LookupRegistry::new();
        lookups.add_enum(
            "loan_status",
            vec!["draft".into(), "open".into(), "repaid".into()],
        );
        lookups.add_enum("role", vec!["tl".into(), "mentor".into()]);
        lookups.add_lookup("schools", LookupSpec::id_name("schools"));

        (Arc::new(schema), Arc::new(lookups))
    }

    fn resolver() -> FieldResolver {
        let (schema, lookups) = catalogs();
        FieldResolver::new(schema, lookups)
    }

    #[test]
    fn test_every_descriptor_has_type_and_label() {
        let resolver = resolver();
        let loans = TableRef::parse("loans");
        for field in ["id", "amount_issued", "issue_date", "repaid", "status", "school_id"] {
            let descriptor = resolver.resolve(&loans, field, None);
            assert!(!descriptor.label.is_empty(), "label missing for {field}");
            // field_type is a non-optional enum by construction; check
            // array agreement with the schema instead
            let column = resolver.schema.column(&loans, field).unwrap();
            assert_eq!(descriptor.is_array, column.is_array, "array mismatch for {field}");
        }
    }

    #[test]
    fn test_schema_base_types_carry_through() {
        let resolver = resolver();
        let loans = TableRef::parse("loans");

        assert_eq!(
            resolver.resolve(&loans, "amount_issued", None).field_type,
            FieldType::Number
        );
        assert_eq!(
            resolver.resolve(&loans, "issue_date", None).field_type,
            FieldType::Date
        );
        assert_eq!(
            resolver.resolve(&loans, "repaid", None).field_type,
            FieldType::Boolean
        );
    }

    #[test]
    fn test_unknown_field_degrades_gracefully() {
        let resolver = resolver();
        let descriptor = resolver.resolve(&TableRef::parse("loans"), "virtual_note", None);

        assert_eq!(descriptor.field_type, FieldType::String);
        assert_eq!(descriptor.label, "Virtual Note");
        assert!(!descriptor.editable);
        assert!(!descriptor.schema_known);
        assert!(descriptor.options.is_none());
    }

    #[test]
    fn test_idempotent_resolution() {
        let resolver = resolver();
        let loans = TableRef::parse("loans");
        let override_ = FieldOverride::new().with_label("School").with_lookup("schools");

        let first = resolver.resolve(&loans, "school_id", Some(&override_));
        let second = resolver.resolve(&loans, "school_id", Some(&override_));
        assert_eq!(first, second);
    }

    #[test]
    fn test_override_label_wins() {
        let resolver = resolver();
        let override_ = FieldOverride::new().with_label("Issued");
        let descriptor =
            resolver.resolve(&TableRef::parse("loans"), "amount_issued", Some(&override_));
        assert_eq!(descriptor.label, "Issued");
    }

    #[test]
    fn test_label_falls_back_to_humanized_name() {
        let resolver = resolver();
        let descriptor = resolver.resolve(&TableRef::parse("loans"), "school_id", None);
        assert_eq!(descriptor.label, "School ID");
    }

    #[test]
    fn test_override_lookup_beats_schema_enum() {
        let resolver = resolver();
        let override_ = FieldOverride::new().with_lookup("schools");
        let descriptor = resolver.resolve(&TableRef::parse("loans"), "status", Some(&override_));

        // The schema column carries the loan_status enum, but the
        // explicit lookup outranks it.
        assert_eq!(
            descriptor.lookup_spec(),
            Some(&LookupSpec::id_name("schools"))
        );
    }

    #[test]
    fn test_schema_enum_reference_resolves() {
        let resolver = resolver();
        let descriptor = resolver.resolve(&TableRef::parse("loans"), "status", None);

        assert_eq!(descriptor.field_type, FieldType::Enum);
        let options = descriptor.static_options().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[1].value, "open");
    }

    #[test]
    fn test_foreign_key_lookup_with_guessed_label() {
        let resolver = resolver();
        let descriptor = resolver.resolve(&TableRef::parse("loans"), "school_id", None);

        assert_eq!(descriptor.field_type, FieldType::Enum);
        assert_eq!(
            descriptor.lookup_spec(),
            Some(&LookupSpec::new("schools", "id", "name"))
        );
    }

    #[test]
    fn test_lookup_match_suppresses_derived_enum() {
        let (schema, mut lookups) = {
            let (s, l) = catalogs();
            (s, Arc::unwrap_or_clone(l))
        };
        // A field named "schools": both a registered lookup and an enum
        // of the same name exist. The lookup must win, so the derived
        // enum pairing is skipped.
        lookups.add_enum("schools", vec!["a".into(), "b".into()]);
        let resolver = FieldResolver::new(schema, Arc::new(lookups));

        let descriptor = resolver.resolve(&TableRef::parse("loans"), "schools", None);
        assert_eq!(
            descriptor.lookup_spec(),
            Some(&LookupSpec::id_name("schools"))
        );
    }

    #[test]
    fn test_derived_enum_applies_without_lookup() {
        let resolver = resolver();
        // "role" has no registered lookup but an enum of that name
        let descriptor = resolver.resolve(&TableRef::parse("people_roles_associations"), "role", None);
        let options = descriptor.static_options().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(descriptor.field_type, FieldType::Enum);
    }

    #[test]
    fn test_options_invariant() {
        let resolver = resolver();
        let loans = TableRef::parse("loans");

        for field in ["id", "amount_issued", "issue_date", "repaid", "status", "school_id", "borrowers"] {
            let descriptor = resolver.resolve(&loans, field, None);
            if descriptor.options.is_some() {
                assert!(
                    descriptor.field_type.allows_options(),
                    "options present on non-selection type for {field}"
                );
            }
        }
    }

    #[test]
    fn test_array_lookup_normalizes_to_array_type() {
        let resolver = resolver();
        let override_ = FieldOverride::new().with_lookup("schools");
        let descriptor =
            resolver.resolve(&TableRef::parse("loans"), "borrowers", Some(&override_));

        assert!(descriptor.is_array);
        assert_eq!(descriptor.field_type, FieldType::Array);
    }

    #[test]
    fn test_update_mode_no_disables_editing() {
        let resolver = resolver();
        let mut override_ = FieldOverride::new();
        override_.update_mode = UpdateMode::No;
        let descriptor =
            resolver.resolve(&TableRef::parse("loans"), "amount_issued", Some(&override_));
        assert!(!descriptor.editable);
    }

    #[test]
    fn test_cross_table_field_reads_write_table_metadata() {
        let resolver = resolver();
        let override_ = FieldOverride::new().with_write_table("people_roles_associations");
        let descriptor = resolver.resolve(&TableRef::parse("people"), "role", Some(&override_));

        // "people.role" is not in the schema; the write table's column
        // supplies the metadata and the field stays editable.
        assert!(descriptor.schema_known);
        assert!(descriptor.editable);
        assert_eq!(descriptor.field_type, FieldType::Enum);
    }

    #[test]
    fn test_explicit_type_override_wins() {
        let resolver = resolver();
        let override_ = FieldOverride::new().with_type(FieldType::Json);
        let descriptor =
            resolver.resolve(&TableRef::parse("loans"), "amount_issued", Some(&override_));
        assert_eq!(descriptor.field_type, FieldType::Json);
    }
}

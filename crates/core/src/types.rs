//! Core types used throughout Tabula
//!
//! This module contains the fundamental types shared by the catalog,
//! engine, and CLI crates: the closed field-type union, schema base
//! types, table references, and the request types sent to the external
//! tabular store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Schema assumed for unqualified table references.
pub const DEFAULT_SCHEMA: &str = "public";

// ============================================================================
// FieldType
// ============================================================================

/// The closed set of resolved field types.
///
/// Every consumer (transformer, editor-control selection) matches
/// exhaustively over this union, so an unhandled case is a compile
/// error rather than a silent string mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Plain text
    String,
    /// Numeric value
    Number,
    /// True/false
    Boolean,
    /// Calendar date or timestamp
    Date,
    /// Single selection from a fixed option set
    Enum,
    /// Multiple values, rendered as a joined list
    Array,
    /// Single stored-object reference
    Attachment,
    /// List of stored-object references
    AttachmentArray,
    /// Raw JSON payload
    Json,
}

impl FieldType {
    /// Get a user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Enum => "Enum",
            FieldType::Array => "Array",
            FieldType::Attachment => "Attachment",
            FieldType::AttachmentArray => "Attachment List",
            FieldType::Json => "JSON",
        }
    }

    /// Check if this type references the object store
    pub fn is_attachment(&self) -> bool {
        matches!(self, FieldType::Attachment | FieldType::AttachmentArray)
    }

    /// Check if this type may carry an option set
    pub fn allows_options(&self) -> bool {
        matches!(self, FieldType::Enum | FieldType::Array)
    }

    /// Get all field types
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::Enum,
            FieldType::Array,
            FieldType::Attachment,
            FieldType::AttachmentArray,
            FieldType::Json,
        ]
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::String
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// SchemaBaseType
// ============================================================================

/// Base column types as reported by the generated schema catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaBaseType {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Json,
}

impl SchemaBaseType {
    /// Map the schema base type onto a resolved field type.
    ///
    /// Only boolean, number, date, and enum carry through; everything
    /// else starts life as a string and is refined by naming-convention
    /// inference or an explicit override.
    pub fn field_type(&self) -> FieldType {
        match self {
            SchemaBaseType::Boolean => FieldType::Boolean,
            SchemaBaseType::Number => FieldType::Number,
            SchemaBaseType::Date => FieldType::Date,
            SchemaBaseType::Enum => FieldType::Enum,
            SchemaBaseType::String | SchemaBaseType::Json => FieldType::String,
        }
    }
}

impl Default for SchemaBaseType {
    fn default() -> Self {
        SchemaBaseType::String
    }
}

// ============================================================================
// UpdateMode
// ============================================================================

/// Controls whether a field participates in updates vs. only creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Never written
    No,
    /// Written on create and on edit
    #[default]
    Yes,
    /// Written on create, silently dropped from edits
    NewOnly,
}

impl UpdateMode {
    /// Check whether the field may be written for the given operation.
    pub fn writable(&self, is_new: bool) -> bool {
        match self {
            UpdateMode::No => false,
            UpdateMode::Yes => true,
            UpdateMode::NewOnly => is_new,
        }
    }
}

// ============================================================================
// OptionItem
// ============================================================================

/// One selectable option: the stored value and its human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    /// Raw value as stored in the column
    pub value: String,

    /// Human-readable label
    pub label: String,
}

impl OptionItem {
    /// Create a new option
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Create an option whose label echoes its value (enum catalogues)
    pub fn echo(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

// ============================================================================
// TableRef
// ============================================================================

/// A schema-qualified table reference.
///
/// Preset and override files refer to tables as `"tablename"` or
/// `"otherschema.tablename"`; unqualified names resolve against
/// [`DEFAULT_SCHEMA`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Database schema name
    pub schema: String,

    /// Table name within the schema
    pub table: String,
}

impl TableRef {
    /// Create a reference with an explicit schema
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse a possibly-qualified table string.
    ///
    /// `"loans"` resolves to `public.loans`; `"audit.loans"` keeps its
    /// schema.
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((schema, table)) => Self::new(schema, table),
            None => Self::new(DEFAULT_SCHEMA, reference),
        }
    }

    /// Get the fully-qualified `schema.table` form
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Check if this reference lives in the default schema
    pub fn is_default_schema(&self) -> bool {
        self.schema == DEFAULT_SCHEMA
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_default_schema() {
            write!(f, "{}", self.table)
        } else {
            write!(f, "{}", self.qualified())
        }
    }
}

impl From<&str> for TableRef {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

// ============================================================================
// Filters & Ordering
// ============================================================================

/// Comparison operator for a read filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    In,
    IsNull,
}

/// One column filter applied to a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Column the filter applies to
    pub column: String,

    /// Comparison operator
    pub op: FilterOp,

    /// Comparison value (ignored for `IsNull`; an array for `In`)
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    /// Equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Inequality filter
    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Neq,
            value: value.into(),
        }
    }

    /// Membership filter
    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In,
            value: Value::Array(values),
        }
    }

    /// Null check filter
    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::IsNull,
            value: Value::Null,
        }
    }
}

/// One ordering term. Ascending unless `descending` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,

    /// Sort direction
    #[serde(default)]
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order term
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order term
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

// ============================================================================
// SelectRequest
// ============================================================================

/// A filtered/ordered/limited read request against the tabular store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectRequest {
    /// Target table
    pub table: TableRef,

    /// Columns to return (`None` = all)
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Conjunction of filters
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Ordering terms, applied in sequence
    #[serde(default)]
    pub order: Vec<OrderBy>,

    /// Page size (`None` = store default)
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SelectRequest {
    /// Create an unfiltered request for every column of a table
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Add one filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add one ordering term
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// SaveTarget
// ============================================================================

/// The authoritative destination for an edited field's value.
///
/// Resolved once per entity and reused for every field edited within a
/// card, unless a field's descriptor redirects to a different table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveTarget {
    /// Database schema
    pub schema: String,

    /// Table name
    pub table: String,

    /// Primary-key (or foreign-key) column the update is keyed by
    pub pk_column: String,

    /// Key value identifying the row
    pub pk_value: Value,
}

impl SaveTarget {
    /// Create a save target
    pub fn new(table: &TableRef, pk_column: impl Into<String>, pk_value: impl Into<Value>) -> Self {
        Self {
            schema: table.schema.clone(),
            table: table.table.clone(),
            pk_column: pk_column.into(),
            pk_value: pk_value.into(),
        }
    }

    /// Get the target table as a [`TableRef`]
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&*self.schema, &*self.table)
    }
}

impl std::fmt::Display for SaveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} ({} = {})",
            self.schema, self.table, self.pk_column, self.pk_value
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::String.display_name(), "String");
        assert_eq!(FieldType::AttachmentArray.display_name(), "Attachment List");
    }

    #[test]
    fn test_field_type_attachment_check() {
        assert!(FieldType::Attachment.is_attachment());
        assert!(FieldType::AttachmentArray.is_attachment());
        assert!(!FieldType::Enum.is_attachment());
    }

    #[test]
    fn test_field_type_allows_options() {
        assert!(FieldType::Enum.allows_options());
        assert!(FieldType::Array.allows_options());
        assert!(!FieldType::String.allows_options());
        assert!(!FieldType::Attachment.allows_options());
    }

    #[test]
    fn test_schema_base_type_mapping() {
        assert_eq!(SchemaBaseType::Boolean.field_type(), FieldType::Boolean);
        assert_eq!(SchemaBaseType::Number.field_type(), FieldType::Number);
        assert_eq!(SchemaBaseType::Date.field_type(), FieldType::Date);
        assert_eq!(SchemaBaseType::Enum.field_type(), FieldType::Enum);
        assert_eq!(SchemaBaseType::String.field_type(), FieldType::String);
        assert_eq!(SchemaBaseType::Json.field_type(), FieldType::String);
    }

    #[test]
    fn test_update_mode_writable() {
        assert!(UpdateMode::Yes.writable(false));
        assert!(UpdateMode::Yes.writable(true));
        assert!(!UpdateMode::No.writable(true));
        assert!(UpdateMode::NewOnly.writable(true));
        assert!(!UpdateMode::NewOnly.writable(false));
    }

    #[test]
    fn test_option_item_echo() {
        let opt = OptionItem::echo("active");
        assert_eq!(opt.value, "active");
        assert_eq!(opt.label, "active");
    }

    #[test]
    fn test_table_ref_parse_unqualified() {
        let table = TableRef::parse("loans");
        assert_eq!(table.schema, DEFAULT_SCHEMA);
        assert_eq!(table.table, "loans");
        assert!(table.is_default_schema());
        assert_eq!(table.to_string(), "loans");
    }

    #[test]
    fn test_table_ref_parse_qualified() {
        let table = TableRef::parse("audit.loans");
        assert_eq!(table.schema, "audit");
        assert_eq!(table.table, "loans");
        assert!(!table.is_default_schema());
        assert_eq!(table.qualified(), "audit.loans");
        assert_eq!(table.to_string(), "audit.loans");
    }

    #[test]
    fn test_filter_constructors() {
        let f = Filter::eq("status", "active");
        assert_eq!(f.op, FilterOp::Eq);
        assert_eq!(f.value, json!("active"));

        let f = Filter::is_in("role", vec![json!("tl"), json!("mentor")]);
        assert_eq!(f.op, FilterOp::In);
        assert_eq!(f.value, json!(["tl", "mentor"]));

        let f = Filter::is_null("deleted_at");
        assert_eq!(f.op, FilterOp::IsNull);
        assert_eq!(f.value, Value::Null);
    }

    #[test]
    fn test_order_by_defaults_ascending() {
        let json_order: OrderBy = serde_json::from_value(json!({"column": "name"})).unwrap();
        assert!(!json_order.descending);
        assert!(OrderBy::desc("issue_date").descending);
    }

    #[test]
    fn test_select_request_builder() {
        let request = SelectRequest::new(TableRef::parse("loans"))
            .with_filter(Filter::eq("status", "open"))
            .with_order(OrderBy::desc("issue_date"))
            .with_limit(50);

        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.order.len(), 1);
        assert_eq!(request.limit, Some(50));
        assert!(request.columns.is_none());
    }

    #[test]
    fn test_save_target() {
        let target = SaveTarget::new(&TableRef::parse("loans"), "id", json!("L1"));
        assert_eq!(target.schema, "public");
        assert_eq!(target.table, "loans");
        assert_eq!(target.table_ref(), TableRef::parse("loans"));
        assert_eq!(target.to_string(), "public.loans (id = \"L1\")");
    }
}

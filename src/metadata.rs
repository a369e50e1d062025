//! Column metadata and plan resolution
//!
//! A record type declares its exportable members once, in a
//! [`RecordDescriptor`]: fields first, then no-argument methods, each with an
//! [`ExcelField`] carrying the title, sort key, groups, mode, alignment and
//! optional formatter. [`ColumnPlan::resolve`] filters these by mode and
//! group and orders them by sort key; the resulting plan is immutable and
//! shared by every row of an export.

use crate::accessor::{AccessorRef, Record};
use crate::error::{ExportError, Result};
use crate::format::{CellFormatter, FormatHints};
use crate::types::Alignment;
use std::slice;
use std::sync::Arc;

/// Delimiter between a header and its comment in a column title
pub const COMMENT_DELIMITER: &str = "**";

/// Which direction a column takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportMode {
    /// Exported and imported
    #[default]
    Both = 0,
    /// Export only
    Export = 1,
    /// Import template only
    Import = 2,
}

impl ExportMode {
    /// Map a metadata mode code; unknown codes mean [`ExportMode::Both`]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ExportMode::Export,
            2 => ExportMode::Import,
            _ => ExportMode::Both,
        }
    }

    /// Whether a column declared with this mode is kept for `requested`
    pub fn admits(&self, requested: ExportMode) -> bool {
        *self == ExportMode::Both || *self == requested
    }
}

/// Export metadata attached to one declared member
#[derive(Debug, Clone, Default)]
pub struct ExcelField {
    title: String,
    path: Option<String>,
    sort: i32,
    groups: Vec<i32>,
    mode: ExportMode,
    alignment: Alignment,
    type_tag: Option<String>,
    formatter: Option<CellFormatter>,
}

impl ExcelField {
    /// Metadata with a title, optionally `"Header**Comment"`
    pub fn new(title: impl Into<String>) -> Self {
        ExcelField {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Read the value through a dot-delimited path instead of the member
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sort key, ascending
    pub fn sort(mut self, sort: i32) -> Self {
        self.sort = sort;
        self
    }

    /// Groups this column belongs to
    pub fn groups(mut self, groups: impl IntoIterator<Item = i32>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    /// Direction this column takes part in
    pub fn mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Alignment of data cells
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Alignment from its numeric code (1 left, 2 center, 3 right)
    pub fn align_code(mut self, code: i32) -> Self {
        self.alignment = Alignment::from_code(code);
        self
    }

    /// Declared scalar type tag, formatted through the registry entry of that name
    pub fn type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    /// Value-to-text formatter for this column
    pub fn formatter(mut self, formatter: CellFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

/// Kind of declared member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

#[derive(Debug, Clone)]
struct DeclaredMember {
    name: String,
    kind: MemberKind,
    meta: ExcelField,
}

/// Declared export metadata of one record type
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    type_name: String,
    fields: Vec<DeclaredMember>,
    methods: Vec<DeclaredMember>,
}

impl RecordDescriptor {
    /// Start a descriptor for a type
    pub fn new(type_name: impl Into<String>) -> Self {
        RecordDescriptor {
            type_name: type_name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Declare an exportable field
    pub fn field(mut self, name: impl Into<String>, meta: ExcelField) -> Self {
        self.fields.push(DeclaredMember {
            name: name.into(),
            kind: MemberKind::Field,
            meta,
        });
        self
    }

    /// Declare an exportable no-argument method
    pub fn method(mut self, name: impl Into<String>, meta: ExcelField) -> Self {
        self.methods.push(DeclaredMember {
            name: name.into(),
            kind: MemberKind::Method,
            meta,
        });
        self
    }

    /// Type name given at construction
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of declared members
    pub fn len(&self) -> usize {
        self.fields.len() + self.methods.len()
    }

    /// Check if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared members in declaration order, fields before methods
    fn members(&self) -> impl Iterator<Item = &DeclaredMember> {
        self.fields.iter().chain(self.methods.iter())
    }
}

/// A record type that declares its export metadata
pub trait Exportable: Record {
    /// Declared metadata; called once per export
    fn descriptor() -> RecordDescriptor;
}

/// One resolved column
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Title as declared, comment included
    pub title: String,
    /// Visible header text
    pub header: String,
    /// Note attached to the header cell
    pub comment: Option<String>,
    /// Member read for data rows; `None` for header-only plans
    pub accessor: Option<AccessorRef>,
    pub alignment: Alignment,
    pub type_tag: Option<String>,
    pub sort: i32,
    pub groups: Vec<i32>,
    pub mode: ExportMode,
    pub formatter: Option<CellFormatter>,
}

impl ColumnSpec {
    /// Column with only a title, as built from a literal header list
    pub fn from_title(title: impl Into<String>) -> Self {
        let title = title.into();
        let (header, comment) = split_title(&title);
        ColumnSpec {
            header: header.to_string(),
            comment: comment.map(str::to_string),
            title,
            accessor: None,
            alignment: Alignment::None,
            type_tag: None,
            sort: 0,
            groups: Vec::new(),
            mode: ExportMode::Both,
            formatter: None,
        }
    }

    fn from_member(member: &DeclaredMember) -> Self {
        let meta = &member.meta;
        let accessor = match (&meta.path, member.kind) {
            (Some(path), _) if !path.trim().is_empty() => AccessorRef::Path(path.clone()),
            (_, MemberKind::Field) => AccessorRef::Field(member.name.clone()),
            (_, MemberKind::Method) => AccessorRef::Method(member.name.clone()),
        };

        ColumnSpec {
            accessor: Some(accessor),
            alignment: meta.alignment,
            type_tag: meta.type_tag.clone(),
            sort: meta.sort,
            groups: meta.groups.clone(),
            mode: meta.mode,
            formatter: meta.formatter.clone(),
            ..ColumnSpec::from_title(meta.title.clone())
        }
    }

    /// Formatting directives for this column's values
    pub fn format_hints(&self) -> FormatHints<'_> {
        FormatHints {
            formatter: self.formatter.as_ref(),
            type_tag: self.type_tag.as_deref(),
        }
    }
}

/// Split a title into visible header text and an optional comment
///
/// `"Label**Note"` gives `("Label", Some("Note"))`; a title without the
/// delimiter, or with an empty header part, is returned verbatim.
pub fn split_title(title: &str) -> (&str, Option<&str>) {
    match title.split_once(COMMENT_DELIMITER) {
        Some((header, comment)) if !header.is_empty() => {
            let comment = Some(comment).filter(|c| !c.is_empty());
            (header, comment)
        }
        _ => (title, None),
    }
}

/// Whether a column with `declared` groups passes the `requested` filter
pub fn in_groups(declared: &[i32], requested: &[i32]) -> bool {
    requested.is_empty() || requested.iter().any(|g| declared.contains(g))
}

/// Ordered, immutable column layout of one export
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    columns: Arc<[ColumnSpec]>,
}

impl ColumnPlan {
    /// Resolve the plan of a record type for a mode and group filter
    ///
    /// # Examples
    ///
    /// ```
    /// use record_export::metadata::{ColumnPlan, ExcelField, ExportMode, RecordDescriptor};
    ///
    /// let descriptor = RecordDescriptor::new("Item")
    ///     .field("b", ExcelField::new("B").sort(2))
    ///     .field("a", ExcelField::new("A").sort(1));
    ///
    /// let plan = ColumnPlan::resolve(&descriptor, ExportMode::Export, &[]);
    /// assert_eq!(plan.headers().collect::<Vec<_>>(), ["A", "B"]);
    /// ```
    pub fn resolve(descriptor: &RecordDescriptor, mode: ExportMode, groups: &[i32]) -> Self {
        let mut columns: Vec<ColumnSpec> = descriptor
            .members()
            .filter(|m| m.meta.mode.admits(mode))
            .filter(|m| in_groups(&m.meta.groups, groups))
            .map(ColumnSpec::from_member)
            .collect();

        // stable: ties keep declaration order
        columns.sort_by_key(|c| c.sort);

        tracing::debug!(
            record = descriptor.type_name(),
            declared = descriptor.len(),
            resolved = columns.len(),
            "resolved column plan"
        );

        ColumnPlan {
            columns: columns.into(),
        }
    }

    /// Resolve the plan of an [`Exportable`] type
    pub fn for_record<T: Exportable>(mode: ExportMode, groups: &[i32]) -> Self {
        Self::resolve(&T::descriptor(), mode, groups)
    }

    /// Plan from a literal header list; an empty list is a configuration error
    pub fn from_headers<I, S>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<ColumnSpec> = headers.into_iter().map(ColumnSpec::from_title).collect();
        if columns.is_empty() {
            return Err(ExportError::MissingHeaders);
        }
        Ok(Self::from_columns(columns))
    }

    /// Plan from columns in their final order
    pub fn from_columns(columns: Vec<ColumnSpec>) -> Self {
        ColumnPlan {
            columns: columns.into(),
        }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if plan has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column at an index
    pub fn get(&self, index: usize) -> Option<&ColumnSpec> {
        self.columns.get(index)
    }

    /// Columns in order
    pub fn iter(&self) -> slice::Iter<'_, ColumnSpec> {
        self.columns.iter()
    }

    /// Visible header texts in order
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.header.as_str())
    }
}

impl<'a> IntoIterator for &'a ColumnPlan {
    type Item = &'a ColumnSpec;
    type IntoIter = slice::Iter<'a, ColumnSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Employee")
            .field("name", ExcelField::new("Name").sort(10).groups([1, 2]))
            .field("dept", ExcelField::new("Department**Owning unit").sort(20).groups([2]))
            .field("salary", ExcelField::new("Salary").sort(30).mode(ExportMode::Export).groups([3]))
            .field("note", ExcelField::new("Note").sort(20))
            .field("code", ExcelField::new("Code").sort(5).mode(ExportMode::Import))
            .method("displayName", ExcelField::new("Display").sort(10).groups([1]))
            .method("age", ExcelField::new("Age").sort(5).align_code(3))
    }

    #[test]
    fn test_sort_example() {
        let descriptor = RecordDescriptor::new("Item")
            .field("b", ExcelField::new("B").sort(2))
            .field("a", ExcelField::new("A").sort(1));
        let plan = ColumnPlan::resolve(&descriptor, ExportMode::Export, &[]);
        assert_eq!(plan.headers().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn test_stable_order_fields_before_methods() {
        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Export, &[]);
        let headers: Vec<_> = plan.headers().collect();
        // Code is import-only; ties keep fields before methods
        assert_eq!(
            headers,
            ["Age", "Name", "Display", "Department", "Note", "Salary"]
        );
    }

    #[test]
    fn test_mode_filter() {
        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Import, &[]);
        let headers: Vec<_> = plan.headers().collect();
        assert!(headers.contains(&"Code"));
        assert!(!headers.contains(&"Salary"));
        assert_eq!(plan.len(), 6);
    }

    #[test]
    fn test_group_filter_excludes_ungrouped_columns() {
        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Export, &[2]);
        assert_eq!(plan.headers().collect::<Vec<_>>(), ["Name", "Department"]);

        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Export, &[1, 3]);
        assert_eq!(
            plan.headers().collect::<Vec<_>>(),
            ["Name", "Display", "Salary"]
        );

        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Export, &[99]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_title_comment_split() {
        assert_eq!(split_title("Label**Note"), ("Label", Some("Note")));
        assert_eq!(split_title("Label"), ("Label", None));
        assert_eq!(split_title("Label**"), ("Label", None));
        assert_eq!(split_title("**Note"), ("**Note", None));
        assert_eq!(split_title("A**B**C"), ("A", Some("B**C")));

        let plan = ColumnPlan::resolve(&descriptor(), ExportMode::Export, &[2]);
        let dept = plan.get(1).unwrap();
        assert_eq!(dept.header, "Department");
        assert_eq!(dept.comment.as_deref(), Some("Owning unit"));
        assert_eq!(dept.title, "Department**Owning unit");
    }

    #[test]
    fn test_accessor_refs() {
        let descriptor = RecordDescriptor::new("Order")
            .field("customer", ExcelField::new("Customer").path("customer.name"))
            .field("total", ExcelField::new("Total"))
            .method("status", ExcelField::new("Status"));
        let plan = ColumnPlan::resolve(&descriptor, ExportMode::Export, &[]);
        let accessors: Vec<_> = plan.iter().map(|c| c.accessor.clone().unwrap()).collect();
        assert_eq!(
            accessors,
            [
                AccessorRef::Path("customer.name".into()),
                AccessorRef::Field("total".into()),
                AccessorRef::Method("status".into()),
            ]
        );
        assert_eq!(plan.get(0).unwrap().alignment, Alignment::None);
    }

    #[test]
    fn test_from_headers() {
        let plan = ColumnPlan::from_headers(["ID", "Name**Full name"]).unwrap();
        assert_eq!(plan.headers().collect::<Vec<_>>(), ["ID", "Name"]);
        assert!(plan.get(0).unwrap().accessor.is_none());
        assert_eq!(plan.get(1).unwrap().comment.as_deref(), Some("Full name"));

        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            ColumnPlan::from_headers(empty),
            Err(ExportError::MissingHeaders)
        ));
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(ExportMode::from_code(1), ExportMode::Export);
        assert_eq!(ExportMode::from_code(0), ExportMode::Both);
        assert!(ExportMode::Both.admits(ExportMode::Import));
        assert!(!ExportMode::Import.admits(ExportMode::Export));
    }
}

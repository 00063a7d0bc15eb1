// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::ids::RowId;
use crate::model::{CellValue, ColumnSet, Dataset, FilterCriteria, Row, View, ViewRow};
use crate::schema::TableSchema;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    InvalidFilterColumn {
        column: String,
    },
    InvalidVisibleColumn {
        column: String,
    },
    OrphanEditIdentifier {
        id: RowId,
    },
    MalformedEditedView {
        reason: String,
    },
    ReadOnlyColumn {
        id: RowId,
        column: String,
    },
    InvalidCellValue {
        id: RowId,
        column: String,
        reason: ValidationError,
    },
}

impl ReconcileError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEditedView {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFilterColumn { column } => {
                write!(f, "filter references unknown column {column:?}")
            }
            Self::InvalidVisibleColumn { column } => {
                write!(
                    f,
                    "column {column:?} is not in the table -- pick one of the listed columns"
                )
            }
            Self::OrphanEditIdentifier { id } => {
                write!(
                    f,
                    "edited row {id} does not exist and row insertion is disabled"
                )
            }
            Self::MalformedEditedView { reason } => {
                write!(f, "edited view does not match the presented view: {reason}")
            }
            Self::ReadOnlyColumn { id, column } => {
                write!(f, "column {column:?} is read-only (row {id})")
            }
            Self::InvalidCellValue { id, column, reason } => {
                write!(f, "row {id}, column {column:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// Whether the edit surface may add or remove rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditPolicy {
    pub allow_insert: bool,
    pub allow_delete: bool,
}

impl EditPolicy {
    pub const fn dynamic_rows() -> Self {
        Self {
            allow_insert: true,
            allow_delete: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub updated_cells: usize,
    pub inserted_rows: usize,
    pub deleted_rows: usize,
}

impl MergeSummary {
    pub const fn is_empty(&self) -> bool {
        self.updated_cells == 0 && self.inserted_rows == 0 && self.deleted_rows == 0
    }

    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "no changes".to_owned();
        }
        let mut parts = Vec::new();
        if self.updated_cells > 0 {
            parts.push(plural(self.updated_cells, "cell", "updated"));
        }
        if self.inserted_rows > 0 {
            parts.push(plural(self.inserted_rows, "row", "added"));
        }
        if self.deleted_rows > 0 {
            parts.push(plural(self.deleted_rows, "row", "deleted"));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub dataset: Dataset,
    pub summary: MergeSummary,
}

/// Derives views from a dataset and folds edited views back into it.
#[derive(Debug, Clone, Default)]
pub struct ViewReconciler {
    policy: EditPolicy,
    schema: TableSchema,
}

impl ViewReconciler {
    pub fn new(policy: EditPolicy, schema: TableSchema) -> Self {
        Self { policy, schema }
    }

    pub const fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Rows matching every predicate, cut down to `visible`, in dataset order.
    pub fn derive_view(
        &self,
        dataset: &Dataset,
        filters: &FilterCriteria,
        visible: &ColumnSet,
    ) -> ReconcileResult<View> {
        for predicate in filters.predicates() {
            if !dataset.has_column(&predicate.column) {
                return Err(ReconcileError::InvalidFilterColumn {
                    column: predicate.column.clone(),
                });
            }
        }
        ensure_columns_exist(dataset, visible.iter())?;

        let rows = dataset
            .rows()
            .iter()
            .filter(|row| filters.matches(row))
            .map(|row| ViewRow {
                id: row.id,
                values: visible
                    .iter()
                    .map(|column| row.value(column).clone())
                    .collect(),
            })
            .collect();

        Ok(View {
            columns: visible.clone(),
            rows,
        })
    }

    /// Applies `edited` onto `dataset`, keyed by row id.
    ///
    /// `presented` is the view that was handed to the edit surface. Only rows
    /// and columns it contained can change; rows missing from `edited` are
    /// deletions. Nothing is written unless the whole edit validates.
    pub fn merge(
        &self,
        dataset: &Dataset,
        presented: &View,
        edited: &View,
    ) -> ReconcileResult<Merged> {
        if edited.columns != presented.columns {
            return Err(ReconcileError::malformed(format!(
                "columns changed from [{}] to [{}]",
                presented.columns.names().join(", "),
                edited.columns.names().join(", ")
            )));
        }
        ensure_columns_exist(dataset, presented.columns.iter())?;

        let index = dataset
            .rows()
            .iter()
            .map(|row| (row.id, row))
            .collect::<BTreeMap<RowId, &Row>>();

        let mut presented_ids = BTreeSet::new();
        for row in &presented.rows {
            if !presented_ids.insert(row.id) {
                return Err(ReconcileError::malformed(format!(
                    "row {} was presented more than once",
                    row.id
                )));
            }
            if !index.contains_key(&row.id) {
                return Err(ReconcileError::malformed(format!(
                    "presented row {} no longer exists -- refresh the view and retry",
                    row.id
                )));
            }
        }

        let width = presented.columns.len();
        let mut seen = BTreeSet::new();
        let mut survivors = Vec::new();
        let mut updates: Vec<(RowId, Vec<(&str, &CellValue)>)> = Vec::new();
        let mut inserts: Vec<&ViewRow> = Vec::new();

        for row in &edited.rows {
            if row.values.len() != width {
                return Err(ReconcileError::malformed(format!(
                    "row {} has {} values for {} columns",
                    row.id,
                    row.values.len(),
                    width
                )));
            }
            if !seen.insert(row.id) {
                return Err(ReconcileError::malformed(format!(
                    "row {} appears more than once",
                    row.id
                )));
            }

            if presented_ids.contains(&row.id) {
                survivors.push(row.id);
                let current = index[&row.id];
                let mut changes = Vec::new();
                for (column, value) in presented.columns.iter().zip(&row.values) {
                    if current.value(column) != value {
                        self.check_edit(row.id, column, value)?;
                        changes.push((column, value));
                    }
                }
                if !changes.is_empty() {
                    updates.push((row.id, changes));
                }
            } else if index.contains_key(&row.id) {
                return Err(ReconcileError::malformed(format!(
                    "row {} was not presented for editing",
                    row.id
                )));
            } else if self.policy.allow_insert {
                if row.id < dataset.next_row_id() {
                    return Err(ReconcileError::malformed(format!(
                        "new row {} reuses a retired id -- new rows take ids from {}",
                        row.id,
                        dataset.next_row_id()
                    )));
                }
                for (column, value) in presented.columns.iter().zip(&row.values) {
                    if !value.is_empty() {
                        self.check_edit(row.id, column, value)?;
                    }
                }
                inserts.push(row);
            } else {
                return Err(ReconcileError::OrphanEditIdentifier { id: row.id });
            }
        }

        let expected_order = presented
            .rows
            .iter()
            .map(|row| row.id)
            .filter(|id| seen.contains(id))
            .collect::<Vec<_>>();
        if expected_order != survivors {
            return Err(ReconcileError::malformed("rows were reordered"));
        }

        let deletions = presented_ids
            .difference(&seen)
            .copied()
            .collect::<BTreeSet<RowId>>();
        if let Some(missing) = deletions.first()
            && !self.policy.allow_delete
        {
            return Err(ReconcileError::malformed(format!(
                "row {missing} is missing and row deletion is disabled"
            )));
        }

        let summary = MergeSummary {
            updated_cells: updates.iter().map(|(_, changes)| changes.len()).sum(),
            inserted_rows: inserts.len(),
            deleted_rows: deletions.len(),
        };
        if summary.is_empty() {
            return Ok(Merged {
                dataset: dataset.clone(),
                summary,
            });
        }

        let mut next = dataset.clone();
        for (id, changes) in updates {
            if let Some(row) = next.row_mut(id) {
                for (column, value) in changes {
                    row.set(column, value.clone());
                }
            }
        }
        next.remove_rows(&deletions);
        for row in inserts {
            let values = presented
                .columns
                .iter()
                .map(str::to_owned)
                .zip(row.values.iter().cloned())
                .collect();
            next.insert_row(row.id, values);
        }
        next.bump_version();

        debug!(
            version = next.version().get(),
            updated_cells = summary.updated_cells,
            inserted_rows = summary.inserted_rows,
            deleted_rows = summary.deleted_rows,
            "merged edited view"
        );
        Ok(Merged {
            dataset: next,
            summary,
        })
    }

    /// Validates a requested visible column set against the dataset.
    pub fn toggle_columns<S: AsRef<str>>(
        &self,
        dataset: &Dataset,
        current: &ColumnSet,
        requested: &[S],
    ) -> ReconcileResult<ColumnSet> {
        ensure_columns_exist(dataset, requested.iter().map(|name| name.as_ref()))?;

        let next = ColumnSet::new(
            dataset
                .columns()
                .iter()
                .filter(|column| {
                    requested
                        .iter()
                        .any(|name| name.as_ref() == column.as_str())
                })
                .cloned(),
        );

        let added = next
            .iter()
            .filter(|column| !current.contains(column))
            .collect::<Vec<_>>();
        let removed = current
            .iter()
            .filter(|column| !next.contains(column))
            .collect::<Vec<_>>();
        debug!(?added, ?removed, "visible columns changed");
        Ok(next)
    }

    fn check_edit(&self, id: RowId, column: &str, value: &CellValue) -> ReconcileResult<()> {
        let Some(spec) = self.schema.column(column) else {
            return Ok(());
        };
        if spec.read_only {
            return Err(ReconcileError::ReadOnlyColumn {
                id,
                column: column.to_owned(),
            });
        }
        validation::check_cell(&spec.kind, value).map_err(|reason| {
            ReconcileError::InvalidCellValue {
                id,
                column: column.to_owned(),
                reason,
            }
        })
    }
}

fn ensure_columns_exist<'a>(
    dataset: &Dataset,
    columns: impl IntoIterator<Item = &'a str>,
) -> ReconcileResult<()> {
    for column in columns {
        if !dataset.has_column(column) {
            return Err(ReconcileError::InvalidVisibleColumn {
                column: column.to_owned(),
            });
        }
    }
    Ok(())
}

fn plural(count: usize, noun: &str, verb: &str) -> String {
    if count == 1 {
        format!("1 {noun} {verb}")
    } else {
        format!("{count} {noun}s {verb}")
    }
}

#[cfg(test)]
mod tests {
    use super::{EditPolicy, MergeSummary, ReconcileError, ViewReconciler};
    use crate::model::{CellValue, ColumnSet, Dataset, FilterCriteria, Predicate, View};
    use crate::schema::{ColumnKind, ColumnSpec, TableSchema};
    use crate::validation::ValidationError;
    use crate::{DatasetVersion, RowId};
    use anyhow::Result;

    fn two_rows() -> Result<Dataset> {
        let mut dataset = Dataset::new(["cat", "val"])?;
        dataset.push_row(vec!["A".into(), 10.into()])?;
        dataset.push_row(vec!["B".into(), 20.into()])?;
        Ok(dataset)
    }

    fn wide() -> Result<Dataset> {
        let mut dataset = Dataset::new(["cat", "val", "note"])?;
        dataset.push_row(vec!["A".into(), 1.into(), "first".into()])?;
        dataset.push_row(vec!["B".into(), 2.into(), "second".into()])?;
        dataset.push_row(vec!["A".into(), 3.into(), "third".into()])?;
        dataset.push_row(vec!["C".into(), 4.into(), "fourth".into()])?;
        dataset.push_row(vec!["A".into(), 5.into(), "fifth".into()])?;
        Ok(dataset)
    }

    fn strict() -> ViewReconciler {
        ViewReconciler::new(EditPolicy::default(), TableSchema::empty())
    }

    fn dynamic() -> ViewReconciler {
        ViewReconciler::new(EditPolicy::dynamic_rows(), TableSchema::empty())
    }

    fn cat_is(value: &str) -> FilterCriteria {
        FilterCriteria::new().with(Predicate::equals("cat", value))
    }

    #[test]
    fn worked_example_updates_only_the_visible_cell() -> Result<()> {
        let dataset = two_rows()?;
        let reconciler = strict();
        let visible = ColumnSet::new(["val"]);

        let view = reconciler.derive_view(&dataset, &cat_is("A"), &visible)?;
        assert_eq!(view.row_ids(), vec![RowId::new(1)]);
        assert_eq!(view.rows[0].values, vec![CellValue::Int(10)]);

        let mut edited = view.clone();
        assert!(edited.set_value(0, 0, CellValue::Int(99)));
        let merged = reconciler.merge(&dataset, &view, &edited)?;

        let first = merged.dataset.row(RowId::new(1)).expect("row 1 kept");
        assert_eq!(first.value("cat"), &CellValue::text("A"));
        assert_eq!(first.value("val"), &CellValue::Int(99));
        assert_eq!(merged.dataset.row(RowId::new(2)), dataset.row(RowId::new(2)));
        assert_eq!(merged.dataset.len(), 2);
        assert_eq!(merged.summary.updated_cells, 1);
        Ok(())
    }

    #[test]
    fn derive_view_is_idempotent_and_pure() -> Result<()> {
        let dataset = wide()?;
        let before = dataset.clone();
        let reconciler = strict();
        let visible = ColumnSet::new(["note", "val"]);

        let first = reconciler.derive_view(&dataset, &cat_is("A"), &visible)?;
        let second = reconciler.derive_view(&dataset, &cat_is("A"), &visible)?;
        assert_eq!(first, second);
        assert_eq!(dataset, before);
        assert_eq!(
            first.row_ids(),
            vec![RowId::new(1), RowId::new(3), RowId::new(5)]
        );
        assert_eq!(
            first.rows[1].values,
            vec![CellValue::text("third"), CellValue::Int(3)]
        );
        Ok(())
    }

    #[test]
    fn zero_matches_and_empty_columns_are_valid() -> Result<()> {
        let dataset = wide()?;
        let reconciler = strict();

        let empty = reconciler.derive_view(&dataset, &cat_is("Z"), &ColumnSet::all(&dataset))?;
        assert!(empty.is_empty());

        let ids_only =
            reconciler.derive_view(&dataset, &FilterCriteria::new(), &ColumnSet::default())?;
        assert_eq!(ids_only.len(), 5);
        assert!(ids_only.rows.iter().all(|row| row.values.is_empty()));
        Ok(())
    }

    #[test]
    fn derive_view_rejects_unknown_columns() -> Result<()> {
        let dataset = wide()?;
        let reconciler = strict();

        let error = reconciler
            .derive_view(
                &dataset,
                &FilterCriteria::new().with(Predicate::equals("nope", "x")),
                &ColumnSet::all(&dataset),
            )
            .expect_err("unknown filter column should fail");
        assert_eq!(
            error,
            ReconcileError::InvalidFilterColumn {
                column: "nope".to_owned()
            }
        );

        let error = reconciler
            .derive_view(&dataset, &FilterCriteria::new(), &ColumnSet::new(["ghost"]))
            .expect_err("unknown visible column should fail");
        assert_eq!(
            error,
            ReconcileError::InvalidVisibleColumn {
                column: "ghost".to_owned()
            }
        );
        Ok(())
    }

    #[test]
    fn unchanged_view_merges_to_identity() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let filter_sets = [FilterCriteria::new(), cat_is("A"), cat_is("Z")];
        let column_sets = [
            ColumnSet::all(&dataset),
            ColumnSet::new(["val"]),
            ColumnSet::default(),
        ];

        for filters in &filter_sets {
            for visible in &column_sets {
                let view = reconciler.derive_view(&dataset, filters, visible)?;
                let merged = reconciler.merge(&dataset, &view, &view)?;
                assert_eq!(merged.dataset, dataset);
                assert_eq!(merged.dataset.version(), DatasetVersion::INITIAL);
                assert_eq!(merged.summary, MergeSummary::default());
            }
        }
        Ok(())
    }

    #[test]
    fn hidden_columns_and_filtered_rows_survive_edits() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &ColumnSet::new(["val"]))?;

        let mut edited = view.clone();
        for row in 0..edited.len() {
            edited.set_value(row, 0, CellValue::Int(100 + row as i64));
        }
        let merged = reconciler.merge(&dataset, &view, &edited)?;

        assert_eq!(merged.dataset.len(), dataset.len());
        for original in dataset.rows() {
            let after = merged.dataset.row(original.id).expect("row kept");
            assert_eq!(after.value("note"), original.value("note"));
            assert_eq!(after.value("cat"), original.value("cat"));
            if original.value("cat") != &CellValue::text("A") {
                assert_eq!(after, original);
            }
        }
        assert_eq!(merged.summary.updated_cells, 3);
        assert_eq!(merged.dataset.version(), dataset.version().bump());
        Ok(())
    }

    #[test]
    fn orphan_edit_is_rejected_without_insertion() -> Result<()> {
        let dataset = two_rows()?;
        let reconciler = strict();
        let view = reconciler.derive_view(
            &dataset,
            &FilterCriteria::new(),
            &ColumnSet::all(&dataset),
        )?;

        let mut edited = view.clone();
        edited.push_blank_row(RowId::new(3));
        let error = reconciler
            .merge(&dataset, &view, &edited)
            .expect_err("orphan row should fail");
        assert_eq!(
            error,
            ReconcileError::OrphanEditIdentifier { id: RowId::new(3) }
        );
        assert_eq!(dataset, two_rows()?);
        Ok(())
    }

    #[test]
    fn orphan_edit_inserts_when_allowed() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let view = reconciler.derive_view(&dataset, &cat_is("C"), &ColumnSet::new(["val"]))?;

        let mut edited = view.clone();
        let new_id = dataset.next_row_id();
        edited.push_blank_row(new_id);
        edited.set_value(1, 0, CellValue::Int(77));
        let merged = reconciler.merge(&dataset, &view, &edited)?;

        assert_eq!(merged.summary.inserted_rows, 1);
        assert_eq!(merged.dataset.len(), dataset.len() + 1);
        let inserted = merged.dataset.row(new_id).expect("new row present");
        assert_eq!(inserted.value("val"), &CellValue::Int(77));
        assert_eq!(inserted.value("note"), &CellValue::Empty);
        assert_eq!(
            merged.dataset.rows().last().map(|row| row.id),
            Some(new_id)
        );
        Ok(())
    }

    #[test]
    fn deleted_ids_are_not_reused_by_later_inserts() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let visible = ColumnSet::new(["val"]);
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &visible)?;
        let mut edited = view.clone();
        edited.remove_row(2);
        let after_delete = reconciler.merge(&dataset, &view, &edited)?.dataset;
        assert!(!after_delete.contains(RowId::new(5)));
        assert_eq!(after_delete.next_row_id(), RowId::new(6));

        let view = reconciler.derive_view(&after_delete, &cat_is("A"), &visible)?;
        let mut reused = view.clone();
        reused.push_blank_row(RowId::new(5));
        let error = reconciler
            .merge(&after_delete, &view, &reused)
            .expect_err("retired id should be refused");
        assert!(matches!(error, ReconcileError::MalformedEditedView { .. }));

        let mut fresh = view.clone();
        fresh.push_blank_row(after_delete.next_row_id());
        let merged = reconciler.merge(&after_delete, &view, &fresh)?;
        assert!(merged.dataset.contains(RowId::new(6)));
        assert_eq!(merged.dataset.next_row_id(), RowId::new(7));
        Ok(())
    }

    #[test]
    fn repeated_visible_columns_collapse_to_one() -> Result<()> {
        let dataset = two_rows()?;
        let reconciler = strict();
        let visible = ColumnSet::new(["val", "val"]);
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &visible)?;
        assert_eq!(view.columns.names(), ["val".to_owned()]);
        assert_eq!(view.rows[0].values, vec![CellValue::Int(10)]);

        let mut edited = view.clone();
        assert!(edited.set_value(0, 0, CellValue::Int(1)));
        assert!(!edited.set_value(0, 1, CellValue::Int(2)));
        let merged = reconciler.merge(&dataset, &view, &edited)?;
        assert_eq!(merged.summary.updated_cells, 1);
        assert_eq!(
            merged.dataset.row(RowId::new(1)).map(|row| row.value("val")),
            Some(&CellValue::Int(1))
        );
        Ok(())
    }

    #[test]
    fn deletion_only_touches_presented_rows() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &ColumnSet::new(["val"]))?;

        let mut edited = view.clone();
        edited.remove_row(1);
        let merged = reconciler.merge(&dataset, &view, &edited)?;

        assert_eq!(merged.summary.deleted_rows, 1);
        assert!(!merged.dataset.contains(RowId::new(3)));
        for id in [1, 2, 4, 5] {
            assert!(merged.dataset.contains(RowId::new(id)), "row {id} kept");
        }
        Ok(())
    }

    #[test]
    fn deletion_is_rejected_when_disabled() -> Result<()> {
        let dataset = wide()?;
        let reconciler = strict();
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &ColumnSet::new(["val"]))?;

        let mut edited = view.clone();
        edited.remove_row(0);
        let error = reconciler
            .merge(&dataset, &view, &edited)
            .expect_err("deletion should fail");
        assert!(matches!(error, ReconcileError::MalformedEditedView { .. }));
        assert!(error.to_string().contains("row 1 is missing"));
        Ok(())
    }

    #[test]
    fn malformed_shapes_are_rejected() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &ColumnSet::new(["val"]))?;

        let mut other_columns = view.clone();
        other_columns.columns = ColumnSet::new(["note"]);
        assert!(matches!(
            reconciler.merge(&dataset, &view, &other_columns),
            Err(ReconcileError::MalformedEditedView { .. })
        ));

        let mut wrong_width = view.clone();
        wrong_width.rows[0].values.push(CellValue::Int(1));
        assert!(matches!(
            reconciler.merge(&dataset, &view, &wrong_width),
            Err(ReconcileError::MalformedEditedView { .. })
        ));

        let mut duplicated = view.clone();
        duplicated.rows.push(duplicated.rows[0].clone());
        assert!(matches!(
            reconciler.merge(&dataset, &view, &duplicated),
            Err(ReconcileError::MalformedEditedView { .. })
        ));

        let mut reordered = view.clone();
        reordered.rows.swap(0, 2);
        let error = reconciler
            .merge(&dataset, &view, &reordered)
            .expect_err("reordering should fail");
        assert!(error.to_string().contains("reordered"));

        let mut smuggled = view.clone();
        smuggled.rows.push(super::ViewRow {
            id: RowId::new(2),
            values: vec![CellValue::Int(0)],
        });
        let error = reconciler
            .merge(&dataset, &view, &smuggled)
            .expect_err("filtered-out row should fail");
        assert!(error.to_string().contains("not presented"));
        Ok(())
    }

    #[test]
    fn failed_merge_leaves_dataset_untouched() -> Result<()> {
        let dataset = wide()?;
        let reconciler = strict();
        let view = reconciler.derive_view(&dataset, &cat_is("A"), &ColumnSet::new(["val"]))?;

        let mut edited = view.clone();
        edited.set_value(0, 0, CellValue::Int(500));
        edited.push_blank_row(RowId::new(99));
        assert!(reconciler.merge(&dataset, &view, &edited).is_err());
        assert_eq!(dataset, wide()?);
        Ok(())
    }

    #[test]
    fn schema_rules_guard_edits() -> Result<()> {
        let mut dataset = Dataset::new(["id", "progress"])?;
        dataset.push_row(vec!["P-1".into(), 10.into()])?;
        let schema = TableSchema::new(vec![
            ColumnSpec::new("id", "ID", ColumnKind::Text).read_only(),
            ColumnSpec::new("progress", "Progress", ColumnKind::Progress { min: 0, max: 100 }),
        ]);
        let reconciler = ViewReconciler::new(EditPolicy::dynamic_rows(), schema);
        let view =
            reconciler.derive_view(&dataset, &FilterCriteria::new(), &ColumnSet::all(&dataset))?;

        let mut read_only = view.clone();
        read_only.set_value(0, 0, CellValue::text("P-9"));
        assert_eq!(
            reconciler.merge(&dataset, &view, &read_only),
            Err(ReconcileError::ReadOnlyColumn {
                id: RowId::new(1),
                column: "id".to_owned()
            })
        );

        let mut out_of_range = view.clone();
        out_of_range.set_value(0, 1, CellValue::Int(150));
        assert_eq!(
            reconciler.merge(&dataset, &view, &out_of_range),
            Err(ReconcileError::InvalidCellValue {
                id: RowId::new(1),
                column: "progress".to_owned(),
                reason: ValidationError::OutOfRange { min: 0, max: 100 },
            })
        );

        let mut in_range = view.clone();
        in_range.set_value(0, 1, CellValue::Int(100));
        assert_eq!(
            reconciler.merge(&dataset, &view, &in_range)?.summary.updated_cells,
            1
        );
        Ok(())
    }

    #[test]
    fn toggle_columns_validates_and_orders() -> Result<()> {
        let dataset = wide()?;
        let reconciler = strict();
        let current = ColumnSet::all(&dataset);

        let next = reconciler.toggle_columns(&dataset, &current, &["note", "cat", "note"])?;
        assert_eq!(next, ColumnSet::new(["cat", "note"]));

        let error = reconciler
            .toggle_columns(&dataset, &current, &["unknown"])
            .expect_err("unknown column should fail");
        assert_eq!(
            error,
            ReconcileError::InvalidVisibleColumn {
                column: "unknown".to_owned()
            }
        );
        Ok(())
    }

    #[test]
    fn summary_describes_changes() {
        let summary = MergeSummary {
            updated_cells: 2,
            inserted_rows: 1,
            deleted_rows: 0,
        };
        assert_eq!(summary.describe(), "2 cells updated, 1 row added");
        assert_eq!(MergeSummary::default().describe(), "no changes");
    }

    #[test]
    fn merge_rejects_stale_presented_view() -> Result<()> {
        let dataset = wide()?;
        let reconciler = dynamic();
        let stale = View {
            columns: ColumnSet::new(["val"]),
            rows: vec![super::ViewRow {
                id: RowId::new(42),
                values: vec![CellValue::Int(1)],
            }],
        };
        let error = reconciler
            .merge(&dataset, &stale, &stale)
            .expect_err("stale view should fail");
        assert!(error.to_string().contains("no longer exists"));
        Ok(())
    }
}

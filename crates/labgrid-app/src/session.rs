// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ViewCache, ViewKey};
use crate::ids::DatasetVersion;
use crate::model::{CellValue, ColumnSet, Dataset, FilterCriteria, Predicate, View};
use crate::reconcile::{MergeSummary, ReconcileError, ReconcileResult, ViewReconciler};
use crate::schema::TableSchema;
use crate::state::{AppCommand, AppEvent, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub visible_columns: usize,
    pub total_columns: usize,
}

/// Everything one user session owns: the authoritative dataset, the current
/// filter and column selection, the view cache and the UI state.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    filters: FilterCriteria,
    visible: ColumnSet,
    filter_columns: Vec<String>,
    reconciler: ViewReconciler,
    cache: ViewCache,
    saved_version: DatasetVersion,
    state: AppState,
}

impl Session {
    pub fn start(dataset: Dataset, reconciler: ViewReconciler, cache_capacity: usize) -> Self {
        info!(
            rows = dataset.len(),
            columns = dataset.columns().len(),
            "session started"
        );
        Self {
            visible: ColumnSet::all(&dataset),
            saved_version: dataset.version(),
            dataset,
            filters: FilterCriteria::new(),
            filter_columns: Vec::new(),
            reconciler,
            cache: ViewCache::new(cache_capacity),
            state: AppState::default(),
        }
    }

    pub fn end(self) -> Dataset {
        info!(
            version = self.dataset.version().get(),
            unsaved = self.has_unsaved_changes(),
            "session ended"
        );
        self.dataset
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn visible_columns(&self) -> &ColumnSet {
        &self.visible
    }

    pub fn filter_columns(&self) -> &[String] {
        &self.filter_columns
    }

    pub fn schema(&self) -> &TableSchema {
        self.reconciler.schema()
    }

    pub fn reconciler(&self) -> &ViewReconciler {
        &self.reconciler
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        self.state.dispatch(command)
    }

    /// Columns offered as sidebar selectors. Every name must exist.
    pub fn set_filter_columns<S: AsRef<str>>(&mut self, columns: &[S]) -> ReconcileResult<()> {
        let mut next: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            if !self.dataset.has_column(column) {
                return Err(ReconcileError::InvalidFilterColumn {
                    column: column.to_owned(),
                });
            }
            if !next.iter().any(|name| name == column) {
                next.push(column.to_owned());
            }
        }
        self.filter_columns = next;
        Ok(())
    }

    /// The view for the current filters and columns, from cache when possible.
    pub fn view(&mut self) -> ReconcileResult<View> {
        let key = ViewKey::new(self.dataset.version(), &self.filters, &self.visible);
        if let Some(view) = self.cache.get(&key) {
            return Ok(view.clone());
        }
        let view = self
            .reconciler
            .derive_view(&self.dataset, &self.filters, &self.visible)?;
        self.cache.insert(key, view.clone());
        Ok(view)
    }

    pub fn set_filter(&mut self, predicate: Predicate) -> ReconcileResult<()> {
        if !self.dataset.has_column(&predicate.column) {
            return Err(ReconcileError::InvalidFilterColumn {
                column: predicate.column,
            });
        }
        debug!(column = %predicate.column, allowed = predicate.allowed.len(), "filter set");
        self.filters.set(predicate);
        Ok(())
    }

    pub fn clear_filter(&mut self, column: &str) -> bool {
        let cleared = self.filters.clear(column);
        if cleared {
            debug!(column, "filter cleared");
        }
        cleared
    }

    /// Selects one value for a column, or every value when `value` is `None`.
    pub fn select_filter_value(
        &mut self,
        column: &str,
        value: Option<CellValue>,
    ) -> ReconcileResult<()> {
        match value {
            Some(value) => self.set_filter(Predicate::equals(column, value)),
            None => {
                if !self.dataset.has_column(column) {
                    return Err(ReconcileError::InvalidFilterColumn {
                        column: column.to_owned(),
                    });
                }
                self.clear_filter(column);
                Ok(())
            }
        }
    }

    pub fn set_visible_columns<S: AsRef<str>>(&mut self, requested: &[S]) -> ReconcileResult<()> {
        self.visible = self
            .reconciler
            .toggle_columns(&self.dataset, &self.visible, requested)?;
        Ok(())
    }

    pub fn hide_columns<S: AsRef<str>>(&mut self, hidden: &[S]) -> ReconcileResult<()> {
        for column in hidden {
            if !self.dataset.has_column(column.as_ref()) {
                return Err(ReconcileError::InvalidVisibleColumn {
                    column: column.as_ref().to_owned(),
                });
            }
        }
        let requested = ColumnSet::hiding(&self.dataset, hidden);
        self.set_visible_columns(requested.names())
    }

    /// Flips one column's visibility and returns whether it is now shown.
    pub fn toggle_column(&mut self, column: &str) -> ReconcileResult<bool> {
        let mut requested = self.visible.names().to_vec();
        let shown = if self.visible.contains(column) {
            requested.retain(|name| name != column);
            false
        } else {
            requested.push(column.to_owned());
            true
        };
        self.set_visible_columns(&requested)?;
        Ok(shown)
    }

    /// Sorted distinct values for a sidebar selector.
    pub fn filter_options(&self, column: &str) -> ReconcileResult<Vec<CellValue>> {
        if !self.dataset.has_column(column) {
            return Err(ReconcileError::InvalidFilterColumn {
                column: column.to_owned(),
            });
        }
        Ok(self.dataset.distinct_values(column))
    }

    /// Merges an edited view into the dataset. The dataset is untouched on
    /// error.
    pub fn commit(&mut self, presented: &View, edited: &View) -> ReconcileResult<MergeSummary> {
        let merged = match self.reconciler.merge(&self.dataset, presented, edited) {
            Ok(merged) => merged,
            Err(error) => {
                warn!(%error, "edit rejected");
                return Err(error);
            }
        };
        if !merged.summary.is_empty() {
            self.dataset = merged.dataset;
            self.cache.invalidate();
        }
        info!(
            version = self.dataset.version().get(),
            changes = %merged.summary.describe(),
            "edits committed"
        );
        Ok(merged.summary)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dataset.version() != self.saved_version
    }

    pub fn mark_saved(&mut self) {
        self.saved_version = self.dataset.version();
    }

    /// Swaps in a freshly loaded dataset. Filters and visible columns that no
    /// longer exist are dropped.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.saved_version = self.dataset.version();
        self.cache.invalidate();

        let stale_filters = self
            .filters
            .predicates()
            .iter()
            .map(|predicate| predicate.column.clone())
            .filter(|column| !self.dataset.has_column(column))
            .collect::<Vec<_>>();
        for column in &stale_filters {
            self.filters.clear(column);
        }
        self.filter_columns
            .retain(|column| self.dataset.has_column(column));

        let visible = self
            .visible
            .iter()
            .filter(|column| self.dataset.has_column(column))
            .collect::<Vec<_>>();
        self.visible = if visible.is_empty() && !self.visible.is_empty() {
            ColumnSet::all(&self.dataset)
        } else {
            ColumnSet::new(visible)
        };

        if !stale_filters.is_empty() {
            warn!(columns = ?stale_filters, "dropped filters on missing columns");
        }
        info!(rows = self.dataset.len(), "dataset reloaded");
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_rows: self.dataset.len(),
            filtered_rows: self
                .dataset
                .rows()
                .iter()
                .filter(|row| self.filters.matches(row))
                .count(),
            visible_columns: self.visible.len(),
            total_columns: self.dataset.columns().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::model::{CellValue, ColumnSet, Dataset, Predicate};
    use crate::reconcile::{EditPolicy, ReconcileError, ViewReconciler};
    use crate::schema::TableSchema;
    use crate::state::{AppCommand, AppMode};
    use crate::RowId;
    use anyhow::Result;

    fn dataset() -> Result<Dataset> {
        let mut dataset = Dataset::new(["cat", "val", "note"])?;
        dataset.push_row(vec!["A".into(), 10.into(), "x".into()])?;
        dataset.push_row(vec!["B".into(), 20.into(), "y".into()])?;
        dataset.push_row(vec!["A".into(), 30.into(), "z".into()])?;
        Ok(dataset)
    }

    fn session() -> Result<Session> {
        Ok(Session::start(
            dataset()?,
            ViewReconciler::new(EditPolicy::dynamic_rows(), TableSchema::empty()),
            8,
        ))
    }

    #[test]
    fn view_is_served_from_cache_until_commit() -> Result<()> {
        let mut session = session()?;
        session.set_filter(Predicate::equals("cat", "A"))?;

        let first = session.view()?;
        let second = session.view()?;
        assert_eq!(first, second);
        assert_eq!(session.cache_stats().hits, 1);
        assert_eq!(session.cache_stats().misses, 1);

        let mut edited = first.clone();
        edited.set_value(0, 1, CellValue::Int(11));
        let summary = session.commit(&first, &edited)?;
        assert_eq!(summary.updated_cells, 1);
        assert_eq!(session.cache_stats().entries, 0);

        let third = session.view()?;
        assert_eq!(third.value(0, "val"), Some(&CellValue::Int(11)));
        assert_eq!(session.cache_stats().misses, 2);
        Ok(())
    }

    #[test]
    fn rejected_commit_keeps_the_dataset() -> Result<()> {
        let mut session = Session::start(
            dataset()?,
            ViewReconciler::new(EditPolicy::default(), TableSchema::empty()),
            8,
        );
        let view = session.view()?;
        let mut edited = view.clone();
        edited.set_value(0, 1, CellValue::Int(99));
        edited.push_blank_row(RowId::new(9));

        let error = session
            .commit(&view, &edited)
            .expect_err("orphan row should fail");
        assert_eq!(
            error,
            ReconcileError::OrphanEditIdentifier { id: RowId::new(9) }
        );
        assert_eq!(session.dataset(), &dataset()?);
        assert!(!session.has_unsaved_changes());
        Ok(())
    }

    #[test]
    fn unsaved_changes_follow_the_version() -> Result<()> {
        let mut session = session()?;
        let view = session.view()?;
        session.commit(&view, &view)?;
        assert!(!session.has_unsaved_changes());

        let mut edited = view.clone();
        edited.set_value(1, 2, CellValue::text("changed"));
        session.commit(&view, &edited)?;
        assert!(session.has_unsaved_changes());

        session.mark_saved();
        assert!(!session.has_unsaved_changes());
        Ok(())
    }

    #[test]
    fn column_selection_round_trips() -> Result<()> {
        let mut session = session()?;
        session.hide_columns(&["note"])?;
        assert_eq!(session.visible_columns(), &ColumnSet::new(["cat", "val"]));

        assert!(session.toggle_column("note")?);
        assert_eq!(
            session.visible_columns(),
            &ColumnSet::new(["cat", "val", "note"])
        );
        assert!(!session.toggle_column("cat")?);

        let error = session
            .set_visible_columns(&["unknown"])
            .expect_err("unknown column should fail");
        assert!(matches!(error, ReconcileError::InvalidVisibleColumn { .. }));
        assert_eq!(session.visible_columns(), &ColumnSet::new(["val", "note"]));
        Ok(())
    }

    #[test]
    fn stats_count_filtered_rows() -> Result<()> {
        let mut session = session()?;
        session.select_filter_value("cat", Some(CellValue::text("A")))?;
        let stats = session.stats();
        assert_eq!((stats.total_rows, stats.filtered_rows), (3, 2));

        session.select_filter_value("cat", None)?;
        assert_eq!(session.stats().filtered_rows, 3);
        assert_eq!(
            session.filter_options("cat")?,
            vec![CellValue::text("A"), CellValue::text("B")]
        );
        Ok(())
    }

    #[test]
    fn unknown_filter_columns_are_rejected() -> Result<()> {
        let mut session = session()?;
        let error = session
            .set_filter(Predicate::equals("missing", "A"))
            .expect_err("unknown filter column should fail");
        assert_eq!(
            error,
            ReconcileError::InvalidFilterColumn {
                column: "missing".to_owned()
            }
        );
        assert!(session.set_filter_columns(&["cat", "missing"]).is_err());
        session.set_filter_columns(&["cat", "cat"])?;
        assert_eq!(session.filter_columns(), ["cat".to_owned()]);
        Ok(())
    }

    #[test]
    fn replace_dataset_drops_stale_selection() -> Result<()> {
        let mut session = session()?;
        session.set_filter(Predicate::equals("note", "x"))?;
        session.set_filter_columns(&["note"])?;
        session.hide_columns(&["cat"])?;
        session.view()?;

        let mut reloaded = Dataset::new(["cat", "val"])?;
        reloaded.push_row(vec!["C".into(), 5.into()])?;
        session.replace_dataset(reloaded);

        assert!(session.filters().is_empty());
        assert!(session.filter_columns().is_empty());
        assert_eq!(session.visible_columns(), &ColumnSet::new(["val"]));
        assert_eq!(session.cache_stats().entries, 0);
        assert_eq!(session.view()?.len(), 1);
        Ok(())
    }

    #[test]
    fn end_returns_the_merged_dataset() -> Result<()> {
        let mut session = session()?;
        session.dispatch(AppCommand::EnterEditMode);
        assert_eq!(session.state().mode, AppMode::Edit);

        let view = session.view()?;
        let mut edited = view.clone();
        edited.remove_row(1);
        session.commit(&view, &edited)?;

        let dataset = session.end();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.contains(RowId::new(2)));
        Ok(())
    }
}

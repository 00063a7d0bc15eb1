// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::Date;

use crate::ids::{DatasetVersion, RowId};

static EMPTY_CELL: CellValue = CellValue::Empty;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Date(Date),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Plain rendering used for storage and as the fallback grid text.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Int(value) => value.to_string(),
            Self::Date(value) => crate::validation::format_date(*value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Date> for CellValue {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    values: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn value(&self, column: &str) -> &CellValue {
        self.values.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub(crate) fn set(&mut self, column: &str, value: CellValue) {
        self.values.insert(column.to_owned(), value);
    }
}

/// The authoritative table for one session.
///
/// Every row carries a value for every column, and row ids never change once
/// assigned. The only mutation paths are `push_row` while loading and the
/// reconciler's merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    version: DatasetVersion,
    next_id: RowId,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect::<Vec<String>>();
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.trim().is_empty() {
                bail!("column names must not be blank -- check the header row");
            }
            if !seen.insert(column.as_str()) {
                bail!("column {column:?} appears more than once -- column names must be unique");
            }
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
            version: DatasetVersion::INITIAL,
            next_id: RowId::new(1),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub const fn version(&self) -> DatasetVersion {
        self.version
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.row(id).is_some()
    }

    /// The id a new row should take. Ids of deleted rows are never handed out
    /// again.
    pub const fn next_row_id(&self) -> RowId {
        self.next_id
    }

    /// Appends a row with values given in column order and returns its new id.
    pub fn push_row(&mut self, values: Vec<CellValue>) -> Result<RowId> {
        if values.len() != self.columns.len() {
            bail!(
                "row has {} values but the table has {} columns",
                values.len(),
                self.columns.len()
            );
        }
        let id = self.next_id;
        self.next_id = id.next();
        self.rows.push(Row {
            id,
            values: self.columns.iter().cloned().zip(values).collect(),
        });
        Ok(id)
    }

    /// Sorted unique values of one column; these feed the sidebar selectors.
    pub fn distinct_values(&self, column: &str) -> Vec<CellValue> {
        self.rows
            .iter()
            .map(|row| row.value(column).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    pub(crate) fn insert_row(&mut self, id: RowId, values: BTreeMap<String, CellValue>) {
        let values = self
            .columns
            .iter()
            .map(|column| {
                let value = values.get(column).cloned().unwrap_or(CellValue::Empty);
                (column.clone(), value)
            })
            .collect();
        self.rows.push(Row { id, values });
        self.next_id = self.next_id.max(id.next());
    }

    pub(crate) fn remove_rows(&mut self, ids: &BTreeSet<RowId>) {
        self.rows.retain(|row| !ids.contains(&row.id));
    }

    pub(crate) fn bump_version(&mut self) {
        self.version = self.version.bump();
    }
}

/// Ordered, duplicate-free column names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
    /// Repeated names keep their first position.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !names.contains(&column) {
                names.push(column);
            }
        }
        Self(names)
    }

    pub fn all(dataset: &Dataset) -> Self {
        Self(dataset.columns().to_vec())
    }

    /// Every dataset column except `hidden`, in dataset order.
    pub fn hiding<S: AsRef<str>>(dataset: &Dataset, hidden: &[S]) -> Self {
        Self(
            dataset
                .columns()
                .iter()
                .filter(|column| !hidden.iter().any(|name| name.as_ref() == column.as_str()))
                .cloned()
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|name| name == column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.0.iter().position(|name| name == column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for ColumnSet {
    fn from(columns: Vec<String>) -> Self {
        Self::new(columns)
    }
}

/// `column ∈ allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub allowed: BTreeSet<CellValue>,
}

impl Predicate {
    pub fn one_of<I>(column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = CellValue>,
    {
        Self {
            column: column.into(),
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn equals(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::one_of(column, [value.into()])
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.allowed.contains(row.value(&self.column))
    }
}

/// Predicates combined with AND, at most one per column, kept sorted by column
/// so equal criteria compare equal regardless of the order they were set in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    predicates: Vec<Predicate>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.set(predicate);
        self
    }

    pub fn set(&mut self, predicate: Predicate) {
        match self
            .predicates
            .binary_search_by(|existing| existing.column.cmp(&predicate.column))
        {
            Ok(index) => self.predicates[index] = predicate,
            Err(index) => self.predicates.insert(index, predicate),
        }
    }

    pub fn clear(&mut self, column: &str) -> bool {
        let before = self.predicates.len();
        self.predicates.retain(|predicate| predicate.column != column);
        before != self.predicates.len()
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.predicates
            .iter()
            .find(|predicate| predicate.column == column)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(row))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub id: RowId,
    pub values: Vec<CellValue>,
}

/// A filtered, column-pruned projection of a dataset for one render cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub columns: ColumnSet,
    pub rows: Vec<ViewRow>,
}

impl View {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|row| row.id).collect()
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let column = self.columns.position(column)?;
        self.rows.get(row)?.values.get(column)
    }

    /// Overwrites one cell; returns false when the coordinates are out of range.
    pub fn set_value(&mut self, row: usize, column: usize, value: CellValue) -> bool {
        match self
            .rows
            .get_mut(row)
            .and_then(|row| row.values.get_mut(column))
        {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Appends an empty row with the given id, shaped to this view's columns.
    pub fn push_blank_row(&mut self, id: RowId) {
        self.rows.push(ViewRow {
            id,
            values: vec![CellValue::Empty; self.columns.len()],
        });
    }

    pub fn remove_row(&mut self, row: usize) -> Option<ViewRow> {
        (row < self.rows.len()).then(|| self.rows.remove(row))
    }
}

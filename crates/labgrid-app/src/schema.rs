// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const STATUS_OPTIONS: [&str; 5] = ["진행중", "완료", "중단", "검토중", "준비중"];
pub const PHASE_OPTIONS: [&str; 7] = [
    "계획",
    "실험",
    "데이터수집",
    "분석",
    "검증",
    "논문작성",
    "특허출원",
];

pub const RESEARCH_COLUMNS: [&str; 13] = [
    "Project_ID",
    "Project_Name",
    "Principal_Investigator",
    "Department",
    "Start_Date",
    "End_Date",
    "Budget",
    "Progress",
    "Research_Area",
    "Status",
    "Current_Phase",
    "Review_Comments",
    "Action_Items",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Money,
    Date,
    Progress { min: i64, max: i64 },
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub label: String,
    pub kind: ColumnKind,
    pub read_only: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, label: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_owned(),
            label: label.to_owned(),
            kind,
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Per-column typing, labels and edit rules. Columns without a spec are plain
/// editable text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The research-project register the dashboard was built around.
    pub fn research_projects() -> Self {
        Self::new(vec![
            ColumnSpec::new("Project_ID", "프로젝트 ID", ColumnKind::Text).read_only(),
            ColumnSpec::new("Project_Name", "프로젝트명", ColumnKind::Text).read_only(),
            ColumnSpec::new("Principal_Investigator", "책임자", ColumnKind::Text),
            ColumnSpec::new("Department", "부서", ColumnKind::Text),
            ColumnSpec::new("Start_Date", "시작일", ColumnKind::Date),
            ColumnSpec::new("End_Date", "종료일", ColumnKind::Date),
            ColumnSpec::new("Budget", "예산", ColumnKind::Money),
            ColumnSpec::new(
                "Progress",
                "진행률",
                ColumnKind::Progress { min: 0, max: 100 },
            ),
            ColumnSpec::new("Research_Area", "연구분야", ColumnKind::Text),
            ColumnSpec::new(
                "Status",
                "상태",
                ColumnKind::Choice(options(&STATUS_OPTIONS)),
            ),
            ColumnSpec::new(
                "Current_Phase",
                "현재단계",
                ColumnKind::Choice(options(&PHASE_OPTIONS)),
            ),
            ColumnSpec::new("Review_Comments", "검토 의견", ColumnKind::Text),
            ColumnSpec::new("Action_Items", "조치 사항", ColumnKind::Text),
        ])
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.name == name)
    }

    pub fn kind(&self, name: &str) -> Option<&ColumnKind> {
        self.column(name).map(|spec| &spec.kind)
    }

    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.column(name).map_or(name, |spec| spec.label.as_str())
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.column(name).is_some_and(|spec| spec.read_only)
    }
}

fn options(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

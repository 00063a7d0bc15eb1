// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use labgrid_app::schema::{PHASE_OPTIONS, RESEARCH_COLUMNS, STATUS_OPTIONS};
use labgrid_app::{CellValue, Dataset};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};

const INVESTIGATORS: [&str; 10] = [
    "김지원",
    "이성민",
    "박도현",
    "정수진",
    "최영호",
    "강민서",
    "윤지현",
    "송태호",
    "임하늘",
    "한소희",
];

const DEPARTMENTS: [&str; 8] = [
    "생명과학부",
    "물리학과",
    "화학과",
    "컴퓨터공학과",
    "전자공학과",
    "기계공학과",
    "의학과",
    "약학과",
];

const RESEARCH_AREAS: [&str; 8] = [
    "인공지능",
    "신약개발",
    "재생에너지",
    "나노기술",
    "로보틱스",
    "바이오테크",
    "양자컴퓨팅",
    "신소재",
];

pub const DEFAULT_PROJECT_COUNT: usize = 50;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for research-project register rows.
#[derive(Debug, Clone)]
pub struct ResearchFaker {
    rng: DeterministicRng,
    today: Date,
}

impl ResearchFaker {
    pub fn new(seed: u64, today: Date) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            today,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// One register row for the 1-based project `number`, in
    /// `RESEARCH_COLUMNS` order.
    pub fn project(&mut self, number: usize) -> Vec<CellValue> {
        let investigator = self.pick(&INVESTIGATORS);
        let department = self.pick(&DEPARTMENTS);
        let started_ago = self.int_range(0, 364);
        let ends_in = self.int_range(30, 729);
        let start = self.today - Duration::days(started_ago);
        let end = self.today + Duration::days(ends_in);
        let budget = self.int_range(5_000, 49_999) * 10_000;
        let progress = self.int_range(0, 100);
        let area = self.pick(&RESEARCH_AREAS);
        let status = self.pick(&STATUS_OPTIONS);
        let phase = self.pick(&PHASE_OPTIONS);

        vec![
            CellValue::text(format!("PRJ-{number:03}")),
            CellValue::text(format!("Research Project {number}")),
            investigator.into(),
            department.into(),
            start.into(),
            end.into(),
            budget.into(),
            progress.into(),
            area.into(),
            status.into(),
            phase.into(),
            CellValue::Empty,
            CellValue::Empty,
        ]
    }

    pub fn research_dataset(&mut self, count: usize) -> Result<Dataset> {
        let mut dataset = Dataset::new(RESEARCH_COLUMNS)?;
        for number in 1..=count {
            dataset
                .push_row(self.project(number))
                .with_context(|| format!("generate project {number}"))?;
        }
        Ok(dataset)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

/// The two-row table used throughout the reconciliation tests.
pub fn sample_dataset() -> Result<Dataset> {
    let mut dataset = Dataset::new(["cat", "val"])?;
    dataset.push_row(vec!["A".into(), 10.into()])?;
    dataset.push_row(vec!["B".into(), 20.into()])?;
    Ok(dataset)
}

pub fn temp_data_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let data_path = dir.path().join("projects.csv");
    Ok((dir, data_path))
}

pub const fn fixture_date() -> Date {
    date!(2026 - 02 - 19)
}

pub fn departments() -> &'static [&'static str] {
    &DEPARTMENTS
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Date, Month};

use crate::model::CellValue;
use crate::schema::ColumnKind;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";
pub const MONEY_SUFFIX: &str = "원";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidInt,
    InvalidMoney,
    NegativeMoney,
    InvalidDate,
    OutOfRange { min: i64, max: i64 },
    UnknownOption,
    WrongKind,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInt => f.write_str("invalid integer value"),
            Self::InvalidMoney => f.write_str("invalid money value"),
            Self::NegativeMoney => f.write_str("negative money value"),
            Self::InvalidDate => write!(f, "invalid date value (use {DATE_LAYOUT})"),
            Self::OutOfRange { min, max } => write!(f, "value must be between {min} and {max}"),
            Self::UnknownOption => f.write_str("value is not one of the allowed options"),
            Self::WrongKind => f.write_str("value has the wrong type for this column"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Parses user or file input for a column of the given kind. Blank input is
/// always `CellValue::Empty`.
pub fn parse_cell(kind: &ColumnKind, input: &str) -> ValidationResult<CellValue> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(CellValue::Empty);
    }

    match kind {
        ColumnKind::Text => Ok(CellValue::text(input)),
        ColumnKind::Integer => parse_int(trimmed).map(CellValue::Int),
        ColumnKind::Money => parse_money(trimmed).map(CellValue::Int),
        ColumnKind::Date => parse_date(trimmed).map(CellValue::Date),
        ColumnKind::Progress { min, max } => {
            let value = parse_int(trimmed)?;
            check_range(value, *min, *max)?;
            Ok(CellValue::Int(value))
        }
        ColumnKind::Choice(options) => {
            if options.iter().any(|option| option == trimmed) {
                Ok(CellValue::text(trimmed))
            } else {
                Err(ValidationError::UnknownOption)
            }
        }
    }
}

/// Parses a cell of a column the schema knows nothing about: integers stay
/// integers, everything else is text.
pub fn infer_cell(input: &str) -> CellValue {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    // Only canonical integers; `007`, `+5` and padded digits stay text so
    // they are written back exactly as read.
    match input.parse::<i64>() {
        Ok(value) if value.to_string() == input => CellValue::Int(value),
        _ => CellValue::text(input),
    }
}

/// Checks an already-typed value against a column kind.
pub fn check_cell(kind: &ColumnKind, value: &CellValue) -> ValidationResult<()> {
    match (kind, value) {
        (_, CellValue::Empty) => Ok(()),
        (ColumnKind::Text, CellValue::Text(_)) => Ok(()),
        (ColumnKind::Integer, CellValue::Int(_)) => Ok(()),
        (ColumnKind::Money, CellValue::Int(value)) => {
            if *value < 0 {
                Err(ValidationError::NegativeMoney)
            } else {
                Ok(())
            }
        }
        (ColumnKind::Date, CellValue::Date(_)) => Ok(()),
        (ColumnKind::Progress { min, max }, CellValue::Int(value)) => {
            check_range(*value, *min, *max)
        }
        (ColumnKind::Choice(options), CellValue::Text(value)) => {
            if options.iter().any(|option| option == value) {
                Ok(())
            } else {
                Err(ValidationError::UnknownOption)
            }
        }
        _ => Err(ValidationError::WrongKind),
    }
}

/// Grid rendering of a cell.
pub fn format_cell(kind: &ColumnKind, value: &CellValue) -> String {
    match (kind, value) {
        (ColumnKind::Money, CellValue::Int(amount)) => format_money(*amount),
        (ColumnKind::Progress { .. }, CellValue::Int(percent)) => format!("{percent}%"),
        _ => value.display(),
    }
}

pub fn format_money(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!(
        "{sign}{}{MONEY_SUFFIX}",
        comma_format(amount.unsigned_abs())
    )
}

pub fn format_date(value: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part, which is dropped.
pub fn parse_date(input: &str) -> ValidationResult<Date> {
    let trimmed = input.trim();
    let date_part = match trimmed.char_indices().nth(10) {
        Some((index, ' ' | 'T')) => &trimmed[..index],
        Some(_) => return Err(ValidationError::InvalidDate),
        None => trimmed,
    };

    let mut parts = date_part.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::InvalidDate);
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return Err(ValidationError::InvalidDate);
    }

    let year = year
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidDate)?;
    let month = month
        .parse::<u8>()
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .ok_or(ValidationError::InvalidDate)?;
    let day = day.parse::<u8>().map_err(|_| ValidationError::InvalidDate)?;
    Date::from_calendar_date(year, month, day).map_err(|_| ValidationError::InvalidDate)
}

fn parse_int(input: &str) -> ValidationResult<i64> {
    input
        .replace(',', "")
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidInt)
}

fn parse_money(input: &str) -> ValidationResult<i64> {
    let clean = input
        .strip_suffix(MONEY_SUFFIX)
        .unwrap_or(input)
        .trim()
        .replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }
    if clean.is_empty() || !clean.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidMoney);
    }
    clean
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidMoney)
}

fn check_range(value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { min, max });
    }
    Ok(())
}

fn comma_format(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(',');
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}

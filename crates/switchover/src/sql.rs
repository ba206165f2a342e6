/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Rendering of values and statements as SQL text.
//!
//! Rows cross between endpoints as [`SqlValue`]s. Anything that ends up in generated SQL is
//! rendered here: table names come from [`BusinessTable`], column names are always quoted
//! identifiers, and values are literals escaped by their semantic type.

use chrono::{DateTime, NaiveDateTime, Utc};
use model::table::BusinessTable;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum_macros::{AsRefStr, Display};

/// How a column's values are converted and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnKind {
    /// Maps an `information_schema.columns.data_type` value. Everything without a dedicated
    /// kind (dates, json, enums, arrays, ...) round-trips as quoted text.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "smallint" | "integer" | "bigint" => ColumnKind::Integer,
            "numeric" | "decimal" | "real" | "double precision" => ColumnKind::Decimal,
            "boolean" => ColumnKind::Boolean,
            "timestamp with time zone" | "timestamp without time zone" => ColumnKind::Timestamp,
            _ => ColumnKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    /// Kept as text so no precision is lost
    Decimal(String),
    Boolean(bool),
    /// Canonical form, see [`canonical_timestamp`]
    Timestamp(String),
    Text(String),
}

pub type Row = Vec<SqlValue>;

impl SqlValue {
    /// Converts the text rendering of a value, as postgres produces it for `column::text`,
    /// into a typed value.
    pub fn from_text(kind: ColumnKind, text: Option<&str>) -> Result<SqlValue, String> {
        let Some(text) = text else {
            return Ok(SqlValue::Null);
        };
        match kind {
            ColumnKind::Integer => text
                .trim()
                .parse()
                .map(SqlValue::Integer)
                .map_err(|e| format!("{text:?} is not an integer: {e}")),
            ColumnKind::Decimal => Ok(SqlValue::Decimal(text.trim().to_string())),
            ColumnKind::Boolean => match text.trim() {
                "t" | "true" | "TRUE" => Ok(SqlValue::Boolean(true)),
                "f" | "false" | "FALSE" => Ok(SqlValue::Boolean(false)),
                other => Err(format!("{other:?} is not a boolean")),
            },
            ColumnKind::Timestamp => Ok(SqlValue::Timestamp(canonical_timestamp(text))),
            ColumnKind::Text => Ok(SqlValue::Text(text.to_string())),
        }
    }

    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(value) => value.to_string(),
            SqlValue::Decimal(value) if is_plain_number(value) => value.clone(),
            // NaN and Infinity have to be quoted
            SqlValue::Decimal(value) => quote_literal(value),
            SqlValue::Boolean(true) => "TRUE".to_string(),
            SqlValue::Boolean(false) => "FALSE".to_string(),
            SqlValue::Timestamp(value) | SqlValue::Text(value) => quote_literal(value),
        }
    }
}

fn is_plain_number(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Normalizes a timestamp so both endpoints render the same instant the same way.
///
/// Zoned values are converted to UTC, `2024-03-05 08:11:12.500000+00:00`. Naive values keep
/// their wall clock, `2024-03-05 10:11:12.000000`. Anything else (`infinity`, custom formats)
/// is returned unchanged.
pub fn canonical_timestamp(text: &str) -> String {
    let text = text.trim();
    let zoned = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
        .or_else(|_| DateTime::parse_from_rfc3339(text));
    if let Ok(zoned) = zoned {
        return zoned
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S%.6f+00:00")
            .to_string();
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"));
    match naive {
        Ok(naive) => naive.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        Err(_) => text.to_string(),
    }
}

/// A single INSERT carrying one or more rows
pub fn insert_statement(table: BusinessTable, columns: &[String], rows: &[Row]) -> String {
    let columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let values = rows
        .iter()
        .map(|row| {
            let literals = row.iter().map(SqlValue::to_literal).collect::<Vec<_>>();
            format!("({})", literals.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES {values};",
        table.quoted()
    )
}

/// Order-independent SHA-256 over the rendered rows, hex encoded
pub fn rows_digest(rows: &[Row]) -> String {
    let mut row_digests: Vec<[u8; 32]> = rows
        .iter()
        .map(|row| {
            let mut hasher = Sha256::new();
            for value in row {
                hasher.update(value.to_literal().as_bytes());
                hasher.update([0x1f]);
            }
            hasher.finalize().into()
        })
        .collect();
    row_digests.sort_unstable();

    let mut hasher = Sha256::new();
    for digest in &row_digests {
        hasher.update(digest);
    }
    hex::encode(hasher.finalize())
}

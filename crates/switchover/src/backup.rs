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

//! Pre-switch backups of the source endpoint.
//!
//! A backup is a plain SQL script: one INSERT per row, grouped per table in dependency order
//! and wrapped in `BEGIN; ... COMMIT;`. Restoring never executes the script. It is parsed into
//! a [`RestorePlan`] of typed INSERTs into allow-listed tables, and the client renders those
//! again.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use model::connection::ConnectionId;
use model::table::BusinessTable;

use crate::client::{ClientError, InsertStatement, RelationalClient, RestorePlan, RestoreSummary};
use crate::sql::{Row, SqlValue, insert_statement};

pub const SWITCH_BACKUP_PURPOSE: &str = "pre-switch";
pub const ROLLBACK_BACKUP_PURPOSE: &str = "pre-rollback";

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("Unable to back up {table}: {source}")]
    Read {
        table: BusinessTable,
        #[source]
        source: ClientError,
    },
    #[error("Unable to write backup {path}: {error}")]
    Write { path: String, error: String },
    #[error("Unable to read backup {path}: {error}")]
    Load { path: String, error: String },
    #[error("Restore script rejected at line {line}: {reason}")]
    Rejected { line: usize, reason: String },
    #[error("Restore failed: {0}")]
    Restore(#[source] ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBackup {
    pub table: BusinessTable,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupScript {
    pub sql: String,
    pub tables: Vec<TableBackup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub tables: Vec<TableBackup>,
}

#[derive(Debug, Clone)]
pub struct BackupGenerator {
    dir: PathBuf,
}

impl BackupGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<purpose>-<timestamp>-<source>-to-<target>.sql`, timestamp in ISO 8601 basic format
    pub fn artifact_name(
        purpose: &str,
        at: DateTime<Utc>,
        source: ConnectionId,
        target: ConnectionId,
    ) -> String {
        format!(
            "{purpose}-{}-{source}-to-{target}.sql",
            at.format("%Y%m%dT%H%M%S%.3fZ")
        )
    }

    /// Reads every row of `tables` (sorted into dependency order) and renders the script
    pub async fn generate(
        &self,
        client: &dyn RelationalClient,
        tables: &[BusinessTable],
    ) -> Result<BackupScript, BackupError> {
        let tables = BusinessTable::resolve(Some(tables));
        let mut sections = Vec::with_capacity(tables.len());
        for table in &tables {
            let read_error = |source| BackupError::Read {
                table: *table,
                source,
            };
            let columns = client.columns(*table).await.map_err(read_error)?;
            let rows = client
                .fetch_rows(*table, &columns)
                .await
                .map_err(read_error)?;
            let names: Vec<String> = columns.into_iter().map(|c| c.name).collect();
            sections.push((*table, names, rows));
        }

        let mut sql = String::new();
        let table_list = tables.iter().map(|t| t.name()).collect::<Vec<_>>();
        // writing into a String can't fail
        let _ = writeln!(sql, "-- Bursar switchover backup");
        let _ = writeln!(
            sql,
            "-- Generated at: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let _ = writeln!(sql, "-- Tables: {}", table_list.join(", "));
        let _ = writeln!(sql, "BEGIN;");

        let mut summary = Vec::with_capacity(sections.len());
        for (table, columns, rows) in sections {
            let _ = writeln!(sql);
            let _ = writeln!(sql, "-- Table: {table} ({} rows)", rows.len());
            for row in &rows {
                let _ = writeln!(
                    sql,
                    "{}",
                    insert_statement(table, &columns, std::slice::from_ref(row))
                );
            }
            summary.push(TableBackup {
                table,
                rows: rows.len() as u64,
            });
        }
        let _ = writeln!(sql);
        let _ = writeln!(sql, "COMMIT;");

        Ok(BackupScript {
            sql,
            tables: summary,
        })
    }

    pub async fn write(&self, name: &str, script: &str) -> Result<PathBuf, BackupError> {
        let path = self.dir.join(name);
        let write_error = |error: std::io::Error| BackupError::Write {
            path: path.display().to_string(),
            error: error.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_error)?;
        tokio::fs::write(&path, script).await.map_err(write_error)?;
        Ok(path)
    }

    /// Generates a backup and stores it under a deterministic name
    #[tracing::instrument(skip(self, client, tables))]
    pub async fn capture(
        &self,
        client: &dyn RelationalClient,
        tables: &[BusinessTable],
        purpose: &str,
        source: ConnectionId,
        target: ConnectionId,
    ) -> Result<BackupArtifact, BackupError> {
        let script = self.generate(client, tables).await?;
        let name = Self::artifact_name(purpose, Utc::now(), source, target);
        let path = self.write(&name, &script.sql).await?;
        tracing::info!(
            path = %path.display(),
            tables = script.tables.len(),
            rows = script.tables.iter().map(|t| t.rows).sum::<u64>(),
            "Backup written"
        );
        Ok(BackupArtifact {
            path,
            tables: script.tables,
        })
    }

    /// Replaces the contents of `tables` with the rows of `script` in one transaction
    pub async fn restore(
        &self,
        client: &dyn RelationalClient,
        script: &str,
        tables: &[BusinessTable],
    ) -> Result<RestoreSummary, BackupError> {
        let plan = parse_restore_script(script, tables)?;
        client
            .apply_restore(&plan)
            .await
            .map_err(BackupError::Restore)
    }

    #[tracing::instrument(skip(self, client, path, tables), fields(path = %path.display()))]
    pub async fn restore_file(
        &self,
        client: &dyn RelationalClient,
        path: &Path,
        tables: &[BusinessTable],
    ) -> Result<RestoreSummary, BackupError> {
        let script = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BackupError::Load {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        let summary = self.restore(client, &script, tables).await?;
        tracing::info!(
            tables = summary.tables,
            rows = summary.rows,
            "Backup restored"
        );
        Ok(summary)
    }
}

/// Parses a backup script into typed statements.
///
/// Only `BEGIN`, `COMMIT` and `INSERT INTO <table> (<columns>) VALUES (...), ...` are
/// accepted, and every INSERT must target one of `tables`. Consecutive INSERTs with the
/// same table and columns are merged.
pub fn parse_restore_script(
    script: &str,
    tables: &[BusinessTable],
) -> Result<RestorePlan, BackupError> {
    let tables = BusinessTable::resolve(Some(tables));
    let tokens = Lexer::new(script).tokenize()?;

    let mut statements: Vec<InsertStatement> = Vec::new();
    for statement in split_statements(&tokens)? {
        let Some((first, line)) = statement.first() else {
            continue;
        };
        match first {
            Token::Word(word)
                if statement.len() == 1
                    && (word.eq_ignore_ascii_case("BEGIN")
                        || word.eq_ignore_ascii_case("COMMIT")) => {}
            Token::Word(word) if word.eq_ignore_ascii_case("INSERT") => {
                let insert = Parser::new(statement, *line).insert(&tables)?;
                let mergeable = statements
                    .last()
                    .is_some_and(|last| last.table == insert.table && last.columns == insert.columns);
                if mergeable && let Some(last) = statements.last_mut() {
                    last.rows.extend(insert.rows);
                } else {
                    statements.push(insert);
                }
            }
            other => {
                return Err(BackupError::Rejected {
                    line: *line,
                    reason: format!("only INSERT statements can be restored, found {other}"),
                });
            }
        }
    }

    Ok(RestorePlan { tables, statements })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    QuotedIdent(String),
    Str(String),
    Number(String),
    LParen,
    RParen,
    Comma,
    Semicolon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(word) => write!(f, "{word}"),
            Token::QuotedIdent(ident) => write!(f, "\"{ident}\""),
            Token::Str(_) => write!(f, "a string literal"),
            Token::Number(number) => write!(f, "{number}"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
        }
    }
}

type Spanned = (Token, usize);

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn new(script: &str) -> Self {
        Self {
            chars: script.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, BackupError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, BackupError> {
        // whitespace and comments
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                self.line += 1;
                self.pos += 1;
            } else if c.is_whitespace() {
                self.pos += 1;
            } else if c == '-' && self.peek(1) == Some('-') {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }

        let line = self.line;
        let Some(c) = self.peek(0) else {
            return Ok(None);
        };
        let token = match c {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '\'' => Token::Str(self.quoted('\'')?),
            '"' => Token::QuotedIdent(self.quoted('"')?),
            c if c.is_ascii_digit() || self.starts_signed_number() => Token::Number(self.number()),
            c if c.is_alphabetic() || c == '_' => Token::Word(self.word()),
            other => {
                return Err(BackupError::Rejected {
                    line,
                    reason: format!("unexpected character {other:?}"),
                });
            }
        };
        Ok(Some((token, line)))
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn starts_signed_number(&self) -> bool {
        matches!(self.peek(0), Some('-' | '+' | '.'))
            && self.peek(1).is_some_and(|c| c.is_ascii_digit() || c == '.')
    }

    fn quoted(&mut self, quote: char) -> Result<String, BackupError> {
        let start_line = self.line;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Err(BackupError::Rejected {
                        line: start_line,
                        reason: "unterminated quoted value".to_string(),
                    });
                }
                Some(c) if c == quote => {
                    if self.peek(1) == Some(quote) {
                        value.push(quote);
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        return Ok(value);
                    }
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn number(&mut self) -> String {
        let mut number = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek(0) {
            number.push(sign);
            self.pos += 1;
        }
        while let Some(c) = self.peek(0) {
            let exponent_sign =
                matches!(c, '-' | '+') && number.ends_with(|p: char| p == 'e' || p == 'E');
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') || exponent_sign {
                number.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        number
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        word
    }
}

fn split_statements(tokens: &[Spanned]) -> Result<Vec<&[Spanned]>, BackupError> {
    let mut statements = Vec::new();
    let mut start = 0;
    for (index, (token, _)) in tokens.iter().enumerate() {
        if *token == Token::Semicolon {
            statements.push(&tokens[start..index]);
            start = index + 1;
        }
    }
    if let Some((_, line)) = tokens.get(start) {
        return Err(BackupError::Rejected {
            line: *line,
            reason: "statement is not terminated by ';'".to_string(),
        });
    }
    Ok(statements)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn reject(&self, reason: impl Into<String>) -> BackupError {
        BackupError::Rejected {
            line: self.tokens.get(self.pos).map_or(self.line, |(_, line)| *line),
            reason: reason.into(),
        }
    }

    fn next(&mut self) -> Result<&'a Token, BackupError> {
        let token = self
            .tokens
            .get(self.pos)
            .map(|(token, _)| token)
            .ok_or_else(|| self.reject("statement ends unexpectedly"))?;
        self.pos += 1;
        Ok(token)
    }

    fn keyword(&mut self, keyword: &str) -> Result<(), BackupError> {
        match self.next()? {
            Token::Word(word) if word.eq_ignore_ascii_case(keyword) => Ok(()),
            other => Err(self.reject(format!("expected {keyword}, found {other}"))),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), BackupError> {
        let token = self.next()?;
        if *token == expected {
            Ok(())
        } else {
            Err(self.reject(format!("expected {expected}, found {token}")))
        }
    }

    fn name(&mut self) -> Result<String, BackupError> {
        match self.next()? {
            Token::Word(name) | Token::QuotedIdent(name) => Ok(name.clone()),
            other => Err(self.reject(format!("expected a name, found {other}"))),
        }
    }

    fn value(&mut self) -> Result<SqlValue, BackupError> {
        match self.next()? {
            Token::Word(word) if word.eq_ignore_ascii_case("NULL") => Ok(SqlValue::Null),
            Token::Word(word) if word.eq_ignore_ascii_case("TRUE") => Ok(SqlValue::Boolean(true)),
            Token::Word(word) if word.eq_ignore_ascii_case("FALSE") => {
                Ok(SqlValue::Boolean(false))
            }
            Token::Number(number) => Ok(number
                .parse()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Decimal(number.clone()))),
            Token::Str(text) => Ok(SqlValue::Text(text.clone())),
            other => Err(self.reject(format!("expected a literal value, found {other}"))),
        }
    }

    /// Parses a parenthesized, comma separated list
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, BackupError>,
    ) -> Result<Vec<T>, BackupError> {
        self.expect(Token::LParen)?;
        let mut items = vec![item(self)?];
        loop {
            match self.next()? {
                Token::Comma => items.push(item(self)?),
                Token::RParen => return Ok(items),
                other => return Err(self.reject(format!("expected ',' or ')', found {other}"))),
            }
        }
    }

    fn insert(mut self, allowed: &[BusinessTable]) -> Result<InsertStatement, BackupError> {
        self.keyword("INSERT")?;
        self.keyword("INTO")?;
        let table_name = self.name()?;
        let table = BusinessTable::from_str(&table_name)
            .map_err(|_| self.reject(format!("{table_name:?} is not a business table")))?;
        if !allowed.contains(&table) {
            return Err(self.reject(format!("{table} is not part of this restore")));
        }

        let columns = self.list(Self::name)?;
        self.keyword("VALUES")?;
        let mut rows: Vec<Row> = Vec::new();
        loop {
            let row = self.list(Self::value)?;
            if row.len() != columns.len() {
                return Err(self.reject(format!(
                    "{} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row);
            if self.pos < self.tokens.len() {
                self.expect(Token::Comma)?;
            } else {
                break;
            }
        }

        Ok(InsertStatement {
            table,
            columns,
            rows,
        })
    }
}

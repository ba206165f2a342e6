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

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use model::table::BusinessTable;

use crate::client::{
    ClientError, Connector, RelationalClient, RestorePlan, RestoreSummary, ServerInfo,
};
use crate::sql::{Column, ColumnKind, Row, SqlValue, canonical_timestamp};

pub fn columns_for(table: BusinessTable) -> Vec<Column> {
    match table {
        BusinessTable::ClassEnrollments => vec![
            Column::new("student_id", ColumnKind::Integer),
            Column::new("academic_class_id", ColumnKind::Integer),
            Column::new("enrolled_at", ColumnKind::Timestamp),
        ],
        _ => vec![
            Column::new("id", ColumnKind::Integer),
            Column::new("name", ColumnKind::Text),
            Column::new("active", ColumnKind::Boolean),
            Column::new("created_at", ColumnKind::Timestamp),
            Column::new("amount", ColumnKind::Decimal),
        ],
    }
}

/// A row with a quote-laden name and a NULL every third id
pub fn sample_row(table: BusinessTable, id: i64) -> Row {
    match table {
        BusinessTable::ClassEnrollments => vec![
            SqlValue::Integer(id),
            SqlValue::Integer(id % 7 + 1),
            SqlValue::Timestamp("2026-09-01 08:00:00.000000+00:00".to_string()),
        ],
        _ => vec![
            SqlValue::Integer(id),
            SqlValue::Text(format!("O'Brien \"{id}\"")),
            SqlValue::Boolean(id % 2 == 0),
            if id % 3 == 0 {
                SqlValue::Null
            } else {
                SqlValue::Timestamp(format!("2026-10-{:02} 09:30:00.000000+00:00", id % 28 + 1))
            },
            SqlValue::Decimal(format!("{id}.50")),
        ],
    }
}

pub fn sample_rows(table: BusinessTable, ids: impl IntoIterator<Item = i64>) -> Vec<Row> {
    ids.into_iter().map(|id| sample_row(table, id)).collect()
}

#[derive(Clone)]
struct MemoryTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
    /// Next value of the identity sequence, for tables that have one
    next_sequence_value: Option<i64>,
}

impl MemoryTable {
    fn new(table: BusinessTable) -> Self {
        Self {
            columns: columns_for(table),
            rows: Vec::new(),
            next_sequence_value: table.identity_column().map(|_| 1),
        }
    }

    /// Mirrors `setval` to the column maximum
    fn resync(&mut self, column: &str) -> Option<i64> {
        self.next_sequence_value?;
        let index = self.columns.iter().position(|c| c.name == column)?;
        let max = self
            .rows
            .iter()
            .filter_map(|row| match row.get(index) {
                Some(SqlValue::Integer(value)) => Some(*value),
                _ => None,
            })
            .max();
        let next = max.map_or(1, |max| max + 1);
        self.next_sequence_value = Some(next);
        Some(next)
    }
}

#[derive(Default)]
struct DbState {
    unreachable: bool,
    tables: BTreeMap<BusinessTable, MemoryTable>,
    insert_batches: HashMap<BusinessTable, usize>,
    fail_insert_batch: Option<(BusinessTable, usize)>,
    panic_on_fetch: Option<BusinessTable>,
    write_during_fetch: Option<(BusinessTable, Row)>,
    corrupt_inserts: bool,
    fail_restore: bool,
    restores: usize,
    /// (referencing, referenced) pairs, checked on delete like a foreign key
    references: Vec<(BusinessTable, BusinessTable)>,
    deletes: Vec<BusinessTable>,
}

/// An endpoint that keeps its tables in memory and can be told to misbehave
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<DbState>,
}

impl MemoryDatabase {
    pub fn with_tables(tables: &[BusinessTable]) -> Arc<Self> {
        let database = Self::default();
        {
            let mut state = database.state();
            for table in tables {
                state.tables.insert(*table, MemoryTable::new(*table));
            }
        }
        Arc::new(database)
    }

    pub fn with_all_tables() -> Arc<Self> {
        Self::with_tables(&BusinessTable::dependency_order())
    }

    fn state(&self) -> MutexGuard<'_, DbState> {
        // tests panic inside the client on purpose
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, table: BusinessTable, rows: Vec<Row>) {
        self.state()
            .tables
            .get_mut(&table)
            .expect("table exists")
            .rows
            .extend(rows);
    }

    pub fn rows(&self, table: BusinessTable) -> Vec<Row> {
        self.state()
            .tables
            .get(&table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn insert_batches(&self, table: BusinessTable) -> usize {
        self.state()
            .insert_batches
            .get(&table)
            .copied()
            .unwrap_or_default()
    }

    pub fn next_sequence_value(&self, table: BusinessTable) -> Option<i64> {
        self.state()
            .tables
            .get(&table)
            .and_then(|t| t.next_sequence_value)
    }

    /// Deleting from `referenced` fails while `referencing` has rows
    pub fn add_reference(&self, referencing: BusinessTable, referenced: BusinessTable) {
        self.state().references.push((referencing, referenced));
    }

    /// Tables emptied through `delete_all`, in call order
    pub fn deletes(&self) -> Vec<BusinessTable> {
        self.state().deletes.clone()
    }

    pub fn restores(&self) -> usize {
        self.state().restores
    }

    pub fn set_unreachable(&self) {
        self.state().unreachable = true;
    }

    /// The `batch`th insert into `table` (1-based) fails
    pub fn fail_insert_batch(&self, table: BusinessTable, batch: usize) {
        self.state().fail_insert_batch = Some((table, batch));
    }

    pub fn panic_on_fetch(&self, table: BusinessTable) {
        self.state().panic_on_fetch = Some(table);
    }

    /// Adds `row` to `table` right after the next read of it, like a concurrent writer would
    pub fn write_during_fetch(&self, table: BusinessTable, row: Row) {
        self.state().write_during_fetch = Some((table, row));
    }

    /// Every inserted text value is replaced, row counts stay intact
    pub fn corrupt_inserts(&self) {
        self.state().corrupt_inserts = true;
    }

    pub fn fail_restore(&self) {
        self.state().fail_restore = true;
    }

    fn missing(table: BusinessTable) -> ClientError {
        ClientError::query(
            format!("reading {table}"),
            format!("relation \"{table}\" does not exist"),
        )
    }
}

#[async_trait]
impl RelationalClient for MemoryDatabase {
    async fn probe(&self) -> Result<ServerInfo, ClientError> {
        if self.state().unreachable {
            return Err(ClientError::Connect("connection refused".to_string()));
        }
        Ok(ServerInfo {
            version: "PostgreSQL 16.4 (memory)".to_string(),
        })
    }

    async fn table_exists(&self, table: BusinessTable) -> Result<bool, ClientError> {
        Ok(self.state().tables.contains_key(&table))
    }

    async fn columns(&self, table: BusinessTable) -> Result<Vec<Column>, ClientError> {
        self.state()
            .tables
            .get(&table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| Self::missing(table))
    }

    async fn fetch_rows(
        &self,
        table: BusinessTable,
        columns: &[Column],
    ) -> Result<Vec<Row>, ClientError> {
        // the guard must not be held while panicking
        let should_panic = self.state().panic_on_fetch == Some(table);
        if should_panic {
            panic!("simulated crash while reading {table}");
        }

        let mut state = self.state();
        let concurrent_write = if state
            .write_during_fetch
            .as_ref()
            .is_some_and(|(written, _)| *written == table)
        {
            state.write_during_fetch.take()
        } else {
            None
        };
        let stored = state.tables.get_mut(&table).ok_or_else(|| Self::missing(table))?;
        assert_eq!(stored.columns.len(), columns.len());
        let rows = stored.rows.clone();
        if let Some((_, row)) = concurrent_write {
            stored.rows.push(row);
        }
        Ok(rows)
    }

    async fn count_rows(&self, table: BusinessTable) -> Result<u64, ClientError> {
        self.state()
            .tables
            .get(&table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| Self::missing(table))
    }

    async fn delete_all(&self, table: BusinessTable) -> Result<u64, ClientError> {
        let mut state = self.state();
        let blocking = state.references.iter().find(|(referencing, referenced)| {
            *referenced == table
                && state
                    .tables
                    .get(referencing)
                    .is_some_and(|t| !t.rows.is_empty())
        });
        if let Some((referencing, _)) = blocking {
            return Err(ClientError::query(
                format!("emptying {table}"),
                format!(
                    "update or delete on table \"{table}\" violates foreign key constraint \"{referencing}_{table}_fkey\""
                ),
            ));
        }
        state.deletes.push(table);
        let stored = state.tables.get_mut(&table).ok_or_else(|| Self::missing(table))?;
        let deleted = stored.rows.len() as u64;
        stored.rows.clear();
        Ok(deleted)
    }

    async fn insert_rows(
        &self,
        table: BusinessTable,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, ClientError> {
        let mut state = self.state();
        let batch = {
            let counter = state.insert_batches.entry(table).or_default();
            *counter += 1;
            *counter
        };
        if state.fail_insert_batch == Some((table, batch)) {
            return Err(ClientError::query(
                format!("inserting into {table}"),
                "simulated insert failure",
            ));
        }
        let corrupt = state.corrupt_inserts;
        let stored = state.tables.get_mut(&table).ok_or_else(|| Self::missing(table))?;
        if columns.len() != stored.columns.len() || rows.iter().any(|r| r.len() != columns.len())
        {
            return Err(ClientError::query(
                format!("inserting into {table}"),
                "column count mismatch",
            ));
        }
        for row in rows {
            let row = if corrupt {
                row.iter()
                    .map(|value| match value {
                        SqlValue::Text(_) => SqlValue::Text("corrupted".to_string()),
                        other => other.clone(),
                    })
                    .collect()
            } else {
                row.clone()
            };
            stored.rows.push(row);
        }
        Ok(rows.len() as u64)
    }

    async fn resync_sequence(
        &self,
        table: BusinessTable,
        column: &str,
    ) -> Result<Option<i64>, ClientError> {
        let mut state = self.state();
        let stored = state.tables.get_mut(&table).ok_or_else(|| Self::missing(table))?;
        Ok(stored.resync(column))
    }

    async fn apply_restore(&self, plan: &RestorePlan) -> Result<RestoreSummary, ClientError> {
        let mut state = self.state();
        if state.fail_restore {
            return Err(ClientError::query("restore", "simulated restore failure"));
        }

        // work on a copy so a failure leaves everything untouched
        let mut tables = state.tables.clone();
        for table in plan.tables.iter().rev() {
            tables
                .get_mut(table)
                .ok_or_else(|| Self::missing(*table))?
                .rows
                .clear();
        }
        let mut rows = 0;
        for statement in &plan.statements {
            let stored = tables
                .get_mut(&statement.table)
                .ok_or_else(|| Self::missing(statement.table))?;
            rows += statement.rows.len() as u64;
            let kinds: Vec<ColumnKind> = stored.columns.iter().map(|c| c.kind).collect();
            stored.rows.extend(statement.rows.iter().map(|row| {
                row.iter()
                    .zip(&kinds)
                    .map(|(value, kind)| coerce(*kind, value))
                    .collect::<Row>()
            }));
        }
        for table in &plan.tables {
            if let (Some(column), Some(stored)) = (table.identity_column(), tables.get_mut(table)) {
                stored.resync(column);
            }
        }

        state.tables = tables;
        state.restores += 1;
        Ok(RestoreSummary {
            tables: plan.tables.len(),
            rows,
        })
    }
}

/// Restore scripts carry untyped literals; postgres casts them to the column type on insert
fn coerce(kind: ColumnKind, value: &SqlValue) -> SqlValue {
    match (kind, value) {
        (ColumnKind::Timestamp, SqlValue::Text(text)) => {
            SqlValue::Timestamp(canonical_timestamp(text))
        }
        (ColumnKind::Decimal, SqlValue::Integer(value)) => SqlValue::Decimal(value.to_string()),
        (_, value) => value.clone(),
    }
}

/// Resolves connection strings to registered in-memory endpoints
#[derive(Default)]
pub struct MemoryConnector {
    endpoints: Mutex<HashMap<String, Arc<MemoryDatabase>>>,
}

impl MemoryConnector {
    pub fn add(&self, connection_string: &str, database: Arc<MemoryDatabase>) {
        self.endpoints
            .lock()
            .unwrap()
            .insert(connection_string.to_string(), database);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        connection_string: &str,
    ) -> Result<Arc<dyn RelationalClient>, ClientError> {
        let database = self
            .endpoints
            .lock()
            .unwrap()
            .get(connection_string)
            .cloned()
            .ok_or_else(|| ClientError::Connect("no route to host".to_string()))?;
        if database.state().unreachable {
            return Err(ClientError::Connect("connection refused".to_string()));
        }
        Ok(database)
    }
}

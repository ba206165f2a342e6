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

use std::sync::Arc;

use model::connection::ConnectionId;
use model::switch_history::{SwitchKind, SwitchStatus};
use model::switchover::SwitchOptions;
use model::table::BusinessTable;

use super::common::{MemoryDatabase, TestEnv, sample_row, sample_rows};

/// A source with a few rows in every table
fn seeded_source() -> Arc<MemoryDatabase> {
    let source = MemoryDatabase::with_all_tables();
    for table in BusinessTable::dependency_order() {
        source.insert(table, sample_rows(table, 1..=5));
    }
    source
}

async fn source_and_target(env: &TestEnv) -> (Arc<MemoryDatabase>, Arc<MemoryDatabase>, ConnectionId) {
    let source = seeded_source();
    let target = MemoryDatabase::with_all_tables();
    env.add_active_endpoint("primary", source.clone()).await;
    let target_id = env.add_endpoint("replica", target.clone()).await.id;
    (source, target, target_id)
}

async fn active_name(env: &TestEnv) -> Option<String> {
    env.registry
        .get_active()
        .await
        .unwrap()
        .map(|record| record.name)
}

#[tokio::test]
async fn switch_moves_every_table() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), Some("alice"))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.message,
        "Switch to replica (2) completed: 60 rows in 12 tables"
    );
    for table in BusinessTable::dependency_order() {
        assert_eq!(target.rows(table), source.rows(table), "{table}");
    }
    let details = result.details.unwrap();
    assert_eq!(details.total_rows, 60);
    assert_eq!(details.validation_passed, Some(true));
    assert_eq!(
        details
            .migrated_tables
            .iter()
            .map(|t| t.table)
            .collect::<Vec<_>>(),
        BusinessTable::dependency_order()
    );

    let active = env.registry.get_active().await.unwrap().unwrap();
    assert_eq!(active.id, target_id);
    assert_eq!(active.last_switched_by.as_deref(), Some("alice"));
    assert_eq!(env.store.maintenance_writes(), ["true", "false"]);
    assert!(!env.engine.gate().is_enabled().await.unwrap());

    let attempts = env.store.attempts();
    assert_eq!(attempts.len(), 1);
    let attempt = &attempts[0];
    assert_eq!(attempt.kind, SwitchKind::Switch);
    assert_eq!(attempt.status, SwitchStatus::Success);
    assert_eq!(attempt.source_connection_id, Some(ConnectionId(1)));
    assert_eq!(attempt.target_connection_id, target_id);
    assert_eq!(attempt.total_rows, 60);
    assert_eq!(attempt.actor.as_deref(), Some("alice"));
    assert_eq!(attempt.error_message, None);
    assert_eq!(attempt.backup_path, details.backup_path);
}

#[tokio::test]
async fn switch_replaces_existing_target_rows() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    target.insert(BusinessTable::Users, sample_rows(BusinessTable::Users, 100..110));

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        target.rows(BusinessTable::Users),
        source.rows(BusinessTable::Users)
    );
}

#[tokio::test]
async fn referencing_tables_are_emptied_first() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    target.add_reference(BusinessTable::Departments, BusinessTable::Users);
    target.add_reference(BusinessTable::FeePayments, BusinessTable::FeeStructures);
    for table in [
        BusinessTable::Users,
        BusinessTable::Departments,
        BusinessTable::FeeStructures,
        BusinessTable::FeePayments,
    ] {
        target.insert(table, sample_rows(table, 100..103));
    }

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(target.deletes(), BusinessTable::deletion_order());
    for table in BusinessTable::dependency_order() {
        assert_eq!(target.rows(table), source.rows(table), "{table}");
    }
}

#[tokio::test]
async fn selected_tables_are_emptied_in_reverse_dependency_order() {
    let env = TestEnv::new();
    let (_source, target, target_id) = source_and_target(&env).await;
    let options = SwitchOptions {
        tables: Some(vec![
            BusinessTable::Users,
            BusinessTable::LeaveApprovals,
            BusinessTable::Students,
        ]),
        ..Default::default()
    };

    let result = env.engine.switch_database(target_id, options, None).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        target.deletes(),
        [
            BusinessTable::LeaveApprovals,
            BusinessTable::Students,
            BusinessTable::Users
        ]
    );
}

#[tokio::test]
async fn rows_are_inserted_in_batches() {
    let env = TestEnv::new();
    let source = MemoryDatabase::with_tables(&[BusinessTable::Users]);
    source.insert(BusinessTable::Users, sample_rows(BusinessTable::Users, 1..=2500));
    let target = MemoryDatabase::with_tables(&[BusinessTable::Users]);
    env.add_active_endpoint("primary", source).await;
    let target_id = env.add_endpoint("replica", target.clone()).await.id;

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                tables: Some(vec![BusinessTable::Users]),
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(target.insert_batches(BusinessTable::Users), 3);
    assert_eq!(target.rows(BusinessTable::Users).len(), 2500);
    assert_eq!(result.details.unwrap().total_rows, 2500);
}

#[tokio::test]
async fn invalid_requests_are_rejected_without_a_trace() {
    let env = TestEnv::new();
    let (_source, _target, target_id) = source_and_target(&env).await;

    let same = env
        .engine
        .switch_database(ConnectionId(1), SwitchOptions::default(), None)
        .await;
    assert!(!same.success);
    assert!(same.message.contains("already the active connection"), "{}", same.message);
    assert!(same.details.is_none());

    let unknown = env
        .engine
        .switch_database(ConnectionId(99), SwitchOptions::default(), None)
        .await;
    assert!(!unknown.success);
    assert_eq!(unknown.message, "Connection 99 does not exist");

    let zero_batch = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                batch_size: 0,
                ..Default::default()
            },
            None,
        )
        .await;
    assert!(!zero_batch.success);
    assert!(zero_batch.message.contains("batch size"), "{}", zero_batch.message);

    let no_tables = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                tables: Some(vec![]),
                ..Default::default()
            },
            None,
        )
        .await;
    assert!(!no_tables.success);

    assert!(env.store.attempts().is_empty());
    assert!(env.store.maintenance_writes().is_empty());
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
}

#[tokio::test]
async fn missing_target_tables_fail_before_maintenance() {
    let env = TestEnv::new();
    let source = seeded_source();
    let tables: Vec<BusinessTable> = BusinessTable::dependency_order()
        .into_iter()
        .filter(|t| *t != BusinessTable::FeePayments)
        .collect();
    let target = MemoryDatabase::with_tables(&tables);
    env.add_active_endpoint("primary", source).await;
    let target_id = env.add_endpoint("replica", target.clone()).await.id;

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("fee_payments"), "{}", result.message);
    assert!(env.store.maintenance_writes().is_empty());
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    assert!(target.rows(BusinessTable::Users).is_empty());

    let attempts = env.store.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, SwitchStatus::Failed);
    assert!(attempts[0].backup_path.is_none());
}

#[tokio::test]
async fn unreachable_target_is_recorded() {
    let env = TestEnv::new();
    let (_source, target, target_id) = source_and_target(&env).await;
    target.set_unreachable();

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), Some("bob"))
        .await;

    assert!(!result.success);
    assert!(
        result.message.contains("Unable to reach connection 2"),
        "{}",
        result.message
    );
    assert!(env.store.maintenance_writes().is_empty());
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    let attempts = env.store.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, SwitchStatus::Failed);
    assert_eq!(attempts[0].actor.as_deref(), Some("bob"));
}

#[tokio::test]
async fn failed_insert_restores_the_source() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    let original_students = source.rows(BusinessTable::Students);
    target.fail_insert_batch(BusinessTable::Students, 1);

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("Migrating students failed"), "{}", result.message);
    assert!(result.message.contains("source connection restored"), "{}", result.message);
    assert_eq!(source.restores(), 1);
    assert_eq!(source.rows(BusinessTable::Students), original_students);

    // tables moved before the failure stay on the target
    assert_eq!(target.rows(BusinessTable::Users).len(), 5);
    assert!(target.rows(BusinessTable::Students).is_empty());

    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    assert_eq!(env.store.maintenance_writes(), ["true", "false"]);

    let details = result.details.unwrap();
    assert!(details.backup_path.is_some());
    assert!(
        details
            .migrated_tables
            .iter()
            .all(|t| t.table < BusinessTable::Students)
    );

    let attempt = &env.store.attempts()[0];
    assert_eq!(attempt.status, SwitchStatus::RolledBack);
    assert!(attempt.error_message.as_ref().unwrap().contains("simulated insert failure"));
}

#[tokio::test]
async fn restore_failure_keeps_the_original_error() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    target.fail_insert_batch(BusinessTable::Users, 1);
    source.fail_restore();

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("Migrating users failed"), "{}", result.message);
    assert!(result.message.contains("also failed"), "{}", result.message);
    assert_eq!(env.store.attempts()[0].status, SwitchStatus::Failed);
    assert_eq!(env.store.maintenance_writes(), ["true", "false"]);
}

#[tokio::test]
async fn failure_without_backup_is_not_rolled_back() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    target.fail_insert_batch(BusinessTable::Departments, 1);

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                create_backup: false,
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(!result.success);
    assert_eq!(source.restores(), 0);
    assert!(result.details.unwrap().backup_path.is_none());
    assert_eq!(env.store.attempts()[0].status, SwitchStatus::Failed);
    assert!(std::fs::read_dir(env.backup_dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn writes_during_the_switch_fail_validation() {
    let env = TestEnv::new();
    let (source, _target, target_id) = source_and_target(&env).await;
    source.write_during_fetch(BusinessTable::FeePayments, sample_row(BusinessTable::FeePayments, 42));

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                create_backup: false,
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(!result.success);
    assert!(
        result.message.contains("fee_payments changed on the source"),
        "{}",
        result.message
    );
    assert_eq!(result.details.unwrap().validation_passed, Some(false));
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    assert_eq!(env.store.attempts()[0].validation_passed, Some(false));
}

#[tokio::test]
async fn checksum_mismatch_fails_validation() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    target.corrupt_inserts();

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                verify_checksums: true,
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(!result.success);
    assert!(result.message.contains("differ from the source"), "{}", result.message);
    assert_eq!(source.restores(), 1);
    assert_eq!(env.store.attempts()[0].status, SwitchStatus::RolledBack);
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
}

#[tokio::test]
async fn counts_alone_miss_corrupted_values() {
    let env = TestEnv::new();
    let (_source, target, target_id) = source_and_target(&env).await;
    target.corrupt_inserts();

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(result.success, "{}", result.message);
}

#[tokio::test]
async fn panics_are_contained() {
    let env = TestEnv::new();
    let (source, _target, target_id) = source_and_target(&env).await;
    source.panic_on_fetch(BusinessTable::Staff);

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("panic"), "{}", result.message);
    assert!(result.message.contains("simulated crash"), "{}", result.message);
    assert!(!env.engine.gate().is_enabled().await.unwrap());
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    let attempts = env.store.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, SwitchStatus::Failed);
}

#[tokio::test]
async fn failed_activation_rolls_back() {
    let env = TestEnv::new();
    let (source, _target, target_id) = source_and_target(&env).await;
    env.store.fail_activation();

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(!result.success);
    assert!(
        result.message.contains("Activating connection 2 failed"),
        "{}",
        result.message
    );
    assert_eq!(source.restores(), 1);
    let attempt = &env.store.attempts()[0];
    assert_eq!(attempt.status, SwitchStatus::RolledBack);
    assert_eq!(attempt.validation_passed, Some(true));
}

#[tokio::test]
async fn sequences_follow_the_loaded_ids() {
    let env = TestEnv::new();
    let source = MemoryDatabase::with_tables(&[BusinessTable::Users]);
    source.insert(BusinessTable::Users, sample_rows(BusinessTable::Users, [1, 3, 7]));
    let target = MemoryDatabase::with_tables(&[BusinessTable::Users]);
    env.add_active_endpoint("primary", source).await;
    let target_id = env.add_endpoint("replica", target.clone()).await.id;

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                tables: Some(vec![BusinessTable::Users]),
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(target.next_sequence_value(BusinessTable::Users), Some(8));
}

#[tokio::test]
async fn table_selection_limits_the_switch() {
    let env = TestEnv::new();
    let (_source, target, target_id) = source_and_target(&env).await;
    target.insert(BusinessTable::Students, sample_rows(BusinessTable::Students, 50..52));

    let result = env
        .engine
        .switch_database(
            target_id,
            SwitchOptions {
                tables: Some(vec![BusinessTable::FeePayments, BusinessTable::Users]),
                ..Default::default()
            },
            None,
        )
        .await;

    assert!(result.success, "{}", result.message);
    let details = result.details.unwrap();
    assert_eq!(
        details
            .migrated_tables
            .iter()
            .map(|t| t.table)
            .collect::<Vec<_>>(),
        [BusinessTable::Users, BusinessTable::FeePayments]
    );
    assert_eq!(details.total_rows, 10);
    assert_eq!(target.rows(BusinessTable::Students).len(), 2);
    assert!(target.rows(BusinessTable::Notifications).is_empty());

    let backup = std::fs::read_to_string(details.backup_path.unwrap()).unwrap();
    assert!(backup.contains("-- Tables: users, fee_payments"));
    assert!(!backup.contains("INSERT INTO \"students\""));
}

#[tokio::test]
async fn backup_artifact_is_named_after_the_switch() {
    let env = TestEnv::new();
    let (_source, _target, target_id) = source_and_target(&env).await;

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;

    assert!(result.success, "{}", result.message);
    let path = std::path::PathBuf::from(result.details.unwrap().backup_path.unwrap());
    assert_eq!(path.parent(), Some(env.backup_dir.path()));
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("pre-switch-"), "{name}");
    assert!(name.ends_with("-1-to-2.sql"), "{name}");
    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("BEGIN;"));
    assert!(script.contains("-- Table: users (5 rows)"));
    assert!(script.trim_end().ends_with("COMMIT;"));
}

#[tokio::test]
async fn first_switch_only_activates() {
    let env = TestEnv::new();
    let target = MemoryDatabase::with_all_tables();
    let target_id = env.add_endpoint("replica", target.clone()).await.id;

    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), Some("alice"))
        .await;

    assert!(result.success, "{}", result.message);
    let details = result.details.unwrap();
    assert!(details.migrated_tables.is_empty());
    assert!(details.backup_path.is_none());
    assert_eq!(details.validation_passed, None);
    assert_eq!(active_name(&env).await.as_deref(), Some("replica"));
    assert_eq!(env.store.maintenance_writes(), ["true", "false"]);
    assert_eq!(env.store.attempts()[0].source_connection_id, None);
}

#[tokio::test]
async fn rollback_reverses_the_last_switch() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;

    let switched = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), Some("alice"))
        .await;
    assert!(switched.success, "{}", switched.message);

    // written while the replica was serving
    target.insert(BusinessTable::Notifications, vec![sample_row(BusinessTable::Notifications, 6)]);

    let result = env
        .engine
        .rollback_last_switch(SwitchOptions::default(), Some("bob"))
        .await;

    assert!(result.success, "{}", result.message);
    assert!(result.message.starts_with("Rollback to primary (1) completed"), "{}", result.message);
    assert_eq!(active_name(&env).await.as_deref(), Some("primary"));
    assert_eq!(source.rows(BusinessTable::Notifications).len(), 6);

    let name = result.details.unwrap().backup_path.unwrap();
    assert!(name.contains("pre-rollback-"), "{name}");
    assert!(name.ends_with("-2-to-1.sql"), "{name}");

    let attempts = env.store.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].kind, SwitchKind::Rollback);
    assert_eq!(attempts[1].source_connection_id, Some(target_id));
    assert_eq!(attempts[1].target_connection_id, ConnectionId(1));
    assert_eq!(attempts[1].actor.as_deref(), Some("bob"));
}

#[tokio::test]
async fn rollback_onto_a_populated_source() {
    let env = TestEnv::new();
    let (source, target, target_id) = source_and_target(&env).await;
    source.add_reference(BusinessTable::Departments, BusinessTable::Users);
    source.add_reference(BusinessTable::ClassEnrollments, BusinessTable::Students);

    let switched = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;
    assert!(switched.success, "{}", switched.message);
    target.insert(BusinessTable::Users, vec![sample_row(BusinessTable::Users, 6)]);

    let result = env
        .engine
        .rollback_last_switch(SwitchOptions::default(), None)
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(source.deletes(), BusinessTable::deletion_order());
    assert_eq!(source.rows(BusinessTable::Users).len(), 6);
    assert_eq!(
        source.rows(BusinessTable::Departments),
        target.rows(BusinessTable::Departments)
    );
}

#[tokio::test]
async fn rollback_needs_a_successful_switch() {
    let env = TestEnv::new();
    let (_source, target, target_id) = source_and_target(&env).await;

    let result = env
        .engine
        .rollback_last_switch(SwitchOptions::default(), None)
        .await;
    assert!(!result.success);
    assert!(result.message.starts_with("Nothing to roll back"), "{}", result.message);

    target.set_unreachable();
    let failed = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;
    assert!(!failed.success);

    let result = env
        .engine
        .rollback_last_switch(SwitchOptions::default(), None)
        .await;
    assert!(!result.success);
    assert!(result.message.starts_with("Nothing to roll back"), "{}", result.message);
    assert_eq!(env.store.attempts().len(), 1);
}

#[tokio::test]
async fn rollback_refuses_when_the_switch_target_is_no_longer_active() {
    let env = TestEnv::new();
    let (_source, _target, target_id) = source_and_target(&env).await;
    let result = env
        .engine
        .switch_database(target_id, SwitchOptions::default(), None)
        .await;
    assert!(result.success, "{}", result.message);

    env.registry
        .set_active(ConnectionId(1), Some("manual"))
        .await
        .unwrap();

    let result = env
        .engine
        .rollback_last_switch(SwitchOptions::default(), None)
        .await;
    assert!(!result.success);
    assert!(result.message.contains("no longer active"), "{}", result.message);
    assert_eq!(env.store.attempts().len(), 1);
}

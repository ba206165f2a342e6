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

//! The closed set of business tables a switchover moves.
//!
//! Declaration order is foreign-key dependency order: a table only references tables declared
//! above it. Bulk loads walk the list forward, bulk deletes walk it backwards. Table names
//! that end up in generated SQL always come from this enum, never from user input.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BusinessTable {
    Users,
    Departments,
    AcademicClasses,
    Students,
    Staff,
    ClassEnrollments,
    FeeStructures,
    FeePayments,
    RefundRequests,
    LeaveRequests,
    LeaveApprovals,
    Notifications,
}

impl BusinessTable {
    /// All tables in dependency order
    pub fn dependency_order() -> Vec<BusinessTable> {
        BusinessTable::iter().collect()
    }

    /// All tables in the order rows have to be deleted in
    pub fn deletion_order() -> Vec<BusinessTable> {
        let mut tables = Self::dependency_order();
        tables.reverse();
        tables
    }

    /// Sorts an arbitrary selection into dependency order and drops duplicates.
    /// `None` selects every table.
    pub fn resolve(selection: Option<&[BusinessTable]>) -> Vec<BusinessTable> {
        match selection {
            None => Self::dependency_order(),
            Some(tables) => {
                let mut tables = tables.to_vec();
                tables.sort();
                tables.dedup();
                tables
            }
        }
    }

    pub fn name(&self) -> &'static str {
        // must agree with the strum serialization
        match self {
            BusinessTable::Users => "users",
            BusinessTable::Departments => "departments",
            BusinessTable::AcademicClasses => "academic_classes",
            BusinessTable::Students => "students",
            BusinessTable::Staff => "staff",
            BusinessTable::ClassEnrollments => "class_enrollments",
            BusinessTable::FeeStructures => "fee_structures",
            BusinessTable::FeePayments => "fee_payments",
            BusinessTable::RefundRequests => "refund_requests",
            BusinessTable::LeaveRequests => "leave_requests",
            BusinessTable::LeaveApprovals => "leave_approvals",
            BusinessTable::Notifications => "notifications",
        }
    }

    /// The table name as a quoted SQL identifier
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.name())
    }

    /// The auto-increment column whose sequence has to follow bulk loads, if any.
    /// `class_enrollments` is keyed by (student_id, academic_class_id) and has none.
    pub fn identity_column(&self) -> Option<&'static str> {
        match self {
            BusinessTable::ClassEnrollments => None,
            _ => Some("id"),
        }
    }
}

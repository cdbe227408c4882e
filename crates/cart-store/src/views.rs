//! Read-side shapes assembled from carts and history entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ObjectId, StudentId, TeacherId};
use serde::Serialize;

use crate::{Cart, CartHistoryEntry, CartItem, HistoryEventType, round2};

/// One student's cart as seen by their teacher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentCartView {
    pub student_id: StudentId,
    pub items: Vec<CartItem>,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Cart> for StudentCartView {
    fn from(cart: Cart) -> Self {
        Self {
            student_id: cart.student_id,
            items: cart.items,
            total_price: round2(cart.total_price),
            created_at: cart.created_at,
        }
    }
}

/// All carts belonging to one teacher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherCartGroup {
    pub teacher_id: TeacherId,
    pub carts: Vec<Cart>,
}

/// A single history event without its owner fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEvent {
    pub product_id: ObjectId,
    pub event_type: HistoryEventType,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// A student's history in occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentHistory {
    pub student_id: StudentId,
    pub events: Vec<HistoryEvent>,
}

/// Cart history for a teacher, grouped by student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherHistory {
    pub teacher_id: TeacherId,
    pub students: Vec<StudentHistory>,
}

/// Builds per-student views sorted newest cart first.
pub fn student_cart_views(carts: Vec<Cart>) -> Vec<StudentCartView> {
    let mut views: Vec<StudentCartView> = carts.into_iter().map(StudentCartView::from).collect();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    views
}

/// Groups carts by teacher; groups ordered by teacher, carts by student.
pub fn group_by_teacher(carts: Vec<Cart>) -> Vec<TeacherCartGroup> {
    let mut groups: BTreeMap<TeacherId, Vec<Cart>> = BTreeMap::new();
    for cart in carts {
        groups.entry(cart.teacher_id.clone()).or_default().push(cart);
    }

    groups
        .into_iter()
        .map(|(teacher_id, mut carts)| {
            carts.sort_by(|a, b| a.student_id.cmp(&b.student_id));
            TeacherCartGroup { teacher_id, carts }
        })
        .collect()
}

/// Groups a teacher's history entries by student.
///
/// `entries` must already be in occurrence order; that order is kept
/// within each student.
pub fn group_history(teacher_id: TeacherId, entries: Vec<CartHistoryEntry>) -> TeacherHistory {
    let mut students: BTreeMap<StudentId, Vec<HistoryEvent>> = BTreeMap::new();
    for entry in entries {
        students
            .entry(entry.student_id)
            .or_default()
            .push(HistoryEvent {
                product_id: entry.product_id,
                event_type: entry.event_type,
                quantity: entry.quantity,
                occurred_at: entry.occurred_at,
            });
    }

    TeacherHistory {
        teacher_id,
        students: students
            .into_iter()
            .map(|(student_id, events)| StudentHistory { student_id, events })
            .collect(),
    }
}

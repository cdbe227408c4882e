use chrono::{DateTime, Utc};
use common::{ObjectId, StudentId, TeacherId};

use crate::{CartHistoryEntry, HistoryEventType};

/// Builder for constructing history queries.
///
/// Every filter is optional; an empty query matches the whole ledger.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    /// Filter by teacher.
    pub teacher_id: Option<TeacherId>,

    /// Filter by student.
    pub student_id: Option<StudentId>,

    /// Filter by product.
    pub product_id: Option<ObjectId>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<HistoryEventType>>,

    /// Filter by entries at or after this instant.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by entries at or before this instant.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl HistoryQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for every entry recorded under a teacher.
    pub fn for_teacher(teacher_id: TeacherId) -> Self {
        Self {
            teacher_id: Some(teacher_id),
            ..Default::default()
        }
    }

    /// Filters by teacher.
    pub fn teacher_id(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    /// Filters by student.
    pub fn student_id(mut self, student_id: StudentId) -> Self {
        self.student_id = Some(student_id);
        self
    }

    /// Filters by product.
    pub fn product_id(mut self, product_id: ObjectId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Filters by a single event type.
    pub fn event_type(mut self, event_type: HistoryEventType) -> Self {
        self.event_types = Some(vec![event_type]);
        self
    }

    /// Filters by several event types (any of these).
    pub fn event_types(mut self, event_types: Vec<HistoryEventType>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    /// Filters to entries at or after this timestamp.
    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    /// Filters to entries at or before this timestamp.
    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    /// Limits the number of entries returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many entries before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the entry passes every filter except limit/offset.
    pub fn matches(&self, entry: &CartHistoryEntry) -> bool {
        if let Some(ref teacher) = self.teacher_id
            && &entry.teacher_id != teacher
        {
            return false;
        }
        if let Some(ref student) = self.student_id
            && &entry.student_id != student
        {
            return false;
        }
        if let Some(product) = self.product_id
            && entry.product_id != product
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&entry.event_type)
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && entry.occurred_at < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && entry.occurred_at > to
        {
            return false;
        }
        true
    }
}

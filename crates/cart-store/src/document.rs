use chrono::{DateTime, Utc};
use common::{ObjectId, StudentId, TeacherId};
use serde::{Deserialize, Serialize};

/// Document version used for optimistic concurrency control.
///
/// A freshly created cart is at version 1; every successful replace
/// increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a newly created document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Rounds a monetary amount to two decimal places.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// A product line inside a cart.
///
/// Name, price and image are a snapshot of the catalog taken when the
/// product was put in the cart; later catalog changes do not flow back here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ObjectId,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub price: f64,
    pub quantity: u32,
    pub image_url: String,
}

impl CartItem {
    /// Creates an item with no topic or category.
    pub fn new(
        product_id: ObjectId,
        product_name: impl Into<String>,
        price: f64,
        quantity: u32,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            topic_name: None,
            category_name: None,
            price,
            quantity,
            image_url: image_url.into(),
        }
    }

    /// Price multiplied by quantity, unrounded.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// The cart document kept for one (teacher, student) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: ObjectId,
    pub teacher_id: TeacherId,
    pub student_id: StudentId,
    pub items: Vec<CartItem>,
    pub total_price: f64,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart at the first version.
    pub fn new(teacher_id: TeacherId, student_id: StudentId) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            teacher_id,
            student_id,
            items: Vec::new(),
            total_price: 0.0,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Looks up an item by product.
    pub fn item(&self, product_id: &ObjectId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Looks up an item by product for mutation.
    pub fn item_mut(&mut self, product_id: &ObjectId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| &i.product_id == product_id)
    }

    /// Removes an item by product, returning it if it was present.
    pub fn take_item(&mut self, product_id: &ObjectId) -> Option<CartItem> {
        let index = self.items.iter().position(|i| &i.product_id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Sum of price × quantity over the current items, rounded to cents.
    pub fn computed_total(&self) -> f64 {
        round2(self.items.iter().map(CartItem::line_total).sum())
    }

    /// Recomputes `total_price` from scratch from the current items.
    pub fn recompute_total(&mut self) {
        self.total_price = self.computed_total();
    }

    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Kind of event recorded in the cart history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEventType {
    Add,
    Remove,
    Order,
}

impl HistoryEventType {
    /// Returns the stored name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEventType::Add => "add",
            HistoryEventType::Remove => "remove",
            HistoryEventType::Order => "order",
        }
    }

    /// Parses a stored event type name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(HistoryEventType::Add),
            "remove" => Some(HistoryEventType::Remove),
            "order" => Some(HistoryEventType::Order),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of something that happened to a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartHistoryEntry {
    pub id: ObjectId,
    pub teacher_id: TeacherId,
    pub student_id: StudentId,
    pub product_id: ObjectId,
    pub event_type: HistoryEventType,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

impl CartHistoryEntry {
    /// Creates a history entry stamped with the current time.
    pub fn new(
        teacher_id: TeacherId,
        student_id: StudentId,
        product_id: ObjectId,
        event_type: HistoryEventType,
        quantity: u32,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            teacher_id,
            student_id,
            product_id,
            event_type,
            quantity,
            occurred_at: Utc::now(),
        }
    }
}

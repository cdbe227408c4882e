//! Pure cart mutations.
//!
//! Each function edits an in-memory [`Cart`], recomputes its total and
//! reports the history entries the change must produce. Nothing here
//! touches a store, so a mutation can be re-run against a freshly loaded
//! cart after a concurrency conflict.

use cart_store::{Cart, CartHistoryEntry, CartItem, HistoryEventType};
use common::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{CartError, Result};

/// Largest quantity a cart line may hold.
///
/// History quantities are stored as 32-bit signed integers.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Checks that a requested quantity is within `1..=MAX_QUANTITY`.
pub fn validate_quantity(quantity: u32) -> Result<u32> {
    if quantity == 0 {
        return Err(CartError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(CartError::Validation(format!(
            "quantity must be at most {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

fn grow(current: u32, by: u32) -> Result<u32> {
    current
        .checked_add(by)
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or_else(|| {
            CartError::Validation(format!(
                "quantity would exceed {MAX_QUANTITY} (have {current}, adding {by})"
            ))
        })
}

/// Direction of a single-unit quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityChange {
    Increase,
    Decrease,
}

impl QuantityChange {
    /// Parses `increase` or `decrease`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "increase" => Ok(QuantityChange::Increase),
            "decrease" => Ok(QuantityChange::Decrease),
            other => Err(CartError::Validation(format!(
                "types must be increase or decrease, got {other:?}"
            ))),
        }
    }
}

/// What a mutation did to the cart.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The affected item: post-change for add/increase/decrease, the
    /// removed line for remove, `None` when a decrease dropped it.
    pub item: Option<CartItem>,

    /// History entries to append once the cart write succeeds.
    /// Empty means the cart was not changed and needs no write.
    pub history: Vec<CartHistoryEntry>,
}

impl MutationOutcome {
    fn unchanged() -> Self {
        Self {
            item: None,
            history: Vec::new(),
        }
    }

    /// Returns true if the cart must be written.
    pub fn is_change(&self) -> bool {
        !self.history.is_empty()
    }
}

fn entry(cart: &Cart, product_id: ObjectId, event_type: HistoryEventType, qty: u32) -> CartHistoryEntry {
    CartHistoryEntry::new(
        cart.teacher_id.clone(),
        cart.student_id.clone(),
        product_id,
        event_type,
        qty,
    )
}

/// Adds an item, merging quantities if the product is already present.
pub fn add_item(cart: &mut Cart, item: CartItem) -> Result<MutationOutcome> {
    let added = validate_quantity(item.quantity)?;
    let product_id = item.product_id;

    let stored = match cart.item_mut(&product_id) {
        Some(existing) => {
            existing.quantity = grow(existing.quantity, added)?;
            existing.clone()
        }
        None => {
            cart.items.push(item.clone());
            item
        }
    };
    cart.recompute_total();

    Ok(MutationOutcome {
        item: Some(stored),
        history: vec![entry(cart, product_id, HistoryEventType::Add, added)],
    })
}

/// Moves an item's quantity up or down by one.
///
/// A decrease at quantity 1 removes the line.
pub fn change_quantity(
    cart: &mut Cart,
    product_id: ObjectId,
    change: QuantityChange,
) -> Result<MutationOutcome> {
    let item = cart
        .item_mut(&product_id)
        .ok_or(CartError::ItemNotFound { product_id })?;

    let (remaining, event_type) = match change {
        QuantityChange::Increase => {
            item.quantity = grow(item.quantity, 1)?;
            (Some(item.clone()), HistoryEventType::Add)
        }
        QuantityChange::Decrease if item.quantity > 1 => {
            item.quantity -= 1;
            (Some(item.clone()), HistoryEventType::Remove)
        }
        QuantityChange::Decrease => {
            cart.take_item(&product_id);
            (None, HistoryEventType::Remove)
        }
    };
    cart.recompute_total();

    Ok(MutationOutcome {
        item: remaining,
        history: vec![entry(cart, product_id, event_type, 1)],
    })
}

/// Removes an item outright. History records its full prior quantity.
pub fn remove_item(cart: &mut Cart, product_id: ObjectId) -> Result<MutationOutcome> {
    let removed = cart
        .take_item(&product_id)
        .ok_or(CartError::ItemNotFound { product_id })?;
    cart.recompute_total();

    Ok(MutationOutcome {
        history: vec![entry(
            cart,
            product_id,
            HistoryEventType::Remove,
            removed.quantity,
        )],
        item: Some(removed),
    })
}

/// Empties the cart, producing one `order` entry per archived line.
///
/// An already empty cart is left untouched.
pub fn archive_items(cart: &mut Cart) -> MutationOutcome {
    if cart.is_empty() {
        return MutationOutcome::unchanged();
    }

    let items = std::mem::take(&mut cart.items);
    cart.recompute_total();

    let history = items
        .iter()
        .map(|i| entry(cart, i.product_id, HistoryEventType::Order, i.quantity))
        .collect();

    MutationOutcome {
        item: None,
        history,
    }
}

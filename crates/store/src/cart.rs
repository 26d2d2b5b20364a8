//! Cart lines and the cart-mutation algorithms.
//!
//! A cart is an ordered sequence of [`CartLine`] records plus an append-only
//! purchase history. The original storefront kept three parallel arrays
//! (items, variants, quantities) that had to be resized in lockstep; folding
//! them into one line record makes the length invariant structural.
//!
//! # Index handling
//!
//! Out-of-range indices passed to [`Cart::remove_line`], [`Cart::increment`],
//! and [`Cart::decrement`] are silent no-ops. This is intentional: the
//! boundary layer forwards client-supplied indices verbatim, and a stale
//! index from a racing tab must not fail the request.
//!
//! # The two-step add flow
//!
//! The storefront UI adds to the cart in two calls: [`Cart::add_item`] when a
//! product is picked, then [`Cart::add_variant`] when its variant is chosen.
//! `add_item` leaves a *pending* line (no variant yet) and records the item
//! as most recent; the following `add_variant` either finalizes that pending
//! line or collapses it into an existing line for the same variant. The
//! most-recent marker is the correlation key between the two calls.

use serde::{Deserialize, Serialize};

use gearshop_core::{Product, ProductId, Variant};

/// One line of a cart: an item, its selected variant, and a quantity.
///
/// `variant` is `None` only for a pending line awaiting the second half of
/// the two-step add flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product on this line.
    pub item: Product,
    /// The selected variant, once chosen.
    pub variant: Option<Variant>,
    /// Units of this line; at least 1 while the line exists.
    pub quantity: u32,
}

/// One completed purchase: an item and the quantity it was bought at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The purchased product.
    pub item: Product,
    /// Final quantity at checkout.
    pub quantity: u32,
}

/// An account's cart: live lines plus the purchase history log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    /// Correlation key for the two-step add flow; see module docs.
    most_recent: Option<ProductId>,
    /// Append-only log of past checkouts; never trimmed.
    history: Vec<HistoryEntry>,
}

impl Cart {
    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of live lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no live lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The item recorded by the latest [`Cart::add_item`], if any.
    #[must_use]
    pub const fn most_recent(&self) -> Option<ProductId> {
        self.most_recent
    }

    /// Items in the cart, index-aligned with [`Cart::quantities`].
    #[must_use]
    pub fn items(&self) -> Vec<&Product> {
        self.lines.iter().map(|line| &line.item).collect()
    }

    /// Selected variants, index-aligned with [`Cart::items`].
    #[must_use]
    pub fn variants(&self) -> Vec<Option<&Variant>> {
        self.lines.iter().map(|line| line.variant.as_ref()).collect()
    }

    /// Line quantities, index-aligned with [`Cart::items`].
    #[must_use]
    pub fn quantities(&self) -> Vec<u32> {
        self.lines.iter().map(|line| line.quantity).collect()
    }

    /// The purchase history log.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Purchased items, index-aligned with [`Cart::history_quantities`].
    ///
    /// The boundary layer reads history as two aligned sequences (the review
    /// eligibility endpoints), so both views are provided.
    #[must_use]
    pub fn history_items(&self) -> Vec<&Product> {
        self.history.iter().map(|entry| &entry.item).collect()
    }

    /// Purchased quantities, index-aligned with [`Cart::history_items`].
    #[must_use]
    pub fn history_quantities(&self) -> Vec<u32> {
        self.history.iter().map(|entry| entry.quantity).collect()
    }

    /// First half of the two-step add flow: put an item in the cart.
    ///
    /// On an empty cart this creates the single line directly at quantity 1.
    /// Otherwise it appends a pending line and records the item as most
    /// recent, to be finalized by the next [`Cart::add_variant`].
    pub fn add_item(&mut self, item: Product) {
        if self.lines.is_empty() {
            self.lines.push(CartLine {
                item,
                variant: None,
                quantity: 1,
            });
            return;
        }

        self.most_recent = Some(item.id);
        self.lines.push(CartLine {
            item,
            variant: None,
            quantity: 1,
        });
    }

    /// Second half of the two-step add flow: choose a variant.
    ///
    /// - If no line carries a variant yet, the newest pending line is
    ///   finalized with this variant at quantity 1.
    /// - If a line already carries the same variant name and its item matches
    ///   the most-recent marker (or no marker is tracked), that line's
    ///   quantity goes up by 1 and the pending duplicate line from the
    ///   preceding [`Cart::add_item`] is dropped.
    /// - Otherwise the newest pending line is finalized with this variant at
    ///   quantity 1.
    ///
    /// A variant selection with no pending line and no matching line has
    /// nothing to attach to and is ignored with a warning. The item/variant
    /// correlation here deliberately reproduces the storefront's historical
    /// matching rule; see `DESIGN.md` for the open question around
    /// interleaved adds.
    pub fn add_variant(&mut self, variant: Variant) {
        let most_recent = self.most_recent;

        if self.lines.iter().all(|line| line.variant.is_none()) {
            self.finalize_pending(variant);
            return;
        }

        let matched = self.lines.iter().position(|line| {
            line.variant.as_ref() == Some(&variant)
                && most_recent.is_none_or(|id| line.item.id == id)
        });

        if let Some(index) = matched {
            if let Some(line) = self.lines.get_mut(index) {
                line.quantity += 1;
            }
            // Drop the pending duplicate appended by the preceding add_item.
            if let Some(pending) = self.lines.iter().rposition(|line| line.variant.is_none()) {
                self.lines.remove(pending);
            }
            return;
        }

        self.finalize_pending(variant);
    }

    /// Attach a variant to the newest pending line, resetting its quantity.
    fn finalize_pending(&mut self, variant: Variant) {
        if let Some(line) = self.lines.iter_mut().rev().find(|line| line.variant.is_none()) {
            line.variant = Some(variant);
            line.quantity = 1;
        } else {
            tracing::warn!(variant = %variant, "variant selected with no pending item line");
        }
    }

    /// Remove the line at `index` wholesale. Out-of-range is a silent no-op.
    pub fn remove_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }

    /// Raise the quantity of the line at `index` by 1. Out-of-range is a
    /// silent no-op.
    pub fn increment(&mut self, index: usize) {
        if let Some(line) = self.lines.get_mut(index) {
            line.quantity += 1;
        }
    }

    /// Lower the quantity of the line at `index` by 1, removing the line when
    /// it was already at 1. Out-of-range is a silent no-op.
    pub fn decrement(&mut self, index: usize) {
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            self.lines.remove(index);
        }
    }

    /// Complete the purchase: move every live line into the history log and
    /// clear the cart. Calling this on an empty cart changes nothing.
    pub fn checkout(&mut self) {
        for line in self.lines.drain(..) {
            self.history.push(HistoryEntry {
                item: line.item,
                quantity: line.quantity,
            });
        }
        self.most_recent = None;
    }

    /// Wholesale substitution of the cart state, used for client cart sync.
    /// No validation beyond structural acceptance.
    pub fn replace(&mut self, other: Self) {
        *self = other;
    }
}

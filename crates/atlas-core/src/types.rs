//! # Domain Types
//!
//! Core domain types used throughout Atlas POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockRecord    │   │      Sale       │   │    Transfer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  (item, loc)    │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  quantity       │   │  lines[]        │   │  from → to      │       │
//! │  │  price/cost     │   │  total, profit  │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    StockKey     │   │    CartLine     │   │  StockRequest   │       │
//! │  │  item@location  │   │  (ephemeral)    │   │  pending/...    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! - Sales, transfers and stock requests carry UUID v4 ids.
//! - Stock records are identified by the **(item_id, location_id) pair**;
//!   the pair doubles as the record-store document id (see [`StockKey`]),
//!   so every counter is individually addressable. The whole-collection
//!   read-filter-write-back style is deliberately impossible here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Stock Key
// =============================================================================

/// Addressable identity of one quantity-on-hand counter.
///
/// Every mutation the Stock Ledger performs is scoped to exactly one key.
/// The `record_id` form (`<item_id>@<location_id>`) is used as the document
/// id in the stock collection and as the key of the ledger's lock registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub item_id: String,
    pub location_id: String,
}

impl StockKey {
    pub fn new(item_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        StockKey {
            item_id: item_id.into(),
            location_id: location_id.into(),
        }
    }

    /// Document id for the stock collection.
    pub fn record_id(&self) -> String {
        format!("{}@{}", self.item_id, self.location_id)
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.item_id, self.location_id)
    }
}

// =============================================================================
// Item Template
// =============================================================================

/// Descriptive item fields, independent of any location's counter.
///
/// Used when a credit has to materialize a stock record that does not exist
/// yet (transfer destination, or restock of an item deleted since the sale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    pub item_id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub category: String,
    /// Cost in cents (what the business pays per unit).
    pub cost_cents: i64,
    /// Selling price in cents.
    pub price_cents: i64,
    /// Reorder threshold.
    pub min_stock: i64,
    /// Unit of measure ("pieces", "kg", ...).
    pub unit: String,
}

// =============================================================================
// Stock Record
// =============================================================================

/// Authoritative quantity-on-hand for one item at one location.
///
/// ## Ownership
/// `quantity` is written exclusively by the Stock Ledger. Descriptive fields
/// (name, prices, thresholds) belong to the inventory-maintenance surface of
/// the application; sales snapshot them and never read back.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub item_id: String,
    pub location_id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub category: String,
    /// Cost in cents (for profit calculations; hidden from cashiers by the
    /// presentation layer, see [`Role::can_view_financials`]).
    pub cost_cents: i64,
    /// Selling price in cents.
    pub price_cents: i64,
    /// Quantity on hand. Invariant: never negative.
    pub quantity: i64,
    /// Low-stock warning threshold.
    pub min_stock: i64,
    /// Unit of measure.
    pub unit: String,
    /// Soft delete. Records referenced by historical sales/transfers are
    /// never physically removed.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Materializes a record at `location_id` from an item template.
    pub fn from_template(template: &ItemTemplate, location_id: &str, quantity: i64) -> Self {
        let now = Utc::now();
        StockRecord {
            item_id: template.item_id.clone(),
            location_id: location_id.to_string(),
            name: template.name.clone(),
            barcode: template.barcode.clone(),
            category: template.category.clone(),
            cost_cents: template.cost_cents,
            price_cents: template.price_cents,
            quantity,
            min_stock: template.min_stock,
            unit: template.unit.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Extracts the location-independent template fields.
    pub fn template(&self) -> ItemTemplate {
        ItemTemplate {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            category: self.category.clone(),
            cost_cents: self.cost_cents,
            price_cents: self.price_cents,
            min_stock: self.min_stock,
            unit: self.unit.clone(),
        }
    }

    /// The counter identity of this record.
    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id.clone(), self.location_id.clone())
    }

    /// Selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// True when quantity has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of an in-flight checkout. Ephemeral; never persisted standalone.
///
/// ## Trust Model
/// Price and cost here are **display-time** values shown while the cashier
/// built the cart. Checkout trusts only `item_id` and `quantity`; the
/// committed snapshot comes from a fresh read of the stock record, so a
/// stale product grid can never leak stale prices into a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    /// Unit price in cents as displayed when the line was added.
    pub price_cents: i64,
    /// Unit cost in cents as displayed when the line was added.
    pub cost_cents: i64,
    pub quantity: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// One committed line of a sale, frozen at checkout time.
///
/// Snapshot pattern: later edits to the stock record's price or cost must
/// never retroactively alter historical totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub item_id: String,
    /// Item name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    /// Unit cost in cents at time of sale (frozen).
    pub cost_cents: i64,
    pub quantity: i64,
}

impl SaleLine {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }

    /// Line profit ((unit price − unit cost) × quantity). May be negative.
    #[inline]
    pub fn line_profit(&self) -> Money {
        (Money::from_cents(self.price_cents) - Money::from_cents(self.cost_cents))
            .multiply_quantity(self.quantity)
    }

    /// Fallback template for restocking this line when the stock record was
    /// deleted or renamed since the sale. A sale only froze name and prices,
    /// so the remaining descriptive fields take neutral defaults.
    pub fn restock_template(&self) -> ItemTemplate {
        ItemTemplate {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            barcode: None,
            category: "Uncategorized".to_string(),
            cost_cents: self.cost_cents,
            price_cents: self.price_cents,
            min_stock: 0,
            unit: "pieces".to_string(),
        }
    }
}

/// A committed sale transaction.
///
/// Append-only: created once by the checkout processor; the void processor
/// flips the void sub-state exactly once; nothing is ever deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub location_id: String,
    pub lines: Vec<SaleLine>,
    /// Sum of line totals, computed from the frozen snapshot.
    pub total_cents: i64,
    /// Sum of line profits, computed from the frozen snapshot.
    pub profit_cents: i64,
    pub cashier_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Void sub-state. `voided_by` / `void_reason` / `voided_at` are present
    /// iff `voided` is true.
    pub voided: bool,
    pub voided_by: Option<String>,
    pub void_reason: Option<String>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// A completed inter-location stock movement. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    pub item_id: String,
    /// Item name at time of transfer (for history display).
    pub item_name: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: i64,
    pub operator_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Request
// =============================================================================

/// Lifecycle state of a stock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A request from one location for more stock of an item.
///
/// Approval is a bookkeeping decision only — stock moves when somebody
/// performs the corresponding transfer, never as a side effect of approval.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub id: String,
    pub location_id: String,
    /// Free-text item name; requests are not bound to a stock record.
    pub item_name: String,
    pub quantity: i64,
    pub reason: String,
    pub status: RequestStatus,
    pub requested_by: String,
    #[ts(as = "String")]
    pub requested_at: DateTime<Utc>,
    pub decided_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Reviewer notes (rejection reason).
    pub notes: Option<String>,
}

// =============================================================================
// Identity
// =============================================================================

/// Caller role, supplied by the external identity collaborator.
///
/// Role *sufficiency* (who holds which role) is the collaborator's problem;
/// these helpers only encode which capability each role carries so the core
/// and the presentation layer branch consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

impl Role {
    /// Voiding a sale requires manager or admin.
    pub fn can_void(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Moving stock between locations requires manager or admin.
    pub fn can_transfer(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Cost prices and profit figures are hidden from cashiers.
    pub fn can_view_financials(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// Identity of the current caller, as supplied per-request by the external
/// identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    pub role: Role,
}

impl Operator {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Operator {
            id: id.into(),
            role,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

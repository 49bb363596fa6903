//! Order record with embedded line items and status log.

use chrono::{DateTime, Utc};
use common::{ItemId, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// GST rate applied per line item at order time.
pub const GST_RATE_PERCENT: u32 = 18;

/// A discount, either a raw percentage of the current total or a fixed
/// amount. Percentage discounts keep the percentage, so the effective
/// amount tracks the total as items are cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "lowercase")]
pub enum Discount {
    Percentage(u32),
    Fixed(Money),
}

impl Discount {
    /// Returns the effective discount against `total`, clamped so it
    /// never exceeds the total.
    pub fn effective(&self, total: Money) -> Money {
        let raw = match self {
            Discount::Percentage(pct) => total.percentage(*pct),
            Discount::Fixed(amount) => *amount,
        };
        raw.min(total)
    }
}

impl std::fmt::Display for Discount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discount::Percentage(pct) => write!(f, "{pct}%"),
            Discount::Fixed(amount) => write!(f, "{amount}"),
        }
    }
}

/// Who performed a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(UserId),
    System,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "{id}"),
            Actor::System => write!(f, "system"),
        }
    }
}

impl Serialize for Actor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Actor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "system" {
            Ok(Actor::System)
        } else {
            let uuid = uuid::Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
            Ok(Actor::User(UserId::from_uuid(uuid)))
        }
    }
}

/// One entry in an order's append-only audit trail.
///
/// Entries are never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub comment: String,
    pub actor: Actor,
}

/// A stock compensation to issue against the inventory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A line item snapshot taken at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ItemId,
    pub product_id: ProductId,
    /// Name at order time, not live-looked-up.
    pub product_name: String,
    pub quantity: u32,
    /// Price per unit at order time.
    pub unit_price: Money,
    /// Item-level discount copied from the product, if any.
    pub discount: Option<Discount>,
    /// GST contribution for this line (`unit_price` at the fixed rate).
    pub gst_amount: Money,
    pub status: OrderStatus,
}

impl OrderItem {
    /// Creates a pending line item, deriving the GST contribution from
    /// the unit price.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        discount: Option<Discount>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            discount,
            gst_amount: unit_price.percentage(GST_RATE_PERCENT),
            status: OrderStatus::Pending,
        }
    }

    /// Returns `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns true if this item has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}

/// Outcome of a single-item cancellation.
#[derive(Debug, Clone)]
pub struct ItemCancellation {
    /// The item was already cancelled; nothing changed.
    pub already_cancelled: bool,
    /// Stock to return for the cancelled item.
    pub restock: Option<StockAdjustment>,
    /// The cancellation emptied the order and auto-cancelled it.
    pub order_cancelled: bool,
}

/// A priced collection of line items tracked through the fulfillment
/// status machine.
///
/// `final_amount` is always re-derived from the item snapshots:
/// `total − effective_discount + gst`, never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub discount: Option<Discount>,
    pub gst_number: Option<String>,
    /// Sum of non-cancelled items' `unit_price × quantity`, pre-discount
    /// and pre-tax.
    pub total_amount: Money,
    /// Sum of non-cancelled items' per-line GST contributions.
    pub gst_amount: Money,
    /// `total_amount − effective_discount + gst_amount`.
    pub final_amount: Money,
    pub currency: String,
    pub status_log: Vec<StatusLogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order from priced item snapshots, with the
    /// initial audit entry.
    pub fn new(
        user_id: UserId,
        items: Vec<OrderItem>,
        discount: Option<Discount>,
        gst_number: Option<String>,
        currency: impl Into<String>,
        actor: Actor,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let now = Utc::now();
        let mut order = Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            items,
            discount,
            gst_number,
            total_amount: Money::zero(),
            gst_amount: Money::zero(),
            final_amount: Money::zero(),
            currency: currency.into(),
            status_log: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        order.recompute();
        order.log(OrderStatus::Pending, "Order created", actor);
        Ok(order)
    }

    /// Re-derives all monetary fields from the current item snapshots.
    ///
    /// Percentage discounts are computed against the new total, so
    /// cancelling items after a percentage discount shrinks the absolute
    /// discount. That follows the documented pricing rule, not an
    /// accident of recomputation.
    pub fn recompute(&mut self) {
        let active = self.items.iter().filter(|i| !i.is_cancelled());
        self.total_amount = active.clone().map(OrderItem::line_total).sum();
        self.gst_amount = active.map(|i| i.gst_amount).sum();
        self.final_amount = self.total_amount - self.effective_discount() + self.gst_amount;
        self.updated_at = Utc::now();
    }

    /// Returns the discount currently in effect against `total_amount`.
    pub fn effective_discount(&self) -> Money {
        self.discount
            .map(|d| d.effective(self.total_amount))
            .unwrap_or_else(Money::zero)
    }

    /// Returns a line item by id.
    pub fn item(&self, item_id: ItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Returns true if at least one item is not cancelled.
    pub fn has_active_items(&self) -> bool {
        self.items.iter().any(|i| !i.is_cancelled())
    }

    fn log(&mut self, status: OrderStatus, comment: impl Into<String>, actor: Actor) {
        self.status_log.push(StatusLogEntry {
            status,
            timestamp: Utc::now(),
            comment: comment.into(),
            actor,
        });
    }

    /// Moves the order to `next`, cascading onto non-cancelled items and
    /// appending an audit entry.
    pub fn update_status(
        &mut self,
        next: OrderStatus,
        comment: Option<String>,
        actor: Actor,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        for item in self.items.iter_mut().filter(|i| !i.is_cancelled()) {
            item.status = next;
        }
        let comment = comment.unwrap_or_else(|| format!("Status updated to {next}"));
        self.log(next, comment, actor);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancels the whole order and returns the stock to put back for
    /// every item that was not already cancelled.
    pub fn cancel(&mut self, actor: Actor, reason: &str) -> Result<Vec<StockAdjustment>, OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::CannotCancel {
                status: self.status,
            });
        }

        let restock: Vec<StockAdjustment> = self
            .items
            .iter()
            .filter(|i| !i.is_cancelled())
            .map(|i| StockAdjustment {
                product_id: i.product_id.clone(),
                quantity: i.quantity,
            })
            .collect();

        self.status = OrderStatus::Cancelled;
        for item in self.items.iter_mut() {
            item.status = OrderStatus::Cancelled;
        }
        self.log(OrderStatus::Cancelled, reason, actor);
        self.updated_at = Utc::now();
        Ok(restock)
    }

    /// Cancels a single line item.
    ///
    /// Idempotent for already-cancelled items. Recomputes totals, and
    /// auto-cancels the order (with its own audit entry) when the last
    /// active item goes away.
    pub fn cancel_item(
        &mut self,
        item_id: ItemId,
        actor: Actor,
        reason: &str,
    ) -> Result<ItemCancellation, OrderError> {
        if !self.status.can_cancel_items() {
            return Err(OrderError::ItemsNotEditable {
                status: self.status,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(OrderError::ItemNotFound { item_id })?;

        if item.is_cancelled() {
            return Ok(ItemCancellation {
                already_cancelled: true,
                restock: None,
                order_cancelled: false,
            });
        }

        item.status = OrderStatus::Cancelled;
        let restock = StockAdjustment {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        };

        self.recompute();
        let current = self.status;
        self.log(current, format!("Item cancelled: {reason}"), actor);

        let order_cancelled = !self.has_active_items();
        if order_cancelled {
            self.status = OrderStatus::Cancelled;
            self.log(
                OrderStatus::Cancelled,
                "All items cancelled, order automatically cancelled",
                actor,
            );
        }

        Ok(ItemCancellation {
            already_cancelled: false,
            restock: Some(restock),
            order_cancelled,
        })
    }

    /// Replaces the order discount and recomputes the final amount.
    pub fn apply_discount(&mut self, discount: Discount, actor: Actor) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::DiscountNotAllowed {
                status: self.status,
            });
        }

        if let Discount::Fixed(amount) = discount
            && amount > self.total_amount
        {
            return Err(OrderError::DiscountExceedsTotal {
                discount: amount,
                total: self.total_amount,
            });
        }

        self.discount = Some(discount);
        self.recompute();
        let current = self.status;
        self.log(current, format!("Discount applied: {discount}"), actor);
        Ok(())
    }

    /// Changes a line item's quantity and/or status, recomputing totals.
    ///
    /// The caller is responsible for adjusting stock for the quantity
    /// delta before (increase) or after (decrease) this mutation.
    pub fn update_item(
        &mut self,
        item_id: ItemId,
        quantity: Option<u32>,
        status: Option<OrderStatus>,
        actor: Actor,
    ) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::ItemsNotEditable {
                status: self.status,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(OrderError::ItemNotFound { item_id })?;

        if item.is_cancelled() {
            return Err(OrderError::ItemCancelled { item_id });
        }

        if let Some(quantity) = quantity {
            if quantity < 1 {
                return Err(OrderError::InvalidQuantity { quantity });
            }
            item.quantity = quantity;
        }
        if let Some(status) = status {
            item.status = status;
        }

        self.recompute();
        let current = self.status;
        self.log(current, format!("Order item updated: {item_id}"), actor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_item_order() -> Order {
        // $50 × 2 and $30 × 1 at 18% GST
        let items = vec![
            OrderItem::new("SKU-050", "Widget", 2, Money::from_dollars(50), None),
            OrderItem::new("SKU-030", "Gadget", 1, Money::from_dollars(30), None),
        ];
        Order::new(UserId::new(), items, None, None, "USD", Actor::System).unwrap()
    }

    fn assert_invariant(order: &Order) {
        assert_eq!(
            order.final_amount,
            order.total_amount - order.effective_discount() + order.gst_amount
        );
    }

    #[test]
    fn pricing_scenario_two_items() {
        let order = two_item_order();

        assert_eq!(order.total_amount, Money::from_cents(13000));
        assert_eq!(order.gst_amount, Money::from_cents(1440));
        assert_eq!(order.final_amount, Money::from_cents(14440));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_log.len(), 1);
        assert_invariant(&order);
    }

    #[test]
    fn cancelling_one_item_recomputes_totals() {
        let mut order = two_item_order();
        let gadget = order
            .items
            .iter()
            .find(|i| i.product_name == "Gadget")
            .unwrap()
            .id;

        let outcome = order.cancel_item(gadget, Actor::System, "test").unwrap();

        assert!(!outcome.already_cancelled);
        assert!(!outcome.order_cancelled);
        assert_eq!(
            outcome.restock,
            Some(StockAdjustment {
                product_id: ProductId::new("SKU-030"),
                quantity: 1
            })
        );
        assert_eq!(order.total_amount, Money::from_cents(10000));
        assert_eq!(order.gst_amount, Money::from_cents(900));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_invariant(&order);
    }

    #[test]
    fn cancelling_last_item_auto_cancels_order() {
        let mut order = two_item_order();
        let ids: Vec<ItemId> = order.items.iter().map(|i| i.id).collect();
        let log_before = order.status_log.len();

        order.cancel_item(ids[0], Actor::System, "first").unwrap();
        let outcome = order.cancel_item(ids[1], Actor::System, "second").unwrap();

        assert!(outcome.order_cancelled);
        assert_eq!(order.status, OrderStatus::Cancelled);
        // one entry per item cancellation plus the auto-cancel entry
        assert_eq!(order.status_log.len(), log_before + 3);
        assert_eq!(
            order.status_log.last().unwrap().comment,
            "All items cancelled, order automatically cancelled"
        );
    }

    #[test]
    fn cancel_item_is_idempotent() {
        let mut order = two_item_order();
        let id = order.items[0].id;

        order.cancel_item(id, Actor::System, "once").unwrap();
        let log_len = order.status_log.len();
        let outcome = order.cancel_item(id, Actor::System, "twice").unwrap();

        assert!(outcome.already_cancelled);
        assert!(outcome.restock.is_none());
        assert_eq!(order.status_log.len(), log_len);
    }

    #[test]
    fn percentage_discount_stores_raw_percent() {
        let items = vec![OrderItem::new(
            "SKU-100",
            "Thing",
            2,
            Money::from_dollars(100),
            None,
        )];
        let mut order =
            Order::new(UserId::new(), items, None, None, "USD", Actor::System).unwrap();
        assert_eq!(order.total_amount, Money::from_cents(20000));

        order
            .apply_discount(Discount::Percentage(10), Actor::System)
            .unwrap();

        assert_eq!(order.discount, Some(Discount::Percentage(10)));
        assert_eq!(order.effective_discount(), Money::from_cents(2000));
        assert_eq!(
            order.final_amount,
            Money::from_cents(20000 - 2000) + order.gst_amount
        );
        assert_invariant(&order);
    }

    #[test]
    fn percentage_discount_tracks_shrinking_total() {
        let mut order = two_item_order();
        order
            .apply_discount(Discount::Percentage(10), Actor::System)
            .unwrap();
        assert_eq!(order.effective_discount(), Money::from_cents(1300));

        let gadget = order
            .items
            .iter()
            .find(|i| i.product_name == "Gadget")
            .unwrap()
            .id;
        order.cancel_item(gadget, Actor::System, "shrink").unwrap();

        // 10% of the new $100 total, not of the original $130
        assert_eq!(order.effective_discount(), Money::from_cents(1000));
        assert_invariant(&order);
    }

    #[test]
    fn fixed_discount_cannot_exceed_total() {
        let mut order = two_item_order();
        let result =
            order.apply_discount(Discount::Fixed(Money::from_dollars(500)), Actor::System);
        assert!(matches!(
            result,
            Err(OrderError::DiscountExceedsTotal { .. })
        ));
    }

    #[test]
    fn oversized_percentage_is_clamped() {
        let mut order = two_item_order();
        order
            .apply_discount(Discount::Percentage(150), Actor::System)
            .unwrap();
        assert_eq!(order.effective_discount(), order.total_amount);
        assert_eq!(order.final_amount, order.gst_amount);
        assert_invariant(&order);
    }

    #[test]
    fn discount_only_on_pending() {
        let mut order = two_item_order();
        order
            .update_status(OrderStatus::Processing, None, Actor::System)
            .unwrap();
        let result = order.apply_discount(Discount::Percentage(5), Actor::System);
        assert!(matches!(result, Err(OrderError::DiscountNotAllowed { .. })));
    }

    #[test]
    fn update_status_cascades_to_active_items() {
        let mut order = two_item_order();
        let gadget = order.items[1].id;
        order.cancel_item(gadget, Actor::System, "gone").unwrap();

        order
            .update_status(OrderStatus::Processing, None, Actor::System)
            .unwrap();

        assert_eq!(order.items[0].status, OrderStatus::Processing);
        assert_eq!(order.items[1].status, OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_rejected_after_delivery() {
        let mut order = two_item_order();
        order
            .update_status(OrderStatus::Processing, None, Actor::System)
            .unwrap();
        order
            .update_status(OrderStatus::Shipped, None, Actor::System)
            .unwrap();
        order
            .update_status(OrderStatus::Delivered, None, Actor::System)
            .unwrap();
        let log_len = order.status_log.len();

        let result = order.cancel(Actor::System, "too late");

        assert!(matches!(result, Err(OrderError::CannotCancel { .. })));
        assert_eq!(order.status_log.len(), log_len);
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn cancel_returns_restock_for_active_items_only() {
        let mut order = two_item_order();
        let gadget = order.items[1].id;
        order.cancel_item(gadget, Actor::System, "gone").unwrap();

        let restock = order.cancel(Actor::System, "user request").unwrap();

        assert_eq!(restock.len(), 1);
        assert_eq!(restock[0].product_id, ProductId::new("SKU-050"));
        assert_eq!(restock[0].quantity, 2);
    }

    #[test]
    fn cancelled_order_only_accepts_refunded() {
        let mut order = two_item_order();
        order.cancel(Actor::System, "user request").unwrap();

        let result = order.update_status(OrderStatus::Processing, None, Actor::System);
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));

        order
            .update_status(OrderStatus::Refunded, None, Actor::System)
            .unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
    }

    #[test]
    fn update_item_quantity_recomputes() {
        let mut order = two_item_order();
        let widget = order.items[0].id;

        order
            .update_item(widget, Some(3), None, Actor::System)
            .unwrap();

        assert_eq!(order.total_amount, Money::from_cents(18000));
        assert_invariant(&order);
    }

    #[test]
    fn update_item_rejects_zero_quantity() {
        let mut order = two_item_order();
        let widget = order.items[0].id;
        let result = order.update_item(widget, Some(0), None, Actor::System);
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn update_item_rejects_cancelled_item() {
        let mut order = two_item_order();
        let widget = order.items[0].id;
        order.cancel_item(widget, Actor::System, "gone").unwrap();

        let result = order.update_item(widget, Some(3), None, Actor::System);
        assert!(matches!(result, Err(OrderError::ItemCancelled { .. })));
    }

    #[test]
    fn empty_order_rejected() {
        let result = Order::new(UserId::new(), vec![], None, None, "USD", Actor::System);
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn actor_serialization() {
        let user = UserId::new();
        let json = serde_json::to_string(&Actor::User(user)).unwrap();
        assert_eq!(json, format!("\"{user}\""));
        assert_eq!(
            serde_json::to_string(&Actor::System).unwrap(),
            "\"system\""
        );

        let back: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Actor::User(user));
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = two_item_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, order.id);
        assert_eq!(back.final_amount, order.final_amount);
        assert_eq!(back.items.len(), 2);
        assert_eq!(back.status_log.len(), 1);
    }
}

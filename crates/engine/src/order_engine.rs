//! Order lifecycle engine.

use async_trait::async_trait;
use common::{ItemId, OrderId, UserId};
use domain::{
    Actor, Discount, Order, OrderItem, OrderStatus, Payment, StatusLogEntry, StockAdjustment,
};
use store::{OrderStore, Page, PageQuery, PaymentStore};

use crate::error::{EngineError, Result};
use crate::services::{Inventory, UserInfo, Users};

/// Default reason when a whole order is cancelled without one.
pub const DEFAULT_CANCEL_REASON: &str = "Cancelled by user";

/// Default reason when a single item is cancelled without one.
pub const DEFAULT_ITEM_CANCEL_REASON: &str = "Item cancelled by user";

/// Reason recorded when an item is removed from an order. Removal is
/// cancellation, never a hard delete.
pub const ITEM_REMOVED_REASON: &str = "Item removed from order";

/// A line item request at order creation: the price and name are looked
/// up, never trusted from the caller.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Input for creating an order.
///
/// Lines come from exactly one of two places: explicit `items` or a
/// `cart_id` resolved through the inventory service. Providing both, or
/// neither, is a validation failure.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub cart_id: Option<String>,
    pub discount: Option<Discount>,
    pub gst_number: Option<String>,
    pub currency: Option<String>,
}

/// Order plus its payments, for the detail view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub payments: Vec<Payment>,
}

/// Order plus the owner's shipping address.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderWithShipping {
    pub order: Order,
    pub shipping: Option<UserInfo>,
}

/// The order engine contract other components depend on.
///
/// The payment engine pushes order status changes through this trait
/// rather than touching order records directly.
#[async_trait]
pub trait Orders: Send + Sync {
    /// Fetches an order.
    async fn get_order(&self, order_id: OrderId) -> Result<Order>;

    /// Moves an order to a new status.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        comment: Option<String>,
        actor: Actor,
    ) -> Result<Order>;
}

#[async_trait]
impl<T: Orders + ?Sized> Orders for std::sync::Arc<T> {
    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        (**self).get_order(order_id).await
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        comment: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        (**self).update_order_status(order_id, next, comment, actor).await
    }
}

/// Drives orders through their lifecycle against a store, with the
/// inventory and user services as best-effort collaborators.
pub struct OrderEngine<S, P, I, U>
where
    S: OrderStore,
    P: PaymentStore,
    I: Inventory,
    U: Users,
{
    orders: S,
    payments: P,
    inventory: I,
    users: U,
}

impl<S, P, I, U> OrderEngine<S, P, I, U>
where
    S: OrderStore,
    P: PaymentStore,
    I: Inventory,
    U: Users,
{
    /// Creates a new order engine.
    pub fn new(orders: S, payments: P, inventory: I, users: U) -> Self {
        Self {
            orders,
            payments,
            inventory,
            users,
        }
    }

    /// Creates an order from product references or a cart.
    ///
    /// Pricing and availability are looked up per product; any lookup
    /// failure aborts creation. Stock decrements happen after the order
    /// is persisted and are best-effort.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        let started = std::time::Instant::now();

        let lines = match (&request.cart_id, request.items.is_empty()) {
            (Some(_), false) => {
                return Err(EngineError::Validation(
                    "Provide either items or a cart id, not both".to_string(),
                ));
            }
            (None, true) => {
                return Err(EngineError::Validation(
                    "Order must contain at least one item".to_string(),
                ));
            }
            (Some(cart_id), true) => self.resolve_cart(cart_id).await?,
            (None, false) => request.items.clone(),
        };

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity < 1 {
                return Err(EngineError::Validation(format!(
                    "Invalid quantity {} for product {}",
                    line.quantity, line.product_id
                )));
            }

            let product = self
                .inventory
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!("Product not found: {}", line.product_id))
                })?;

            if !product.is_available {
                return Err(EngineError::ProductUnavailable(line.product_id.clone()));
            }
            if product.available_stock < line.quantity {
                return Err(EngineError::ProductUnavailable(format!(
                    "{}: requested {}, available {}",
                    line.product_id, line.quantity, product.available_stock
                )));
            }

            items.push(OrderItem::new(
                line.product_id.as_str(),
                product.name,
                line.quantity,
                product.price,
                product.discount,
            ));
        }

        let order = Order::new(
            request.user_id,
            items,
            request.discount,
            request.gst_number,
            request.currency.unwrap_or_else(|| "USD".to_string()),
            Actor::User(request.user_id),
        )?;

        self.orders.insert(&order).await?;

        for item in &order.items {
            if let Err(e) = self
                .inventory
                .decrease_stock(item.product_id.as_str(), item.quantity)
                .await
            {
                tracing::warn!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    error = %e,
                    "stock decrement failed after order creation"
                );
            }
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(order)
    }

    /// Turns a cart into order lines. An unknown or empty cart is a
    /// validation failure.
    async fn resolve_cart(&self, cart_id: &str) -> Result<Vec<NewOrderItem>> {
        let cart = self
            .inventory
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("Cart not found: {cart_id}")))?;
        if cart.is_empty() {
            return Err(EngineError::Validation(format!("Cart is empty: {cart_id}")));
        }
        Ok(cart
            .into_iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect())
    }

    /// Fetches an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(EngineError::OrderNotFound(order_id))
    }

    /// Lists orders matching the query.
    pub async fn list_orders(&self, query: &PageQuery) -> Result<Page<Order>> {
        Ok(self.orders.list(query).await?)
    }

    /// Lists one user's orders matching the query.
    pub async fn list_orders_by_user(
        &self,
        user_id: UserId,
        query: &PageQuery,
    ) -> Result<Page<Order>> {
        Ok(self.orders.list_by_user(user_id, query).await?)
    }

    /// Moves an order to a new status.
    #[tracing::instrument(skip(self, comment, actor))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        comment: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        order.update_status(next, comment, actor)?;
        self.orders.update(&order).await?;
        metrics::counter!("order_status_updates_total", "status" => next.as_str()).increment(1);
        Ok(order)
    }

    /// Cancels a whole order, returning stock for every active item and
    /// notifying the owner. Both side effects are best-effort.
    #[tracing::instrument(skip(self, reason, actor))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        reason: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        let reason = reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
        let restock = order.cancel(actor, &reason)?;
        self.orders.update(&order).await?;
        metrics::counter!("order_cancellations_total").increment(1);

        self.restock(&order, &restock).await;
        self.notify_owner(&order, "Order cancelled", &reason).await;
        Ok(order)
    }

    /// Cancels one line item. If it was the last active item the order
    /// cancels automatically.
    #[tracing::instrument(skip(self, reason, actor))]
    pub async fn cancel_order_item(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        reason: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        if order.item(item_id).is_none() {
            return Err(EngineError::ItemNotFound(item_id));
        }

        let reason = reason.unwrap_or_else(|| DEFAULT_ITEM_CANCEL_REASON.to_string());
        let outcome = order.cancel_item(item_id, actor, &reason)?;

        if outcome.already_cancelled {
            return Ok(order);
        }

        self.orders.update(&order).await?;

        if let Some(adjustment) = &outcome.restock {
            self.restock(&order, std::slice::from_ref(adjustment)).await;
        }
        if outcome.order_cancelled {
            metrics::counter!("order_cancellations_total").increment(1);
            self.notify_owner(&order, "Order cancelled", "All items cancelled")
                .await;
        }
        Ok(order)
    }

    /// Removes an item from an order. Removal is cancellation with a
    /// fixed reason, not a hard delete.
    pub async fn delete_order_item(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        actor: Actor,
    ) -> Result<Order> {
        self.cancel_order_item(order_id, item_id, Some(ITEM_REMOVED_REASON.to_string()), actor)
            .await
    }

    /// Applies a discount to a pending order.
    #[tracing::instrument(skip(self, actor))]
    pub async fn apply_discount(
        &self,
        order_id: OrderId,
        discount: Discount,
        actor: Actor,
    ) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        order.apply_discount(discount, actor)?;
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Changes a line item's quantity and/or status.
    ///
    /// A quantity increase requires the product to be available with
    /// stock for the delta, decremented before the order is persisted; a
    /// decrease releases the delta afterwards, best-effort.
    #[tracing::instrument(skip(self, actor))]
    pub async fn update_order_item(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: Option<u32>,
        status: Option<OrderStatus>,
        actor: Actor,
    ) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        let item = order
            .item(item_id)
            .ok_or(EngineError::ItemNotFound(item_id))?;
        let product_id = item.product_id.clone();
        let old_quantity = item.quantity;

        // validate the mutation before touching stock
        order.update_item(item_id, quantity, status, actor)?;

        let delta = quantity.map(|q| q as i64 - old_quantity as i64).unwrap_or(0);
        if delta > 0 {
            let product = self
                .inventory
                .get_product(product_id.as_str())
                .await?
                .ok_or_else(|| EngineError::ProductUnavailable(product_id.to_string()))?;
            if !product.is_available || product.available_stock < delta as u32 {
                return Err(EngineError::ProductUnavailable(format!(
                    "{}: requested {} more, available {}",
                    product_id, delta, product.available_stock
                )));
            }
            self.inventory
                .decrease_stock(product_id.as_str(), delta as u32)
                .await?;
        }

        self.orders.update(&order).await?;

        if delta < 0
            && let Err(e) = self
                .inventory
                .increase_stock(product_id.as_str(), (-delta) as u32)
                .await
        {
            tracing::warn!(
                %order_id,
                product_id = %product_id,
                error = %e,
                "stock release failed after item update"
            );
        }

        Ok(order)
    }

    /// Returns an order's line items.
    pub async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self.get_order(order_id).await?.items)
    }

    /// Returns an order's status log.
    pub async fn get_status_log(&self, order_id: OrderId) -> Result<Vec<StatusLogEntry>> {
        Ok(self.get_order(order_id).await?.status_log)
    }

    /// Returns an order together with all of its payments.
    pub async fn get_order_detail(&self, order_id: OrderId) -> Result<OrderDetail> {
        let order = self.get_order(order_id).await?;
        let payments = self
            .payments
            .list_by_order(order_id, &PageQuery::new())
            .await?;
        Ok(OrderDetail {
            order,
            payments: payments.items,
        })
    }

    /// Returns an order together with the owner's shipping address.
    pub async fn get_order_with_shipping(&self, order_id: OrderId) -> Result<OrderWithShipping> {
        let order = self.get_order(order_id).await?;
        let shipping = self.users.get_user(order.user_id).await?;
        Ok(OrderWithShipping { order, shipping })
    }

    async fn restock(&self, order: &Order, adjustments: &[StockAdjustment]) {
        for adjustment in adjustments {
            if let Err(e) = self
                .inventory
                .increase_stock(adjustment.product_id.as_str(), adjustment.quantity)
                .await
            {
                tracing::warn!(
                    order_id = %order.id,
                    product_id = %adjustment.product_id,
                    error = %e,
                    "stock release failed after cancellation"
                );
            }
        }
    }

    async fn notify_owner(&self, order: &Order, subject: &str, message: &str) {
        if !self.users.notify(order.user_id, subject, message).await {
            tracing::warn!(order_id = %order.id, user_id = %order.user_id, "notification failed");
        }
    }
}

#[async_trait]
impl<S, P, I, U> Orders for OrderEngine<S, P, I, U>
where
    S: OrderStore,
    P: PaymentStore,
    I: Inventory,
    U: Users,
{
    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        OrderEngine::get_order(self, order_id).await
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        comment: Option<String>,
        actor: Actor,
    ) -> Result<Order> {
        self.update_status(order_id, next, comment, actor).await
    }
}

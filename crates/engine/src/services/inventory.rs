//! Inventory collaborator trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;
use domain::Discount;

use crate::error::EngineError;

/// Product data returned by the inventory service.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub name: String,
    pub price: Money,
    pub is_available: bool,
    pub available_stock: u32,
    /// Product-level discount to snapshot onto the line item.
    pub discount: Option<Discount>,
}

/// One line of a shopping cart as the cart service reports it.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Trait for the external product/inventory service.
///
/// Stock adjustments are fire-and-forget in intent: the order engine
/// pairs every decrease at creation with an increase at cancellation and
/// tolerates the service being down for adjustments, but not for the
/// pricing lookup at order creation.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Looks up a product. Unknown products yield `Ok(None)`, not an
    /// error.
    async fn get_product(&self, product_id: &str) -> Result<Option<ProductInfo>, EngineError>;

    /// Resolves a cart into its lines. Unknown carts yield `Ok(None)`.
    async fn get_cart(&self, cart_id: &str) -> Result<Option<Vec<CartLine>>, EngineError>;

    /// Decrements available stock.
    async fn decrease_stock(&self, product_id: &str, quantity: u32) -> Result<(), EngineError>;

    /// Increments available stock.
    async fn increase_stock(&self, product_id: &str, quantity: u32) -> Result<(), EngineError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<String, ProductInfo>,
    carts: HashMap<String, Vec<CartLine>>,
    fail_on_adjust: bool,
    fail_on_lookup: bool,
}

/// In-memory inventory service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventory {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn add_product(&self, product_id: impl Into<String>, product: ProductInfo) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product_id.into(), product);
    }

    /// Convenience for a plain in-stock product.
    pub fn stock_product(&self, product_id: impl Into<String>, price: Money, stock: u32) {
        self.add_product(
            product_id,
            ProductInfo {
                name: "Test Product".to_string(),
                price,
                is_available: true,
                available_stock: stock,
                discount: None,
            },
        );
    }

    /// Adds or replaces a cart.
    pub fn set_cart(&self, cart_id: impl Into<String>, lines: Vec<CartLine>) {
        self.state.write().unwrap().carts.insert(cart_id.into(), lines);
    }

    /// Configures the service to fail stock adjustments.
    pub fn set_fail_on_adjust(&self, fail: bool) {
        self.state.write().unwrap().fail_on_adjust = fail;
    }

    /// Configures the service to fail product lookups.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Returns the current stock level for a product.
    pub fn stock_level(&self, product_id: &str) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .products
            .get(product_id)
            .map(|p| p.available_stock)
    }
}

#[async_trait]
impl Inventory for InMemoryInventory {
    async fn get_product(&self, product_id: &str) -> Result<Option<ProductInfo>, EngineError> {
        let state = self.state.read().unwrap();
        if state.fail_on_lookup {
            return Err(EngineError::Dependency(
                "Product service unavailable".to_string(),
            ));
        }
        Ok(state.products.get(product_id).cloned())
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Option<Vec<CartLine>>, EngineError> {
        let state = self.state.read().unwrap();
        if state.fail_on_lookup {
            return Err(EngineError::Dependency(
                "Product service unavailable".to_string(),
            ));
        }
        Ok(state.carts.get(cart_id).cloned())
    }

    async fn decrease_stock(&self, product_id: &str, quantity: u32) -> Result<(), EngineError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_adjust {
            return Err(EngineError::Dependency(
                "Product service unavailable".to_string(),
            ));
        }
        if let Some(product) = state.products.get_mut(product_id) {
            product.available_stock = product.available_stock.saturating_sub(quantity);
        }
        Ok(())
    }

    async fn increase_stock(&self, product_id: &str, quantity: u32) -> Result<(), EngineError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_adjust {
            return Err(EngineError::Dependency(
                "Product service unavailable".to_string(),
            ));
        }
        if let Some(product) = state.products.get_mut(product_id) {
            product.available_stock += quantity;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stock_adjustments_pair_up() {
        let inventory = InMemoryInventory::new();
        inventory.stock_product("SKU-001", Money::from_cents(1000), 10);

        inventory.decrease_stock("SKU-001", 3).await.unwrap();
        assert_eq!(inventory.stock_level("SKU-001"), Some(7));

        inventory.increase_stock("SKU-001", 3).await.unwrap();
        assert_eq!(inventory.stock_level("SKU-001"), Some(10));
    }

    #[tokio::test]
    async fn unknown_product_is_none_not_error() {
        let inventory = InMemoryInventory::new();
        assert!(inventory.get_product("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cart_lookup_returns_stored_lines() {
        let inventory = InMemoryInventory::new();
        inventory.set_cart(
            "cart-1",
            vec![CartLine {
                product_id: "SKU-001".to_string(),
                quantity: 2,
            }],
        );

        let lines = inventory.get_cart("cart-1").await.unwrap().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, "SKU-001");
        assert_eq!(lines[0].quantity, 2);
        assert!(inventory.get_cart("cart-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_toggle_degrades_to_dependency_error() {
        let inventory = InMemoryInventory::new();
        inventory.stock_product("SKU-001", Money::from_cents(1000), 10);
        inventory.set_fail_on_adjust(true);

        let result = inventory.decrease_stock("SKU-001", 1).await;
        assert!(matches!(result, Err(EngineError::Dependency(_))));
        assert_eq!(inventory.stock_level("SKU-001"), Some(10));
    }
}

//! Cart state manager.
//!
//! Owns the in-memory cart (ordered list of lines) and the currently
//! selected restaurant, mirroring both to a [`KeyValueStore`]. A cart is
//! scoped to exactly one restaurant; adding a line for a different
//! restaurant discards the current contents, so mixed-restaurant carts
//! cannot exist regardless of caller discipline.
//!
//! Every mutation updates memory first and then awaits the persistence
//! write. A failed write is logged and swallowed: memory stays
//! authoritative for the running session, storage is only consulted at
//! cold start.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use tiffin_core::{LineKey, MenuItemId, RestaurantId};

use crate::error::{Result, StateError};
use crate::storage::{KeyValueStore, keys};

/// One entry in the cart.
///
/// Distinguished from the menu item it references by a unique per-entry
/// key: the same menu item can appear as several lines with different
/// customizations. Customization fields are carried verbatim in `extras`
/// and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Unique key generated at add time.
    pub key: LineKey,
    /// The referenced menu item (foreign id, not owned).
    #[serde(rename = "_id")]
    pub menu_item_id: MenuItemId,
    /// Quantity; unset until the first increment when the add request
    /// omitted it. Always >= 1 after any quantity-mutating operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Opaque customization payload, round-tripped verbatim.
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Request to add a line to the cart.
#[derive(Debug, Clone)]
pub struct AddLine {
    /// The menu item being ordered.
    pub menu_item_id: MenuItemId,
    /// The restaurant the item belongs to. The manager discards the
    /// current cart when this differs from the cart's restaurant.
    pub restaurant_id: RestaurantId,
    /// Initial quantity, if the caller supplies one.
    pub quantity: Option<u32>,
    /// Opaque customization payload copied onto the new line.
    pub extras: Map<String, Value>,
}

impl AddLine {
    /// Create an add request with no quantity and no extras.
    #[must_use]
    pub fn new(menu_item_id: impl Into<MenuItemId>, restaurant_id: impl Into<RestaurantId>) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            restaurant_id: restaurant_id.into(),
            quantity: None,
            extras: Map::new(),
        }
    }

    /// Set the initial quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Result of a [`CartManager::check_line`] query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    /// Whether any line references the queried menu item.
    pub exists: bool,
    /// Quantity of the first matching line; 0 when absent.
    pub quantity: u32,
    /// Key of the first matching line, when one exists.
    pub key: Option<LineKey>,
}

impl CheckLine {
    fn absent() -> Self {
        Self {
            exists: false,
            quantity: 0,
            key: None,
        }
    }
}

/// Cart state manager.
///
/// Exclusively owns the in-memory cart; no other component writes it.
/// The persisted mirror under [`keys::CART_ITEMS`] and
/// [`keys::RESTAURANT`] is updated after every mutation.
#[derive(Debug)]
pub struct CartManager<S> {
    store: S,
    items: Vec<CartLine>,
    restaurant: Option<RestaurantId>,
}

impl<S: KeyValueStore> CartManager<S> {
    /// Hydrate the cart from persistent storage.
    ///
    /// Absent keys default to an empty cart and no restaurant. Because
    /// hydration happens here rather than after construction, dropping the
    /// returned future is the cancellation path: a torn-down caller can
    /// never observe a late-resolving read clobbering its state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MalformedCart`] if the stored cart value does
    /// not parse, and [`StateError::Storage`] if the store itself fails.
    #[instrument(skip(store))]
    pub async fn load(store: S) -> Result<Self> {
        let items = match store.get(keys::CART_ITEMS).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(StateError::MalformedCart)?,
            None => Vec::new(),
        };
        let restaurant = store.get(keys::RESTAURANT).await?.map(RestaurantId::new);

        Ok(Self {
            store,
            items,
            restaurant,
        })
    }

    /// Create an empty cart over `store` without reading it (first launch).
    pub fn empty(store: S) -> Self {
        Self {
            store,
            items: Vec::new(),
            restaurant: None,
        }
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.items
    }

    /// The restaurant the cart is scoped to, if any.
    #[must_use]
    pub const fn restaurant(&self) -> Option<&RestaurantId> {
        self.restaurant.as_ref()
    }

    /// Sum of all line quantities; 0 for an empty cart.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .map(|line| line.quantity.unwrap_or(0))
            .sum()
    }

    /// Look up the first line referencing `menu_item_id` (by catalog id,
    /// not line key). Pure O(n) query.
    #[must_use]
    pub fn check_line(&self, menu_item_id: &MenuItemId) -> CheckLine {
        self.items
            .iter()
            .find(|line| &line.menu_item_id == menu_item_id)
            .map_or_else(CheckLine::absent, |line| CheckLine {
                exists: true,
                quantity: line.quantity.unwrap_or(0),
                key: Some(line.key.clone()),
            })
    }

    /// Append a new line with a freshly generated unique key.
    ///
    /// If the request's restaurant differs from the cart's current one,
    /// the existing lines are discarded first and the cart adopts the new
    /// restaurant. Returns the new line's key.
    #[instrument(skip(self, request), fields(menu_item = %request.menu_item_id))]
    pub async fn add_line(&mut self, request: AddLine) -> LineKey {
        if self.restaurant.as_ref() != Some(&request.restaurant_id) {
            self.items.clear();
            self.restaurant = Some(request.restaurant_id.clone());
            self.write(keys::RESTAURANT, request.restaurant_id.as_str())
                .await;
        }

        let key = LineKey::generate();
        self.items.push(CartLine {
            key: key.clone(),
            menu_item_id: request.menu_item_id,
            quantity: request.quantity,
            extras: request.extras,
        });
        self.persist_items().await;
        key
    }

    /// Increase the quantity of the line identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotFound`] if no line carries `key`.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn add_quantity(&mut self, key: &LineKey, amount: u32) -> Result<()> {
        let line = self
            .items
            .iter_mut()
            .find(|line| &line.key == key)
            .ok_or_else(|| StateError::NotFound(key.clone()))?;
        line.quantity = Some(line.quantity.unwrap_or(0) + amount);
        self.persist_items().await;
        Ok(())
    }

    /// Decrease the quantity of the line identified by `key` by 1.
    ///
    /// A line draining to 0 is removed from the cart; if that leaves the
    /// cart empty the restaurant is cleared as well.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotFound`] if no line carries `key`.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove_quantity(&mut self, key: &LineKey) -> Result<()> {
        let line = self
            .items
            .iter_mut()
            .find(|line| &line.key == key)
            .ok_or_else(|| StateError::NotFound(key.clone()))?;
        line.quantity = Some(line.quantity.unwrap_or(0).saturating_sub(1));
        self.drop_drained_lines().await;
        self.persist_items().await;
        Ok(())
    }

    /// Remove the line identified by `key` outright, regardless of
    /// quantity. A no-op (not an error) when `key` is absent.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete_line(&mut self, key: &LineKey) {
        let Some(index) = self.items.iter().position(|line| &line.key == key) else {
            return;
        };
        self.items.remove(index);
        self.drop_drained_lines().await;
        self.persist_items().await;
    }

    /// Bulk-replace the entire line sequence (programmatic cart rebuilds).
    ///
    /// Replacing with an empty sequence clears the restaurant, keeping the
    /// empty-cart invariant in one place.
    #[instrument(skip(self, items))]
    pub async fn replace(&mut self, items: Vec<CartLine>) {
        self.items = items;
        self.clear_restaurant_if_empty().await;
        self.persist_items().await;
    }

    /// Set the restaurant the cart is scoped to, independently of lines.
    #[instrument(skip(self), fields(restaurant = %id))]
    pub async fn set_restaurant(&mut self, id: RestaurantId) {
        self.write(keys::RESTAURANT, id.as_str()).await;
        self.restaurant = Some(id);
    }

    /// Empty the cart, clear the restaurant, and delete both persisted keys.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        self.items.clear();
        self.restaurant = None;
        self.delete(keys::CART_ITEMS).await;
        self.delete(keys::RESTAURANT).await;
    }

    /// Drop lines whose quantity has drained below 1, then apply the
    /// empty-cart invariant.
    async fn drop_drained_lines(&mut self) {
        self.items.retain(|line| line.quantity.unwrap_or(0) >= 1);
        self.clear_restaurant_if_empty().await;
    }

    /// Empty cart implies no restaurant.
    async fn clear_restaurant_if_empty(&mut self) {
        if self.items.is_empty() && self.restaurant.is_some() {
            self.restaurant = None;
            self.delete(keys::RESTAURANT).await;
        }
    }

    /// Persist the full line sequence. Best-effort: a failed write leaves
    /// memory authoritative and is logged, never returned.
    async fn persist_items(&self) {
        match serde_json::to_string(&self.items) {
            Ok(encoded) => self.write(keys::CART_ITEMS, &encoded).await,
            Err(e) => warn!(error = %e, "Failed to encode cart lines for persistence"),
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value).await {
            warn!(key, error = %e, "Cart persistence write failed; memory remains authoritative");
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!(key, error = %e, "Cart persistence delete failed; memory remains authoritative");
        }
    }
}

//! Tracker contract
//!
//! A tracker is a pluggable backend that receives behavioral events and
//! forwards them to an analytics or marketing system. The manager only
//! depends on a tracker's tenant declarations, its capability set, and the
//! event methods below — never on backend internals.

use fw_common::{Cart, CheckoutStep, Order, Product};
use parking_lot::Mutex;
use serde_json::Value;

use crate::capability::CapabilitySet;

/// A registered tracking backend.
///
/// Every event method has a no-op default so implementations only override
/// what they declare. The declared [`CapabilitySet`] is authoritative: the
/// manager never invokes a method whose capability is missing from the set,
/// even if the implementation overrides it.
///
/// Event methods return `anyhow::Result` so backend failures propagate to
/// the dispatching caller with their original error chain.
pub trait Tracker: Send + Sync {
    /// Stable identity, used as the key when tracked codes are forwarded to
    /// the session flash slot.
    fn name(&self) -> &str;

    /// Assortment tenants this tracker applies to. Empty means every
    /// assortment tenant.
    fn assortment_tenants(&self) -> &[String] {
        &[]
    }

    /// Checkout tenants this tracker applies to. Empty means every checkout
    /// tenant.
    fn checkout_tenants(&self) -> &[String] {
        &[]
    }

    fn capabilities(&self) -> CapabilitySet;

    /// `page` carries arbitrary page context for the backend to interpret.
    fn track_category_page_view(
        &self,
        _categories: &[String],
        _page: Option<&Value>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_product_impression(&self, _product: &dyn Product, _list: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_product_view(&self, _product: &dyn Product) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_cart_update(&self, _cart: &dyn Cart) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_cart_product_action_add(
        &self,
        _cart: &dyn Cart,
        _product: &dyn Product,
        _quantity: f64,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_cart_product_action_remove(
        &self,
        _cart: &dyn Cart,
        _product: &dyn Product,
        _quantity: f64,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Checkout started with its first step.
    fn track_checkout(&self, _cart: &dyn Cart) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_checkout_complete(&self, _order: &dyn Order) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_checkout_step(
        &self,
        _step: &dyn CheckoutStep,
        _cart: &dyn Cart,
        _step_number: Option<&str>,
        _checkout_option: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn track_event(
        &self,
        _category: &str,
        _action: &str,
        _label: Option<&str>,
        _value: Option<i64>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Code snippets accumulated for later page rendering. Only meaningful
    /// for trackers declaring `Capability::TrackingCodeAware`.
    fn tracked_codes(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Accumulator for tracked code snippets.
///
/// Trackers collect snippets through `&self` during dispatch, so the buffer
/// is internally synchronized. Embed one and delegate `tracked_codes` to it.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    codes: Mutex<Vec<String>>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, code: impl Into<String>) {
        self.codes.lock().push(code.into());
    }

    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.codes.lock().clear();
    }
}

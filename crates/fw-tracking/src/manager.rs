//! TrackingManager - fan-out dispatch of behavioral events
//!
//! Holds the registered tracker list, computes the active subset for the
//! current tenant pair, and fans each event out to the trackers declaring
//! the matching capability. Registration order is dispatch order.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use fw_common::{Cart, CheckoutStep, Environment, Order, Product, PropertyValue, DEFAULT_TENANT};

use crate::capability::Capability;
use crate::error::{Result, TrackingError};
use crate::session::{FlashSession, SessionProvider, SessionSource, FLASH_MESSAGE_BAG_KEY};
use crate::tracker::Tracker;

/// Order property marking a completed checkout as already tracked.
const ORDER_TRACKED_PROPERTY: &str = "os_tracked";

/// Active tracker list together with the tenant pair it was computed for.
#[derive(Default)]
struct ActiveTrackerCache {
    assortment_tenant: Option<String>,
    checkout_tenant: Option<String>,
    trackers: Vec<Arc<dyn Tracker>>,
}

impl ActiveTrackerCache {
    fn is_valid_for(&self, assortment_tenant: &str, checkout_tenant: &str) -> bool {
        self.assortment_tenant.as_deref() == Some(assortment_tenant)
            && self.checkout_tenant.as_deref() == Some(checkout_tenant)
    }
}

/// Central dispatcher for e-commerce behavioral events.
///
/// Trackers are registered once at startup; dispatch is synchronous and
/// request-scoped. The active subset is recomputed lazily whenever the
/// environment's tenant pair changes between dispatch calls.
pub struct TrackingManager {
    environment: Arc<dyn Environment>,
    trackers: Vec<Arc<dyn Tracker>>,
    active_cache: Mutex<ActiveTrackerCache>,
    session_source: SessionSource,
}

impl TrackingManager {
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self {
            environment,
            trackers: Vec::new(),
            active_cache: Mutex::new(ActiveTrackerCache::default()),
            session_source: SessionSource::new(),
        }
    }

    /// Creates a manager with an initial tracker list, registered in order.
    pub fn with_trackers(
        environment: Arc<dyn Environment>,
        trackers: Vec<Arc<dyn Tracker>>,
    ) -> Self {
        let mut manager = Self::new(environment);
        for tracker in trackers {
            manager.register_tracker(tracker);
        }
        manager
    }

    /// Appends a tracker to the registry. No dedup, no validation.
    pub fn register_tracker(&mut self, tracker: Arc<dyn Tracker>) {
        info!(
            tracker = %tracker.name(),
            position = self.trackers.len(),
            "Registered tracker"
        );
        self.trackers.push(tracker);
    }

    pub fn set_session_provider(&mut self, provider: Arc<dyn SessionProvider>) {
        self.session_source.set_provider(provider);
    }

    /// Deprecated fallback session for callers without a request-bound
    /// session provider. Prefer [`TrackingManager::set_session_provider`].
    #[deprecated(note = "inject a SessionProvider instead; removed once callers migrate")]
    pub fn set_held_session(&mut self, session: Arc<dyn FlashSession>) {
        #[allow(deprecated)]
        self.session_source.set_held_session(session);
    }

    /// All registered trackers in registration order.
    pub fn trackers(&self) -> &[Arc<dyn Tracker>] {
        &self.trackers
    }

    /// Trackers active for the current tenant pair, in registration order.
    ///
    /// The environment is consulted on every call; the filtered list is only
    /// rebuilt when the (assortment, checkout) pair differs from the cached
    /// one. A tracker is active when it matches on either axis, where an
    /// empty declaration matches every tenant of that axis.
    pub fn active_trackers(&self) -> Vec<Arc<dyn Tracker>> {
        let assortment_tenant = current_tenant(self.environment.current_assortment_tenant());
        let checkout_tenant = current_tenant(self.environment.current_checkout_tenant());

        let mut cache = self.active_cache.lock();
        if !cache.is_valid_for(&assortment_tenant, &checkout_tenant) {
            cache.trackers = self
                .trackers
                .iter()
                .filter(|tracker| is_active(tracker.as_ref(), &assortment_tenant, &checkout_tenant))
                .cloned()
                .collect();

            debug!(
                assortment_tenant = %assortment_tenant,
                checkout_tenant = %checkout_tenant,
                active = cache.trackers.len(),
                registered = self.trackers.len(),
                "Rebuilt active tracker cache"
            );

            cache.assortment_tenant = Some(assortment_tenant);
            cache.checkout_tenant = Some(checkout_tenant);
        }

        cache.trackers.clone()
    }

    pub fn track_category_page_view(
        &self,
        categories: &[String],
        page: Option<&Value>,
    ) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::CategoryPageView, &active, |tracker| {
            tracker.track_category_page_view(categories, page)
        })
    }

    pub fn track_product_impression(&self, product: &dyn Product, list: &str) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::ProductImpression, &active, |tracker| {
            tracker.track_product_impression(product, list)
        })
    }

    pub fn track_product_view(&self, product: &dyn Product) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::ProductView, &active, |tracker| {
            tracker.track_product_view(product)
        })
    }

    pub fn track_cart_update(&self, cart: &dyn Cart) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::CartUpdate, &active, |tracker| {
            tracker.track_cart_update(cart)
        })
    }

    pub fn track_cart_product_action_add(
        &self,
        cart: &dyn Cart,
        product: &dyn Product,
        quantity: f64,
    ) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::CartProductActionAdd, &active, |tracker| {
            tracker.track_cart_product_action_add(cart, product, quantity)
        })
    }

    pub fn track_cart_product_action_remove(
        &self,
        cart: &dyn Cart,
        product: &dyn Product,
        quantity: f64,
    ) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::CartProductActionRemove, &active, |tracker| {
            tracker.track_cart_product_action_remove(cart, product, quantity)
        })
    }

    /// Checkout started with its first step.
    pub fn track_checkout(&self, cart: &dyn Cart) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::Checkout, &active, |tracker| {
            tracker.track_checkout(cart)
        })
    }

    pub fn track_checkout_step(
        &self,
        step: &dyn CheckoutStep,
        cart: &dyn Cart,
        step_number: Option<&str>,
        checkout_option: Option<&str>,
    ) -> Result<()> {
        let active = self.active_trackers();
        self.fan_out(Capability::CheckoutStep, &active, |tracker| {
            tracker.track_checkout_step(step, cart, step_number, checkout_option)
        })
    }

    /// Tracks a completed checkout exactly once per order.
    ///
    /// The order carries a marker property so a page refresh cannot re-fire
    /// completion tracking. The marker is persisted before any tracker is
    /// invoked; a persistence failure propagates and nothing is dispatched.
    pub fn track_checkout_complete(&self, order: &mut dyn Order) -> Result<()> {
        if order
            .property(ORDER_TRACKED_PROPERTY)
            .is_some_and(|value| value.is_truthy())
        {
            debug!(order = %order.id(), "Checkout completion already tracked, skipping");
            return Ok(());
        }

        order.set_property(ORDER_TRACKED_PROPERTY, PropertyValue::Bool(true));
        order.save().map_err(TrackingError::OrderPersistence)?;

        let active = self.active_trackers();
        let order: &dyn Order = order;
        self.fan_out(Capability::CheckoutComplete, &active, |tracker| {
            tracker.track_checkout_complete(order)
        })
    }

    /// Dispatches a generic event to all registered trackers, ignoring
    /// tenant activity.
    pub fn track_event(
        &self,
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<i64>,
    ) -> Result<()> {
        self.fan_out(Capability::TrackEvent, &self.trackers, |tracker| {
            tracker.track_event(category, action, label, value)
        })
    }

    /// Concatenation of every registered tracker's accumulated code
    /// snippets, independent of tenant activity.
    ///
    /// Codes of one tracker are joined by a line separator; trackers are
    /// separated by a blank line. Empty when no tracker accumulated codes.
    pub fn tracked_codes(&self) -> String {
        let mut result = String::new();
        for tracker in &self.trackers {
            if !tracker.capabilities().contains(Capability::TrackingCodeAware) {
                continue;
            }

            let codes = tracker.tracked_codes();
            if codes.is_empty() {
                continue;
            }

            result.push_str(&codes.join("\n"));
            result.push_str("\n\n");
        }

        result
    }

    /// Writes every registered tracker's non-empty code list into the
    /// session flash slot, keyed by tracker name, for one-time retrieval by
    /// a later rendering stage. Returns the manager for call chaining.
    pub fn forward_tracked_codes_as_flash_message(&self) -> Result<&Self> {
        let mut tracked_codes: IndexMap<String, Vec<String>> = IndexMap::new();
        for tracker in &self.trackers {
            if !tracker.capabilities().contains(Capability::TrackingCodeAware) {
                continue;
            }

            let codes = tracker.tracked_codes();
            if !codes.is_empty() {
                tracked_codes.insert(tracker.name().to_string(), codes);
            }
        }

        let session = self.session_source.resolve()?;
        session.set_flash_data(FLASH_MESSAGE_BAG_KEY, tracked_codes);

        Ok(self)
    }

    /// Invokes `invoke` on every tracker in `trackers` declaring
    /// `capability`, in sequence order. The first failure aborts the pass.
    fn fan_out<F>(
        &self,
        capability: Capability,
        trackers: &[Arc<dyn Tracker>],
        mut invoke: F,
    ) -> Result<()>
    where
        F: FnMut(&dyn Tracker) -> anyhow::Result<()>,
    {
        debug!(
            capability = ?capability,
            trackers = trackers.len(),
            "Dispatching tracking event"
        );

        for tracker in trackers {
            if !tracker.capabilities().contains(capability) {
                continue;
            }

            invoke(tracker.as_ref())
                .map_err(|source| TrackingError::tracker(tracker.name(), source))?;
        }

        Ok(())
    }
}

fn current_tenant(tenant: Option<String>) -> String {
    tenant
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_TENANT.to_string())
}

fn is_active(tracker: &dyn Tracker, assortment_tenant: &str, checkout_tenant: &str) -> bool {
    let assortment_match = tracker.assortment_tenants().is_empty()
        || tracker
            .assortment_tenants()
            .iter()
            .any(|tenant| tenant == assortment_tenant);

    let checkout_match = tracker.checkout_tenants().is_empty()
        || tracker
            .checkout_tenants()
            .iter()
            .any(|tenant| tenant == checkout_tenant);

    // A tracker is active when either axis matches. This mirrors the
    // historical activation rule; see the activation tests before changing
    // it to an AND of both axes.
    assortment_match || checkout_match
}

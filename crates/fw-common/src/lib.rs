use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Tenant Environment
// ============================================================================

/// Tenant identifier both axes resolve to when the environment reports none.
pub const DEFAULT_TENANT: &str = "default";

/// Supplies the currently active tenant context for a request.
///
/// Assortment tenants scope the product catalog, checkout tenants scope the
/// checkout flow. Either axis may be unset, in which case callers fall back
/// to [`DEFAULT_TENANT`].
pub trait Environment: Send + Sync {
    fn current_assortment_tenant(&self) -> Option<String>;

    fn current_checkout_tenant(&self) -> Option<String>;
}

/// Environment backed by plain fields.
///
/// Suitable for single-tenant deployments and tests. The tenant values are
/// mutable through `&self` so a shared handle can switch context mid-request.
#[derive(Debug, Default)]
pub struct StaticEnvironment {
    assortment_tenant: Mutex<Option<String>>,
    checkout_tenant: Mutex<Option<String>>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(
        assortment_tenant: impl Into<String>,
        checkout_tenant: impl Into<String>,
    ) -> Self {
        let env = Self::new();
        env.set_current_assortment_tenant(Some(assortment_tenant.into()));
        env.set_current_checkout_tenant(Some(checkout_tenant.into()));
        env
    }

    pub fn set_current_assortment_tenant(&self, tenant: Option<String>) {
        *self.assortment_tenant.lock() = tenant;
    }

    pub fn set_current_checkout_tenant(&self, tenant: Option<String>) {
        *self.checkout_tenant.lock() = tenant;
    }
}

impl Environment for StaticEnvironment {
    fn current_assortment_tenant(&self) -> Option<String> {
        self.assortment_tenant.lock().clone()
    }

    fn current_checkout_tenant(&self) -> Option<String> {
        self.checkout_tenant.lock().clone()
    }
}

// ============================================================================
// Catalog Handles
// ============================================================================

/// Opaque product handle passed through to tracking backends.
pub trait Product: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;
}

/// Opaque cart handle passed through to tracking backends.
pub trait Cart: Send + Sync {
    fn id(&self) -> &str;
}

/// A single step of a checkout flow.
pub trait CheckoutStep: Send + Sync {
    fn name(&self) -> &str;
}

// ============================================================================
// Order Property Bag
// ============================================================================

/// Typed value stored in an order's property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Text(String),
    Number(f64),
}

impl PropertyValue {
    /// Truthiness of a property, used for marker properties that older
    /// integrations may have written as text or numeric flags.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Bool(value) => *value,
            PropertyValue::Text(value) => !value.is_empty(),
            PropertyValue::Number(value) => *value != 0.0,
        }
    }
}

/// A persisted order exposing its property bag.
///
/// `save` must flush pending property changes to the backing store and fail
/// visibly on persistence errors.
pub trait Order: Send + Sync {
    fn id(&self) -> &str;

    fn property(&self, name: &str) -> Option<PropertyValue>;

    fn set_property(&mut self, name: &str, value: PropertyValue);

    fn save(&mut self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_truthiness() {
        assert!(PropertyValue::Bool(true).is_truthy());
        assert!(!PropertyValue::Bool(false).is_truthy());
        assert!(PropertyValue::Text("1".to_string()).is_truthy());
        assert!(!PropertyValue::Text(String::new()).is_truthy());
        assert!(PropertyValue::Number(1.0).is_truthy());
        assert!(!PropertyValue::Number(0.0).is_truthy());
    }

    #[test]
    fn test_static_environment_switches_tenants() {
        let env = StaticEnvironment::with_tenants("eu", "b2b");
        assert_eq!(env.current_assortment_tenant().as_deref(), Some("eu"));
        assert_eq!(env.current_checkout_tenant().as_deref(), Some("b2b"));

        env.set_current_checkout_tenant(None);
        assert_eq!(env.current_checkout_tenant(), None);
    }
}

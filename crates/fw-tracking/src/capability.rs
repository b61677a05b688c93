//! Tracker capability model
//!
//! Backends declare which event kinds they handle through an explicit
//! capability set. The manager checks the set before invoking the matching
//! `Tracker` method, so unsupported events are skipped without error.

/// An event kind a tracking backend can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CategoryPageView,
    ProductImpression,
    ProductView,
    CartUpdate,
    CartProductActionAdd,
    CartProductActionRemove,
    Checkout,
    CheckoutComplete,
    CheckoutStep,
    TrackingCodeAware,
    TrackEvent,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Capability::CategoryPageView,
        Capability::ProductImpression,
        Capability::ProductView,
        Capability::CartUpdate,
        Capability::CartProductActionAdd,
        Capability::CartProductActionRemove,
        Capability::Checkout,
        Capability::CheckoutComplete,
        Capability::CheckoutStep,
        Capability::TrackingCodeAware,
        Capability::TrackEvent,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of capabilities declared by a tracker.
///
/// Built by chaining `with` calls, which keeps declarations usable in
/// constants:
///
/// ```
/// use fw_tracking::{Capability, CapabilitySet};
///
/// const CAPS: CapabilitySet = CapabilitySet::empty()
///     .with(Capability::ProductView)
///     .with(Capability::CartUpdate);
///
/// assert!(CAPS.contains(Capability::ProductView));
/// assert!(!CAPS.contains(Capability::Checkout));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        let mut set = Self::empty();
        let mut i = 0;
        while i < Capability::ALL.len() {
            set = set.with(Capability::ALL[i]);
            i += 1;
        }
        set
    }

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, capability| set.with(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_contains_nothing() {
        let set = CapabilitySet::empty();
        assert!(set.is_empty());
        for capability in Capability::ALL {
            assert!(!set.contains(capability));
        }
    }

    #[test]
    fn test_with_adds_only_requested_capabilities() {
        let set = CapabilitySet::empty()
            .with(Capability::ProductView)
            .with(Capability::TrackEvent);

        assert!(set.contains(Capability::ProductView));
        assert!(set.contains(Capability::TrackEvent));
        assert!(!set.contains(Capability::Checkout));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_all_covers_every_capability() {
        let set = CapabilitySet::all();
        for capability in Capability::ALL {
            assert!(set.contains(capability));
        }
    }

    #[test]
    fn test_iter_yields_declaration_independent_order() {
        let set: CapabilitySet = [Capability::TrackEvent, Capability::CategoryPageView]
            .into_iter()
            .collect();

        let capabilities: Vec<Capability> = set.iter().collect();
        assert_eq!(
            capabilities,
            vec![Capability::CategoryPageView, Capability::TrackEvent]
        );
    }
}

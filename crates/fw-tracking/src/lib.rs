//! Funnelwire Event Tracking Core
//!
//! This crate provides the tenant-aware fan-out of e-commerce behavioral
//! events to pluggable tracking backends:
//! - TrackingManager: Central dispatcher with a lazily rebuilt active-tracker cache
//! - Tracker: Backend contract with capability-gated event methods
//! - Capability/CapabilitySet: Explicit capability declarations checked before dispatch
//! - SessionSource: Two-step resolution of the flash-message session sink
//! - CodeBuffer: Snippet accumulator for code-aware backends

pub mod capability;
pub mod error;
pub mod manager;
pub mod session;
pub mod tracker;

pub use capability::{Capability, CapabilitySet};
pub use error::TrackingError;
pub use manager::TrackingManager;
pub use session::{FlashSession, SessionProvider, SessionSource, FLASH_MESSAGE_BAG_KEY};
pub use tracker::{CodeBuffer, Tracker};

pub type Result<T> = std::result::Result<T, TrackingError>;

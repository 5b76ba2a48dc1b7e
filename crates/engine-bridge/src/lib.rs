//! Bridge between a black-box web rendering engine and the per-tab adapter
//! queue.
//!
//! The engine reports state through property-change notifications and
//! delegate callbacks with no ordering or threading guarantees between the
//! two channels. This crate owns the observation registrations on the live
//! engine instance, marshals every callback onto one serialized queue, and
//! tears registrations down deterministically before the instance goes away.

pub mod bridge;
pub mod metrics;
pub mod port;
pub mod stub;

pub use bridge::{bridge_channel, BridgeReceiver, BridgeSender, BridgedEvent, ObservationBridge};
pub use port::{
    AuthoringEvent, EngineFactory, EngineInstance, EngineObserver, EngineProperty, EngineSlot,
    NavigationEvent, PropertyChange, RegistrationId, OBSERVED_PROPERTIES,
};
pub use stub::{StubEngine, StubEngineFactory};

//! Engine variant selection for tabshell tabs.
//!
//! Each tab runs on exactly one of two engine configurations. Switching
//! replaces the engine instance and its observation wiring while the logical
//! tab (id, navigation state, runtime) stays put.

pub mod selector;
pub mod tab;
pub mod variant;

pub use selector::EngineSelector;
pub use tab::Tab;
pub use variant::{VariantCatalog, VariantProfile};

//! tabshell: binds an embeddable, externally-driven web rendering engine to
//! a single canonical per-tab navigation state.
//!
//! The heavy lifting lives in the workspace crates; this crate supplies the
//! configuration layer and the shell that wires tabs, hooks, and signals
//! together for a host application.

pub mod config;
pub mod errors;
pub mod shell;

pub use config::ShellConfig;
pub use errors::ShellError;
pub use shell::Shell;

// Re-export the surface a host embedding tabshell works against.
pub use engine_bridge::{EngineFactory, EngineInstance, StubEngine, StubEngineFactory};
pub use engine_select::{Tab, VariantCatalog};
pub use nav_center::{Hooks, NavStarted, NavigationState};
pub use scroll_chrome::{ChromeSignal, ScrollSample};
pub use tabshell_core_types::{EngineVariant, LoadError, TabId};

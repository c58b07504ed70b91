//! kprint-group
//!
//! Host-side execution substrates for kprint.
//! - `EmulatedGroup`: runs each unit in turn on the calling thread; units get an explicit `Lane`.
//! - `ThreadGroup`: one OS thread per unit; the unit identity is ambient (thread-local).
//! - `GroupConfig`: group size / console / substrate choice, from env or JSON.

pub mod config;
pub mod emulated;
pub mod threaded;

pub use config::{ConfigError, ConsoleKind, GroupConfig};
pub use emulated::{EmulatedGroup, Lane};
pub use threaded::ThreadGroup;

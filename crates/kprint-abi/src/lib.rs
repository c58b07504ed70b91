//! kprint ABI crate: contracts shared by the printing core and the execution substrates.
//! - `UnitId` / `Mask`: who is calling, who may print.
//! - `ExecutionUnit`: the capability a substrate hands to a calling unit.
//! - `Console`: where emitted blocks end up.
//! - `ambient`: per-thread unit context for native-parallel substrates.

pub mod ambient;
pub mod console;
pub mod unit;

pub use ambient::{AmbientGuard, AmbientUnit, UnitContext};
pub use console::{Console, Record, RecordingConsole, StderrConsole, StdoutConsole};
pub use unit::{ExecutionUnit, Mask, SoloUnit, UnitId};

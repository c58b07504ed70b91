//! kprint: indentation-aware, unit-tagged debug printing for parallel kernels.
//!
//! A caller's C format string is reflowed so that every line starts with
//! `2 × level` spaces and a header region (`Unit%3i : ` on the first line, the
//! same width of blanks after it), then handed with the caller's arguments to
//! the C library's `snprintf`. Three policies decide who prints:
//! [`print_all!`] (every unit), [`print_mask!`] (units selected by a 32-bit
//! mask) and [`print_single!`] (unit 0 only). Every unit prepares the template
//! regardless of the policy; only the emit is guarded. [`print_into!`] takes
//! the policy as a value and prepares into a caller-owned [`TemplateBuf`], so a
//! kernel can reuse one allocation across calls.
//!
//! Features:
//! - `log-execution` (default): instrumented build. Off, the macros expand to nothing.
//! - `native-parallel`: the unit comes from the ambient thread context instead of
//!   an explicit `unit =>` argument.
//! - `template-trace`: dumps every prepared template to stderr.

pub mod debug;
pub mod emit;
pub mod errors;
mod macros;
pub mod policy;
pub mod prepare;
pub mod scan;

pub use errors::{EmitError, PrepareError, PrintError, Result};
pub use kprint_abi::{AmbientUnit, Console, ExecutionUnit, Mask, SoloUnit, UnitId};
pub use policy::{Outcome, Policy, LEADER_HEADER, UNIT_HEADER};
pub use prepare::{prepare_format, prepare_format_into, PreparedTemplate, TemplateBuf};
pub use scan::{scan, Scan};

/// `true` when the print macros are live in this build.
pub const INSTRUMENTED: bool = cfg!(feature = "log-execution");

/// `true` when the print macros read the unit from the ambient thread context.
pub const NATIVE_PARALLEL: bool = cfg!(feature = "native-parallel");

#[doc(hidden)]
pub mod __private {
    pub use libc::{c_int, snprintf};

    use crate::errors::PrintError;

    #[cold]
    pub fn report(err: &PrintError) {
        tracing::error!(error = %err, "kprint call aborted");
    }
}

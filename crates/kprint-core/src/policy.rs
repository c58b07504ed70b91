//! Emission policies: broadcast, masked and leader-only.
//!
//! All three share one shape. Every calling unit prepares the template the
//! same way, unconditionally; only the formatting + console write is guarded
//! by the policy. Units that do not print still build and drop their prepared
//! template, keeping the work uniform across a lock-step group.

use std::ffi::CStr;

use kprint_abi::{ExecutionUnit, Mask, UnitId};

use crate::errors::{EmitError, Result};
use crate::prepare::{prepare_format, prepare_format_into, TemplateBuf};

/// Header for broadcast and masked emission; `%3i` consumes the unit identity.
pub const UNIT_HEADER: &CStr = c"Unit%3i : ";

/// Leader-only emission has a single printer and needs no tag.
pub const LEADER_HEADER: &CStr = c"";

/// What one policy call did for the calling unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Formatted and written `written` bytes from a `prepared`-byte template.
    Emitted { prepared: usize, written: usize },
    /// Prepared a `prepared`-byte template, then dropped it without printing.
    Suppressed { prepared: usize },
}

impl Outcome {
    pub fn emitted(&self) -> bool {
        matches!(self, Outcome::Emitted { .. })
    }

    pub fn prepared(&self) -> usize {
        match *self {
            Outcome::Emitted { prepared, .. } | Outcome::Suppressed { prepared } => prepared,
        }
    }
}

/// Who prints, for calls that choose the policy at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    All,
    Mask(Mask),
    Single,
}

impl Policy {
    pub fn header(self) -> &'static CStr {
        match self {
            Policy::All | Policy::Mask(_) => UNIT_HEADER,
            Policy::Single => LEADER_HEADER,
        }
    }

    pub fn selects(self, unit: UnitId) -> bool {
        match self {
            Policy::All => true,
            Policy::Mask(mask) => mask.contains(unit),
            Policy::Single => unit.is_leader(),
        }
    }

    /// Identity the header consumes, if the policy tags its output.
    pub fn tag(self, unit: UnitId) -> Option<UnitId> {
        match self {
            Policy::Single => None,
            Policy::All | Policy::Mask(_) => Some(unit),
        }
    }
}

fn emit_prepared<U, F>(
    unit: &U,
    prepared: &CStr,
    policy: Policy,
    render: F,
) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, UnitId) -> std::result::Result<Vec<u8>, EmitError>,
{
    let id = unit.unit_id();
    let prepared_len = prepared.to_bytes().len();

    if !policy.selects(id) {
        return Ok(Outcome::Suppressed {
            prepared: prepared_len,
        });
    }

    let block = render(prepared, id)?;
    unit.write_console(&block);
    Ok(Outcome::Emitted {
        prepared: prepared_len,
        written: block.len(),
    })
}

fn print_fresh<U, F>(
    unit: &U,
    level: u32,
    policy: Policy,
    template: &CStr,
    render: F,
) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, UnitId) -> std::result::Result<Vec<u8>, EmitError>,
{
    let prepared = prepare_format(level, policy.header(), template)?;
    emit_prepared(unit, prepared.as_c_str(), policy, render)
}

/// Every unit prints, tagged with its identity.
///
/// `render` receives the prepared template and the unit identity, and must
/// pass the identity as the first formatter argument (for the header's `%3i`).
pub fn print_all<U, F>(unit: &U, level: u32, template: &CStr, render: F) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, UnitId) -> std::result::Result<Vec<u8>, EmitError>,
{
    print_fresh(unit, level, Policy::All, template, render)
}

/// Only units whose bit is set in `mask` print. Identities past bit 31 never do.
pub fn print_mask<U, F>(
    unit: &U,
    level: u32,
    mask: Mask,
    template: &CStr,
    render: F,
) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, UnitId) -> std::result::Result<Vec<u8>, EmitError>,
{
    print_fresh(unit, level, Policy::Mask(mask), template, render)
}

/// Only unit 0 prints, without a tag.
pub fn print_single<U, F>(unit: &U, level: u32, template: &CStr, render: F) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, UnitId) -> std::result::Result<Vec<u8>, EmitError>,
{
    print_fresh(unit, level, Policy::Single, template, render)
}

/// Any policy, preparing into the caller's `buf` instead of a fresh allocation.
///
/// `render` gets `Some(identity)` when the header expects one (see [`Policy::tag`]).
pub fn print_into<U, F>(
    buf: &mut TemplateBuf,
    unit: &U,
    level: u32,
    policy: Policy,
    template: &CStr,
    render: F,
) -> Result<Outcome>
where
    U: ExecutionUnit + ?Sized,
    F: FnOnce(&CStr, Option<UnitId>) -> std::result::Result<Vec<u8>, EmitError>,
{
    let prepared = prepare_format_into(buf, level, policy.header(), template)?;
    emit_prepared(unit, prepared, policy, |t, id| render(t, policy.tag(id)))
}

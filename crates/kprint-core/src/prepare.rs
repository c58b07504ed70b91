//! Format preparer: reflows a template so every line starts with indentation
//! and a header region.
//!
//! The output is sized exactly from one scan of the input:
//! `1 + L + implicit + T × (len(header) + 2 × level)` bytes including the NUL,
//! where `T` is the number of output lines. Placeholders are copied untouched,
//! so the prepared template takes the same arguments as the original (plus
//! whatever the header consumes).

use std::ffi::CStr;

use crate::debug::dump_template;
use crate::errors::PrepareError;
use crate::scan::{scan, Scan};

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

/// Exact prepared size in bytes, NUL included.
pub fn prepared_len(level: u32, header: &CStr, scan: &Scan) -> Result<usize, PrepareError> {
    let indent = (level as usize)
        .checked_mul(INDENT_WIDTH)
        .ok_or(PrepareError::TooLarge)?;
    let per_line = header
        .to_bytes()
        .len()
        .checked_add(indent)
        .ok_or(PrepareError::TooLarge)?;
    scan.output_lines()
        .checked_mul(per_line)
        .and_then(|prefixes| prefixes.checked_add(scan.len))
        .and_then(|n| n.checked_add(usize::from(scan.needs_implicit_break())))
        .and_then(|n| n.checked_add(1))
        .ok_or(PrepareError::TooLarge)
}

/// Clears `out`, reserves exactly what the template needs and writes it.
/// Returns the number of lines written.
fn fill(
    out: &mut Vec<u8>,
    level: u32,
    header: &CStr,
    template: &CStr,
) -> Result<usize, PrepareError> {
    let scan = scan(template);
    let size = prepared_len(level, header, &scan)?;

    out.clear();
    out.try_reserve_exact(size)
        .map_err(|_| PrepareError::Alloc { requested: size })?;

    let indent = level as usize * INDENT_WIDTH;
    let header = header.to_bytes();
    let mut rest = &template.to_bytes()[..scan.len];
    let lines = scan.output_lines();

    for line in 0..lines {
        out.resize(out.len() + indent, b' ');
        if line == 0 {
            out.extend_from_slice(header);
        } else {
            out.resize(out.len() + header.len(), b' ');
        }
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        out.extend_from_slice(&rest[..end]);
        rest = rest.get(end + 1..).unwrap_or(&[]);
        out.push(b'\n');
    }
    out.push(0);

    debug_assert_eq!(out.len(), size, "prepared template size mismatch");
    dump_template("prepare", out);
    tracing::trace!(level, size, lines, "prepared template");
    Ok(lines)
}

/// A freshly built template owned by the call that made it.
///
/// Dropping it releases the buffer, so every exit path of a print call frees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTemplate {
    // invariant: exactly one NUL, at the end
    buf: Vec<u8>,
    lines: usize,
}

impl PreparedTemplate {
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: `fill` copies only NUL-free bytes from two `CStr`s plus spaces
        // and `\n`, then appends a single NUL.
        unsafe { CStr::from_bytes_with_nul_unchecked(&self.buf) }
    }

    /// Prepared text without the NUL.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.buf.len() - 1]
    }

    /// Length without the NUL.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }
}

/// Build a prepared template in a new, exactly sized allocation.
pub fn prepare_format(
    level: u32,
    header: &CStr,
    template: &CStr,
) -> Result<PreparedTemplate, PrepareError> {
    let mut buf = Vec::new();
    let lines = fill(&mut buf, level, header, template)?;
    Ok(PreparedTemplate { buf, lines })
}

/// Caller-owned buffer reused across preparations to avoid a heap round trip per call.
#[derive(Debug, Default)]
pub struct TemplateBuf {
    buf: Vec<u8>,
    lines: usize,
}

impl TemplateBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            lines: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Last prepared text without the NUL; empty before the first preparation.
    pub fn as_bytes(&self) -> &[u8] {
        match self.buf.split_last() {
            Some((_, text)) => text,
            None => &[],
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }
}

/// Prepare into `buf`, reusing its allocation when it is large enough.
pub fn prepare_format_into<'b>(
    buf: &'b mut TemplateBuf,
    level: u32,
    header: &CStr,
    template: &CStr,
) -> Result<&'b CStr, PrepareError> {
    buf.lines = 0;
    buf.lines = fill(&mut buf.buf, level, header, template)?;
    // SAFETY: see `PreparedTemplate::as_c_str`.
    Ok(unsafe { CStr::from_bytes_with_nul_unchecked(&buf.buf) })
}

//! Single-pass length and line-break scanner for null-terminated templates.

use std::ffi::CStr;

/// What one pass over a template reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scan {
    /// Bytes before the terminating NUL.
    pub len: usize,
    /// Number of `\n` bytes.
    pub line_breaks: usize,
    /// Last byte is `\n`.
    pub ends_with_break: bool,
}

impl Scan {
    pub const EMPTY: Scan = Scan {
        len: 0,
        line_breaks: 0,
        ends_with_break: false,
    };

    /// An empty template, or one whose last line has no terminator, gets one more line.
    #[inline]
    pub fn needs_implicit_break(&self) -> bool {
        self.len == 0 || !self.ends_with_break
    }

    /// Lines the prepared template will have.
    #[inline]
    pub fn output_lines(&self) -> usize {
        self.line_breaks + usize::from(self.needs_implicit_break())
    }
}

pub fn scan(template: &CStr) -> Scan {
    scan_bytes(template.to_bytes())
}

/// `None` stands in for a null template and scans as empty.
pub fn scan_opt(template: Option<&CStr>) -> Scan {
    template.map_or(Scan::EMPTY, scan)
}

/// Scans up to the first NUL, or the whole slice if there is none.
pub fn scan_bytes(bytes: &[u8]) -> Scan {
    let mut len = 0;
    let mut line_breaks = 0;
    for &b in bytes {
        if b == 0 {
            break;
        }
        line_breaks += usize::from(b == b'\n');
        len += 1;
    }
    Scan {
        len,
        line_breaks,
        ends_with_break: len > 0 && bytes[len - 1] == b'\n',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_template_is_one_implicit_line() {
        let s = scan(c"");
        assert_eq!(s, Scan::EMPTY);
        assert!(s.needs_implicit_break());
        assert_eq!(s.output_lines(), 1);
        assert_eq!(scan_opt(None), Scan::EMPTY);
    }

    #[test]
    fn counts_length_and_breaks() {
        let s = scan(c"a\nbc\n\nd");
        assert_eq!(s.len, 7);
        assert_eq!(s.line_breaks, 3);
        assert!(!s.ends_with_break);
        assert_eq!(s.output_lines(), 4);
    }

    #[test]
    fn trailing_break_adds_no_line() {
        assert_eq!(scan(c"abc").output_lines(), 1);
        assert_eq!(scan(c"abc\n").output_lines(), 1);
        assert_eq!(scan(c"a\nb").output_lines(), 2);
        assert_eq!(scan(c"\n\n").output_lines(), 2);
    }

    #[test]
    fn raw_bytes_stop_at_first_nul() {
        let s = scan_bytes(b"ab\n\0cd\n");
        assert_eq!(s.len, 3);
        assert_eq!(s.line_breaks, 1);
        assert!(s.ends_with_break);
        assert_eq!(scan_bytes(b"no nul"), scan(c"no nul"));
    }
}

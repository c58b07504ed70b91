// Delegation to the C library formatter.
//
// Conversion specifiers, argument promotion and placeholder/argument matching
// are whatever `snprintf` does; nothing here inspects the template.

use libc::{c_char, c_int};

use crate::errors::EmitError;

/// Run a `snprintf`-shaped call twice: once to size the output, once to write it.
///
/// `render(buf, len)` must forward to `snprintf(buf, len, template, args...)`
/// with the same arguments on both calls. The first call gets a null buffer
/// and length 0, which C99 defines as "report the length only".
pub fn format_c<F>(mut render: F) -> Result<Vec<u8>, EmitError>
where
    F: FnMut(*mut c_char, usize) -> c_int,
{
    let needed = render(std::ptr::null_mut(), 0);
    let needed = usize::try_from(needed).map_err(|_| EmitError::Format(needed))?;

    let size = needed + 1;
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(size)
        .map_err(|_| EmitError::Alloc { requested: size })?;
    out.resize(size, 0);

    let written = render(out.as_mut_ptr().cast::<c_char>(), out.len());
    let written = usize::try_from(written).map_err(|_| EmitError::Format(written))?;
    if written != needed {
        return Err(EmitError::Truncated {
            expected: needed,
            written,
        });
    }

    out.truncate(needed);
    Ok(out)
}

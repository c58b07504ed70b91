// kprint-core/src/debug.rs
#[cfg(feature = "template-trace")]
pub fn dump_template(label: &str, bytes: &[u8]) {
    use std::fmt::Write;
    let mut hex = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        let _ = write!(&mut hex, "{:02X} ", b);
    }

    let text = String::from_utf8_lossy(bytes);
    eprintln!("🔎 [{label}] bytes: {hex}");
    eprintln!("🔎 [{label}] text : {}", text.escape_debug());
}

// no-op stub when feature is off
#[cfg(not(feature = "template-trace"))]
pub fn dump_template(_label: &str, _bytes: &[u8]) {}

//! Printable-string extraction for binary input

/// Minimum run length kept by [`extract_printable`] callers by default
pub const DEFAULT_MIN_LENGTH: usize = 4;

fn is_printable(byte: u8) -> bool {
    byte.is_ascii_graphic() || matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Collect runs of at least `min_len` printable ASCII bytes, each followed by a space
pub fn extract_printable(bytes: &[u8], min_len: usize) -> String {
    let mut out = String::new();

    for run in bytes.split(|b| !is_printable(*b)) {
        if !run.is_empty() && run.len() >= min_len {
            // Every byte in the run is ASCII
            out.extend(run.iter().map(|&b| char::from(b)));
            out.push(' ');
        }
    }

    out
}

//! Memory dump rendering.
//!
//! Rows cover 16 bytes each:
//!
//! ```text
//! [$00da4000] [000]: 4142 4344 4546 4748 494a 4b4c 4d4e 4f50 'ABCDEFGHIJKLMNOP'
//! ```
//!
//! Words are printed as byte pairs in memory order. A short final row keeps
//! its width: missing words are rendered as `____`, and missing ASCII columns
//! as `_`.

use std::fmt::Write;

const ROW_LEN: usize = 16;

/// Summary line printed before the rows.
pub fn header(addr: usize, len: usize) -> String {
    format!(
        "memory at address ${:08x}, size {} bytes (${:08x} - ${:08x})",
        addr,
        len,
        addr,
        (addr + len).saturating_sub(1)
    )
}

/// Render `bytes` as dump rows, labelled as if they started at `addr`.
pub fn rows(addr: usize, bytes: &[u8]) -> impl Iterator<Item = String> + '_ {
    bytes
        .chunks(ROW_LEN)
        .enumerate()
        .map(move |(i, chunk)| row(addr, i * ROW_LEN, chunk))
}

fn row(addr: usize, offset: usize, chunk: &[u8]) -> String {
    let mut s = String::with_capacity(80);
    write!(s, "[${:08x}] [{:03x}]: ", addr + offset, offset).unwrap();

    for pair in 0..ROW_LEN / 2 {
        match (chunk.get(pair * 2), chunk.get(pair * 2 + 1)) {
            (Some(hi), Some(lo)) => write!(s, "{:02x}{:02x} ", hi, lo).unwrap(),
            (Some(hi), None) => write!(s, "{:02x}__ ", hi).unwrap(),
            _ => s.push_str("____ "),
        }
    }

    s.push('\'');
    for i in 0..ROW_LEN {
        s.push(chunk.get(i).map_or('_', |&b| printable(b)));
    }
    s.push('\'');

    s
}

fn printable(b: u8) -> char {
    match b {
        0x21..=0x7e => b.into(),
        _ => '.',
    }
}

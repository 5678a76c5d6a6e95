// Licensed under the Apache-2.0 license

//! Small helpers shared by the parser and the emitters.

use std::cmp::Ordering;

/// Compares two names so that embedded numbers sort by value.
///
/// Digit runs compare numerically (`1_CLKS < 32_CLKS < 256_CLKS`); other
/// runs compare bytewise. Runs with equal value but different zero padding
/// are ordered by their raw length so the order stays total.
///
/// # Examples
/// ```
/// use registers_hal_compiler::util::natural_cmp;
/// use std::cmp::Ordering;
/// assert_eq!(natural_cmp("32_CLKS", "256_CLKS"), Ordering::Less);
/// assert_eq!(natural_cmp("GPC10", "GPC9"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_runs = Runs(a.as_bytes());
    let mut b_runs = Runs(b.as_bytes());
    loop {
        match (a_runs.next(), b_runs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digit_run(x), is_digit_run(y)) {
                    (true, true) => cmp_numeric(x, y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

struct Runs<'a>(&'a [u8]);

impl<'a> Iterator for Runs<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let first = *self.0.first()?;
        let digits = first.is_ascii_digit();
        let len = self
            .0
            .iter()
            .position(|c| c.is_ascii_digit() != digits)
            .unwrap_or(self.0.len());
        let (run, rest) = self.0.split_at(len);
        self.0 = rest;
        Some(run)
    }
}

fn is_digit_run(run: &[u8]) -> bool {
    run.first().is_some_and(|c| c.is_ascii_digit())
}

fn cmp_numeric(x: &[u8], y: &[u8]) -> Ordering {
    let strip = |r: &[u8]| -> usize { r.iter().take_while(|c| **c == b'0').count() };
    let xs = &x[strip(x)..];
    let ys = &y[strip(y)..];
    xs.len()
        .cmp(&ys.len())
        .then_with(|| xs.cmp(ys))
        .then_with(|| x.len().cmp(&y.len()))
}

/// Removes a `#` comment, honoring `\#` as an escaped literal.
pub fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            c => out.push(c),
        }
    }
    out
}

/// Formats an id as a fixed-width C hex literal.
///
/// # Examples
/// ```
/// use registers_hal_compiler::util::hex_id;
/// assert_eq!(hex_id(0x4001_0000), "0x40010000");
/// assert_eq!(hex_id(5), "0x00000005");
/// ```
pub fn hex_id(val: u32) -> String {
    format!("0x{val:08x}")
}

/// Formats an integer as a hex constant with underscores for readability.
///
/// Values <= 9 are formatted as decimal; larger values use hex with
/// underscore separators every 4 digits.
pub fn hex_const(val: u64) -> String {
    if val > 9 {
        let mut x = String::new();
        for (i, c) in format!("{val:x}").chars().rev().enumerate() {
            if i % 4 == 0 && i != 0 {
                x.push('_');
            }
            x.push(c);
        }
        "0x".to_string() + &x.chars().rev().collect::<String>()
    } else {
        format!("{val}")
    }
}

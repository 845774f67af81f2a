//! Traffic-control priority handles in `MAJOR:MINOR` notation
//!
//! The handle packs a 16-bit major into the upper half and a 16-bit minor
//! into the lower half, exactly as `TC_H_MAKE` does in the kernel.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use xt_classify_common::tc_handle;

/// Packed `skb->priority` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Priority(u32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid class `{input}': {reason}")]
pub struct ParsePriorityError {
    pub input: String,
    pub reason: &'static str,
}

impl Priority {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self(tc_handle::make((major as u32) << 16, minor as u32))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u16 {
        (tc_handle::maj(self.0) >> 16) as u16
    }

    pub const fn minor(self) -> u16 {
        tc_handle::min(self.0) as u16
    }

    /// Re-parsable form, four hex digits per component
    pub fn save_form(self) -> SaveForm {
        SaveForm(self)
    }
}

impl From<u32> for Priority {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Priority> for u32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}:{:x}", self.major(), self.minor())
    }
}

/// Zero-padded rendering of a [`Priority`], see [`Priority::save_form`]
#[derive(Debug, Clone, Copy)]
pub struct SaveForm(Priority);

impl fmt::Display for SaveForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.0.major(), self.0.minor())
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ParsePriorityError {
            input: s.to_string(),
            reason,
        };

        let (major, rest) = scan_hex(s).ok_or_else(|| fail("expected hex major"))?;
        let rest = rest.strip_prefix(':').ok_or_else(|| fail("expected `:'"))?;
        let (minor, rest) = scan_hex(rest).ok_or_else(|| fail("expected hex minor"))?;

        if !rest.is_empty() {
            return Err(fail("trailing characters"));
        }

        let major = u16::try_from(major).map_err(|_| fail("major exceeds ffff"))?;
        let minor = u16::try_from(minor).map_err(|_| fail("minor exceeds ffff"))?;

        Ok(Priority::new(major, minor))
    }
}

/// Scan one `%x` field: C whitespace, optional `+`, optional `0x`, then hex
/// digits. A bare `0x` reads as 0. Returns the value (saturated to
/// `u32::MAX`) and the unconsumed input.
fn scan_hex(s: &str) -> Option<(u32, &str)> {
    let s = s.trim_start_matches(is_c_space);
    let s = s.strip_prefix('+').unwrap_or(s);
    let (digits, prefixed) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(after) => (after, true),
        None => (s, false),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    if end == 0 {
        return prefixed.then_some((0, digits));
    }

    let value = digits[..end]
        .chars()
        .filter_map(|c| c.to_digit(16))
        .fold(0u32, |acc, d| acc.saturating_mul(16).saturating_add(d));

    Some((value, &digits[end..]))
}

/// `isspace` in the C locale
fn is_c_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

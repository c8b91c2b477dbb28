//! Cache keys derived from coordinates
//!
//! Keys have the form `"{lat},{lon}"`. Lookups and writes must go through the
//! same formatting, otherwise an entry written under one spelling silently
//! misses under another.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lookup key for one location in the response cache
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for a latitude/longitude pair
    ///
    /// Integral coordinates keep a trailing `.0` (`19.0`, not `19`) and
    /// magnitudes below `1e-4` use exponent form with a two-digit exponent
    /// (`1e-05`), so keys match cache files written by earlier versions of
    /// the tool.
    pub fn from_coords(lat: f64, lon: f64) -> Self {
        Self(format!("{},{}", format_coord(lat), format_coord(lon)))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a coordinate with shortest round-trip precision
fn format_coord(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        format_exponent(value)
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Exponent form with an explicit sign and at least two exponent digits
fn format_exponent(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

//! Bluetooth address ⇄ integer device id.
//!
//! `encode` never fails loudly: anything it cannot turn into an id becomes
//! [`DeviceId::NONE`], and callers switch off identity-dependent behaviour
//! (recording) when they see it.
//!
//! The self-check re-renders the parsed value and only requires the cleaned
//! input to *contain* it. Leading zeros dropped by the rendering are
//! therefore accepted; only gross parse corruption is caught.

use serde::Serialize;
use std::fmt;

/// Integer identity of a board, derived from its Bluetooth address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Sentinel for "no identifier available".
    pub const NONE: DeviceId = DeviceId(0);

    #[inline]
    pub fn is_available(self) -> bool {
        self != Self::NONE
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colon-free, lower-cased form of an address.
fn normalize(mac: &str) -> String {
    mac.chars()
        .filter(|&c| c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Encode an address such as `"00:1B:7A:4C:2D:9E"` into a device id.
pub fn encode(mac: Option<&str>) -> DeviceId {
    let Some(mac) = mac else {
        tracing::warn!("no device address; device id unavailable");
        return DeviceId::NONE;
    };
    let hex = normalize(mac);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        tracing::warn!(mac, "malformed device address");
        return DeviceId::NONE;
    }
    let value = match u64::from_str_radix(&hex, 16) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(mac, error = %e, "device address does not fit in 64 bits");
            return DeviceId::NONE;
        }
    };
    let rendered = format!("{value:x}");
    if !hex.contains(&rendered) {
        tracing::warn!(mac, rendered = %rendered, "device address failed round-trip check");
        return DeviceId::NONE;
    }
    DeviceId(value)
}

/// Render an id back to the canonical `AA:BB:CC:DD:EE:FF` form.
///
/// Ids wider than 48 bits keep all their digits.
pub fn to_mac_string(id: DeviceId) -> String {
    let hex = format!("{:012X}", id.0);
    let bytes = hex.as_bytes();
    let mut out = String::with_capacity(hex.len() + hex.len() / 2);
    for (i, pair) in bytes.chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(std::str::from_utf8(pair).unwrap_or("??"));
    }
    out
}

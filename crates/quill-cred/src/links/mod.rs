//! Built-in link sets.
//!
//! Each set is a [`GraphExtension`](crate::graph::GraphExtension); the
//! standard graph registers all three in order.

mod base;
mod mina;
mod secp256k1;

pub use base::BaseExtension;
pub use mina::MinaExtension;
pub use secp256k1::Secp256k1Extension;

use num_bigint::BigUint;
use quill_core::FlatValue;

pub(crate) fn expect_utf8(value: &FlatValue) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected utf8, got {}", value.kind()))
}

pub(crate) fn expect_bytes(value: &FlatValue) -> Result<&[u8], String> {
    value
        .as_bytes()
        .ok_or_else(|| format!("expected bytes, got {}", value.kind()))
}

pub(crate) fn expect_uint(value: &FlatValue) -> Result<&BigUint, String> {
    value
        .as_uint()
        .ok_or_else(|| format!("expected uint, got {}", value.kind()))
}

pub(crate) fn expect_bool(value: &FlatValue) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("expected bool, got {}", value.kind()))
}

/// Decode hex with an optional `0x` prefix.
pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| format!("invalid hex: {}", e))
}

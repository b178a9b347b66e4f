//! Base primitives: text, bytes, unsigned integers and their codecs.

use num_bigint::BigUint;
use quill_core::{FlatValue, ValueKind};
use sha2::{Digest, Sha256};

use super::{decode_hex, expect_bool, expect_bytes, expect_uint, expect_utf8};
use crate::graph::{GraphExtension, GraphLink, GraphNode};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Fixed widths offered as `uint-bytes{N}` links.
const FIXED_WIDTHS: [usize; 5] = [2, 4, 8, 16, 32];

pub struct BaseExtension;

pub(crate) fn is_base58(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| BASE58_ALPHABET.contains(c))
}

fn is_hex(s: &str) -> bool {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    digits.len() % 2 == 0 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Big-endian encoding left-padded to exactly `width` bytes.
pub(crate) fn uint_to_fixed(value: &BigUint, width: usize) -> Result<Vec<u8>, String> {
    let raw = value.to_bytes_be();
    // to_bytes_be() of zero is [0]
    let significant: &[u8] = if raw == [0] { &[] } else { &raw };
    if significant.len() > width {
        return Err(format!("{} does not fit in {} bytes", value, width));
    }
    let mut out = vec![0u8; width - significant.len()];
    out.extend_from_slice(significant);
    Ok(out)
}

fn parse_decimal(s: &str) -> Result<BigUint, String> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a decimal unsigned integer", s));
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| format!("'{}' is not a decimal unsigned integer", s))
}

fn identity(name: &str, node: &str) -> GraphLink {
    GraphLink::single(name, node, node, |v| Ok(v.clone()))
}

fn fixed_width_link(width: usize) -> GraphLink {
    GraphLink::single(format!("uint-bytes{}", width), "uint", "bytes", move |v| {
        uint_to_fixed(expect_uint(v)?, width).map(FlatValue::Bytes)
    })
}

impl GraphExtension for BaseExtension {
    fn name(&self) -> &str {
        "base"
    }

    fn nodes(&self) -> Vec<GraphNode> {
        vec![
            GraphNode::new("utf8", ValueKind::Utf8),
            GraphNode::new("bytes", ValueKind::Bytes),
            GraphNode::new("uint", ValueKind::UInt),
            GraphNode::new("bool", ValueKind::Bool),
            GraphNode::new("hex", ValueKind::Utf8)
                .with_check(|v| v.as_str().is_some_and(is_hex)),
            GraphNode::new("base58", ValueKind::Utf8)
                .with_check(|v| v.as_str().is_some_and(is_base58)),
        ]
    }

    fn links(&self) -> Vec<GraphLink> {
        let mut links = vec![
            identity("utf8.identity", "utf8"),
            identity("uint.identity", "uint"),
            identity("bytes.identity", "bytes"),
            identity("bool.identity", "bool"),
            GraphLink::single("utf8-bytes", "utf8", "bytes", |v| {
                Ok(FlatValue::Bytes(expect_utf8(v)?.as_bytes().to_vec()))
            }),
            GraphLink::single("bytes-utf8", "bytes", "utf8", |v| {
                String::from_utf8(expect_bytes(v)?.to_vec())
                    .map(FlatValue::Utf8)
                    .map_err(|e| format!("invalid utf8: {}", e))
            }),
            GraphLink::single("utf8-uint", "utf8", "uint", |v| {
                parse_decimal(expect_utf8(v)?).map(FlatValue::UInt)
            }),
            GraphLink::single("uint-utf8", "uint", "utf8", |v| {
                Ok(FlatValue::Utf8(expect_uint(v)?.to_str_radix(10)))
            }),
            GraphLink::single("bytes-uint", "bytes", "uint", |v| {
                Ok(FlatValue::UInt(BigUint::from_bytes_be(expect_bytes(v)?)))
            }),
            GraphLink::single("uint-bytes", "uint", "bytes", |v| {
                Ok(FlatValue::Bytes(expect_uint(v)?.to_bytes_be()))
            }),
            GraphLink::single("hex-bytes", "hex", "bytes", |v| {
                decode_hex(expect_utf8(v)?).map(FlatValue::Bytes)
            }),
            GraphLink::single("bytes-hex", "bytes", "hex", |v| {
                Ok(FlatValue::Utf8(hex::encode(expect_bytes(v)?)))
            }),
            GraphLink::single("base58-bytes", "base58", "bytes", |v| {
                bs58::decode(expect_utf8(v)?)
                    .into_vec()
                    .map(FlatValue::Bytes)
                    .map_err(|e| format!("invalid base58: {}", e))
            }),
            GraphLink::single("bytes-base58", "bytes", "base58", |v| {
                Ok(FlatValue::Utf8(bs58::encode(expect_bytes(v)?).into_string()))
            }),
            GraphLink::single("bool-uint", "bool", "uint", |v| {
                Ok(FlatValue::uint(u64::from(expect_bool(v)?)))
            }),
            GraphLink::single("bytes-sha256", "bytes", "bytes", |v| {
                Ok(FlatValue::Bytes(Sha256::digest(expect_bytes(v)?).to_vec()))
            }),
        ];
        links.extend(FIXED_WIDTHS.iter().map(|&w| fixed_width_link(w)));
        links
    }
}

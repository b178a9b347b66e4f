//! Byte-oriented primitives for ECDSA over secp256k1.
//!
//! Only structural checks happen here (lengths, SEC1 prefixes, recovery
//! byte). Whether a point is on the curve is the signer's business.

use quill_core::{FlatValue, ValueKind};

use super::{decode_hex, expect_bytes, expect_utf8};
use crate::graph::{GraphExtension, GraphLink, GraphNode};

pub struct Secp256k1Extension;

fn check_signature(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() != 65 {
        return Err(format!(
            "secp256k1 signature must be 65 bytes, got {}",
            bytes.len()
        ));
    }
    match bytes[64] {
        0 | 1 | 27 | 28 => Ok(()),
        v => Err(format!("invalid recovery byte {}", v)),
    }
}

fn check_public_key(bytes: &[u8]) -> Result<(), String> {
    match (bytes.len(), bytes.first()) {
        (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
        (len, _) => Err(format!("not a SEC1 secp256k1 public key ({} bytes)", len)),
    }
}

fn check_address(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() == 20 {
        Ok(())
    } else {
        Err(format!("address must be 20 bytes, got {}", bytes.len()))
    }
}

fn checked_node(name: &str, check: fn(&[u8]) -> Result<(), String>) -> GraphNode {
    GraphNode::new(name, ValueKind::Bytes)
        .with_check(move |v| v.as_bytes().is_some_and(|b| check(b).is_ok()))
}

fn decode_link(name: &str, output: &str, check: fn(&[u8]) -> Result<(), String>) -> GraphLink {
    GraphLink::single(name, "hex", output, move |v| {
        let bytes = decode_hex(expect_utf8(v)?)?;
        check(&bytes)?;
        Ok(FlatValue::Bytes(bytes))
    })
}

fn unwrap_link(name: &str, input: &str) -> GraphLink {
    GraphLink::single(name, input, "bytes", |v| {
        Ok(FlatValue::Bytes(expect_bytes(v)?.to_vec()))
    })
}

impl GraphExtension for Secp256k1Extension {
    fn name(&self) -> &str {
        "secp256k1"
    }

    fn nodes(&self) -> Vec<GraphNode> {
        vec![
            checked_node("secp256k1:signature", check_signature),
            checked_node("secp256k1:publickey", check_public_key),
            checked_node("eth:address", check_address),
        ]
    }

    fn links(&self) -> Vec<GraphLink> {
        vec![
            decode_link(
                "hex-secp256k1:signature",
                "secp256k1:signature",
                check_signature,
            ),
            unwrap_link("secp256k1:signature-bytes", "secp256k1:signature"),
            decode_link(
                "hex-secp256k1:publickey",
                "secp256k1:publickey",
                check_public_key,
            ),
            unwrap_link("secp256k1:publickey-bytes", "secp256k1:publickey"),
            decode_link("hex-eth:address", "eth:address", check_address),
            unwrap_link("eth:address-bytes", "eth:address"),
        ]
    }
}

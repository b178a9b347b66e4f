//! Mina primitives: Pallas base-field elements, compressed public keys and
//! Schnorr signatures in their base58check wire form.
//!
//! Public key payload: `0xCB 0x01 0x01 x[32, LE] is_odd[1]`.
//! Signature payload:  `0x9A 0x01 r[32, LE] s[32, LE]`.

use num_bigint::BigUint;
use quill_core::{
    is_canonical_field, pallas_scalar_modulus, reduce_to_field, CurvePoint, FlatValue,
    SignatureParts, ValueKind,
};

use super::{expect_bool, expect_uint, expect_utf8};
use crate::graph::{GraphExtension, GraphLink, GraphNode};

const PUBLIC_KEY_VERSION: u8 = 0xCB;
const SIGNATURE_VERSION: u8 = 0x9A;
const PUBLIC_KEY_PAYLOAD_LEN: usize = 36;
const SIGNATURE_PAYLOAD_LEN: usize = 66;

pub struct MinaExtension;

fn decode_check(s: &str, version: u8) -> Result<Vec<u8>, String> {
    bs58::decode(s)
        .with_check(Some(version))
        .into_vec()
        .map_err(|e| format!("invalid base58check: {}", e))
}

pub(crate) fn decode_public_key(s: &str) -> Result<CurvePoint, String> {
    let payload = decode_check(s, PUBLIC_KEY_VERSION)?;
    if payload.len() != PUBLIC_KEY_PAYLOAD_LEN || payload[1] != 0x01 || payload[2] != 0x01 {
        return Err("malformed mina public key payload".to_string());
    }
    let x = BigUint::from_bytes_le(&payload[3..35]);
    if !is_canonical_field(&x) {
        return Err("public key x-coordinate is not a field element".to_string());
    }
    let is_odd = match payload[35] {
        0 => false,
        1 => true,
        b => return Err(format!("invalid parity byte {}", b)),
    };
    Ok(CurvePoint { x, is_odd })
}

pub(crate) fn decode_signature(s: &str) -> Result<SignatureParts, String> {
    let payload = decode_check(s, SIGNATURE_VERSION)?;
    if payload.len() != SIGNATURE_PAYLOAD_LEN || payload[1] != 0x01 {
        return Err("malformed mina signature payload".to_string());
    }
    let r = BigUint::from_bytes_le(&payload[2..34]);
    let s = BigUint::from_bytes_le(&payload[34..66]);
    if !is_canonical_field(&r) {
        return Err("signature r is not a field element".to_string());
    }
    if &s >= pallas_scalar_modulus() {
        return Err("signature s is not a scalar".to_string());
    }
    Ok(SignatureParts { r, s })
}

fn field_node(name: &str) -> GraphNode {
    GraphNode::new(name, ValueKind::Field)
        .with_check(|v| v.as_field().is_some_and(is_canonical_field))
}

impl GraphExtension for MinaExtension {
    fn name(&self) -> &str {
        "mina"
    }

    fn nodes(&self) -> Vec<GraphNode> {
        vec![
            field_node("mina:field"),
            field_node("mina:fields").spread(),
            GraphNode::new("mina:publickey", ValueKind::Point),
            GraphNode::new("mina:signature", ValueKind::Signature),
        ]
    }

    fn links(&self) -> Vec<GraphLink> {
        vec![
            GraphLink::single("uint-mina:field", "uint", "mina:field", |v| {
                Ok(FlatValue::Field(reduce_to_field(expect_uint(v)?)))
            }),
            GraphLink::single("mina:field-uint", "mina:field", "uint", |v| match v {
                FlatValue::Field(f) => Ok(FlatValue::UInt(f.clone())),
                other => Err(format!("expected field, got {}", other.kind())),
            }),
            GraphLink::single("bool-mina:field", "bool", "mina:field", |v| {
                Ok(FlatValue::field(u64::from(expect_bool(v)?)))
            }),
            GraphLink::single("mina:base58-publickey", "base58", "mina:publickey", |v| {
                decode_public_key(expect_utf8(v)?).map(FlatValue::Point)
            }),
            GraphLink::spread(
                "mina:publickey-fields",
                "mina:publickey",
                "mina:fields",
                |v| match v {
                    FlatValue::Point(p) => Ok(vec![
                        FlatValue::Field(p.x.clone()),
                        FlatValue::field(u64::from(p.is_odd)),
                    ]),
                    other => Err(format!("expected point, got {}", other.kind())),
                },
            ),
            GraphLink::single("mina:base58-signature", "base58", "mina:signature", |v| {
                decode_signature(expect_utf8(v)?).map(FlatValue::Signature)
            }),
            // s lives in the scalar field, which is larger than the base
            // field, so it is split into its high bits and its low bit.
            GraphLink::spread(
                "mina:signature-fields",
                "mina:signature",
                "mina:fields",
                |v| match v {
                    FlatValue::Signature(sig) => Ok(vec![
                        FlatValue::Field(sig.r.clone()),
                        FlatValue::Field(&sig.s >> 1u32),
                        FlatValue::Field(&sig.s & BigUint::from(1u8)),
                    ]),
                    other => Err(format!("expected signature, got {}", other.kind())),
                },
            ),
        ]
    }
}

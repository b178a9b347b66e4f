//! End-to-end journey through the quill command functions.
//!
//! 1. An operator writes a config that enables only the Mina extension
//! 2. They inspect the graph and check a schema against it
//! 3. A Mina-issued credential is prepared under both schema versions
//! 4. A second issuer signs the same credential with Ed25519
//! 5. A verifier picks that proof by issuer and checks it
//! 6. Tampering with a signed attribute breaks verification
//!
//! Everything goes through files on disk, as the binary does.

use std::path::PathBuf;

use quill::ed25519::Ed25519Signer;
use quill::{
    build_graph, build_preparator, check_schema, issue_ed25519, list_links, load_credential,
    load_schema, prepare_output, select_output, verify_ed25519, GraphConfig, IssueTemplate,
    RootConfig, RootError, SelectArgs,
};
use quill_cred::PreparatorConfig;
use serde_json::json;

const MINA_PUBLIC_KEY: &str = "B62qqvKdn3TP2TSG9NYVLeiePxgSnJBJsSyRAZWAAFJpPWQ3Z5uy4Qk";
const MINA_SIGNATURE: &str = "7mWxjLYgbJUkZNcGouvhVj5tJ8yu9hoexb9ntvPK8vAr4pXpVVZpo1gsEQKWnyMHoZsCYLVfmaf96oQq4Kghr1Z7JK1pArG1";

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("quill-journey-{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn write_json(&self, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn mina_credential() -> serde_json::Value {
    json!({
        "attributes": {
            "sch": 1,
            "isd": 1_700_000_000_000u64,
            "exd": 0,
            "sbj": { "id": { "t": 1, "k": "123456" } }
        },
        "proofs": [{
            "type": "mina",
            "signature": {
                "sign": MINA_SIGNATURE,
                "isr": { "id": { "t": 2, "k": MINA_PUBLIC_KEY } }
            },
            "attributeSchemas": {
                "pre": { "sbj": { "id": { "k": ["utf8-bytes", "bytes-uint", "uint-mina:field"] } } },
                "default": {
                    "sch": ["uint-mina:field"],
                    "isd": ["uint-mina:field"],
                    "exd": ["uint-mina:field"],
                    "sbj": { "id": {
                        "t": ["uint-mina:field"],
                        "k": ["utf8-bytes", "bytes-uint", "uint-mina:field"]
                    } }
                }
            },
            "signatureSchemas": {
                "default": {
                    "sign": ["mina:base58-signature", "mina:signature-fields"],
                    "isr": { "id": {
                        "t": ["uint-mina:field"],
                        "k": ["mina:base58-publickey", "mina:publickey-fields"]
                    } }
                }
            }
        }]
    })
}

fn mina_only_config(ws: &Workspace) -> (PathBuf, RootConfig) {
    let config = RootConfig {
        preparator: PreparatorConfig::default(),
        graph: GraphConfig {
            extensions: vec!["mina".into()],
        },
    };
    let path = ws.dir.join("config.toml");
    config.save(&path).unwrap();
    (path, config)
}

#[test]
fn chapter_1_config_shapes_the_graph() {
    let ws = Workspace::new("config");
    let (path, config) = mina_only_config(&ws);

    let loaded = RootConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let graph = build_graph(&loaded.graph).unwrap();
    let links = list_links(&graph);
    assert!(links.iter().any(|l| l == "uint-mina:field: uint -> mina:field"));
    assert!(!links.iter().any(|l| l.starts_with("hex-secp256k1")));

    let schema_path = ws.write_json(
        "schema.json",
        &json!({ "sig": ["hex-secp256k1:signature", "secp256k1:signature-bytes"] }),
    );
    let schema = load_schema(&schema_path).unwrap();
    let problems = check_schema(&graph, &schema);
    assert_eq!(problems.len(), 2, "both links are unknown without secp256k1");
}

#[test]
fn chapter_2_mina_credential_under_two_versions() {
    let ws = Workspace::new("mina");
    let (_, config) = mina_only_config(&ws);
    let preparator = build_preparator(&config).unwrap();
    let cred_path = ws.write_json("cred.json", &mina_credential());
    let cred = load_credential(&cred_path).unwrap();

    let default_out = prepare_output(
        &preparator,
        &cred,
        &SelectArgs::default().to_selector().unwrap(),
        false,
        false,
    )
    .unwrap();
    let default_seq: Vec<String> = serde_json::from_str(&default_out).unwrap();
    assert_eq!(default_seq.len(), 5);
    assert_eq!(default_seq[0], "1");
    assert_eq!(default_seq[4], "54091677185334");

    let pre = SelectArgs {
        schema: Some("pre".into()),
        ..SelectArgs::default()
    };
    let pre_out = prepare_output(&preparator, &cred, &pre.to_selector().unwrap(), false, false)
        .unwrap();
    let pre_seq: Vec<String> = serde_json::from_str(&pre_out).unwrap();
    assert_eq!(pre_seq, vec!["54091677185334".to_string()]);

    let sig_out = prepare_output(
        &preparator,
        &cred,
        &SelectArgs::default().to_selector().unwrap(),
        true,
        false,
    )
    .unwrap();
    let sig_seq: Vec<String> = serde_json::from_str(&sig_out).unwrap();
    assert_eq!(
        sig_seq,
        vec![
            "19071638222882205677528056858779911749735352422212327936903978369121567899649",
            "13395555418452977797311373269857318967076021344172944622349222902121101262851",
            "1",
            "2",
            "330152369486100395749795663219350377463817939050657971195926862265401262302",
            "1",
        ]
    );
}

#[test]
fn chapter_3_second_issuer_signs_and_is_verified() {
    let ws = Workspace::new("issue");
    let config = RootConfig::default();
    let preparator = build_preparator(&config).unwrap();
    let cred = load_credential(&ws.write_json("cred.json", &mina_credential())).unwrap();

    let template_path = ws.write_json(
        "template.json",
        &json!({
            "type": "ed25519",
            "issuerType": 7,
            "attributeSchemas": {
                "default": {
                    "sch": ["uint-bytes2"],
                    "isd": ["uint-bytes8"],
                    "sbj": { "id": { "k": ["utf8-bytes"] } }
                }
            }
        }),
    );
    let template: IssueTemplate =
        serde_json::from_str(&std::fs::read_to_string(&template_path).unwrap()).unwrap();
    let key_path = ws.dir.join("issuer.key");
    std::fs::write(&key_path, format!("{}\n", hex::encode([42u8; 32]))).unwrap();
    let signer = Ed25519Signer::from_hex(&std::fs::read_to_string(&key_path).unwrap()).unwrap();

    let issued = issue_ed25519(&preparator, cred, &template, &signer, "default").unwrap();
    let issued_path = ws.write_json("issued.json", &serde_json::to_value(&issued).unwrap());
    let reloaded = load_credential(&issued_path).unwrap();
    assert_eq!(reloaded, issued);

    let by_issuer = SelectArgs {
        issuer_type: Some(7),
        issuer_key: Some(signer.public_key_hex()),
        ..SelectArgs::default()
    };
    let selector = by_issuer.to_selector().unwrap();

    let summary = select_output(&preparator, &reloaded, &selector).unwrap();
    assert_eq!(summary["index"], json!(1));
    assert_eq!(summary["type"], json!("ed25519"));

    let outcome = verify_ed25519(&preparator, &reloaded, &selector).unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.index, 1);

    // The original Mina proof is still the default selection.
    let first = select_output(
        &preparator,
        &reloaded,
        &SelectArgs::default().to_selector().unwrap(),
    )
    .unwrap();
    assert_eq!(first["type"], json!("mina"));
}

#[test]
fn chapter_4_tampering_breaks_verification() {
    let ws = Workspace::new("tamper");
    let preparator = build_preparator(&RootConfig::default()).unwrap();
    let cred = load_credential(&ws.write_json("cred.json", &mina_credential())).unwrap();
    let template: IssueTemplate = serde_json::from_value(json!({
        "type": "ed25519",
        "attributeSchemas": { "default": { "isd": ["uint-bytes8"] } }
    }))
    .unwrap();
    let signer = Ed25519Signer::from_seed(&[5u8; 32]);
    let mut issued = issue_ed25519(&preparator, cred, &template, &signer, "default").unwrap();

    issued.attributes.isd += 1;
    let selector = SelectArgs {
        proof_type: Some("ed25519".into()),
        ..SelectArgs::default()
    }
    .to_selector()
    .unwrap();
    let outcome = verify_ed25519(&preparator, &issued, &selector).unwrap();
    assert!(!outcome.valid);
}

#[test]
fn chapter_5_failures_are_reported() {
    let ws = Workspace::new("failures");
    let preparator = build_preparator(&RootConfig::default()).unwrap();

    let missing = load_credential(&ws.dir.join("nope.json")).unwrap_err();
    assert!(matches!(missing, RootError::Io(_)));

    let bad_path = ws.dir.join("bad.json");
    std::fs::write(&bad_path, "{ not json").unwrap();
    assert!(matches!(
        load_credential(&bad_path).unwrap_err(),
        RootError::Serialization(_)
    ));

    // The Mina signature is not an Ed25519 signature.
    let cred = load_credential(&ws.write_json("cred.json", &mina_credential())).unwrap();
    let err = verify_ed25519(
        &preparator,
        &cred,
        &SelectArgs::default().to_selector().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, RootError::Proof(_)));
}

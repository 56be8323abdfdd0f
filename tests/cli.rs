use serde_json::Value;
use std::process::{Command, Output};
use vault_bridge::chains::table::CHAINS;
use vault_bridge::relay::{build_keysign_uri, seal, CustomMessagePayload, SessionKey, SessionPayload, SIGN_MESSAGE};

fn run_cli(args: &[&str]) -> Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("vault-bridge");
    Command::new(binary_path)
        .args(args)
        .env_remove("VAULT_BRIDGE_RELAY_URL")
        .env_remove("VAULT_BRIDGE_POLL_INTERVAL_MS")
        .env_remove("VAULT_BRIDGE_HTTP_TIMEOUT_SECS")
        .env("RUST_LOG", "off")
        .output()
        .expect("cli runs")
}

fn stdout_json(output: &Output) -> Value {
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
fn chains_table_lists_every_family() {
    let output = run_cli(&["chains"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["Ethereum", "Bitcoin-Cash", "Dydx", "MayaChain"] {
        assert!(stdout.contains(name), "missing {}", name);
    }
    assert!(stdout.contains("Thorchain-like"));
}

#[test]
fn chains_json_matches_table() {
    let json = stdout_json(&run_cli(&["chains", "--json"]));
    let chains = json.as_array().expect("array");
    assert_eq!(chains.len(), CHAINS.len());

    let arbitrum = chains.iter().find(|c| c["chain"] == "Arbitrum").expect("arbitrum listed");
    assert_eq!(arbitrum["family"], "evm");
    assert_eq!(arbitrum["evm_chain_id"], 42161);
    assert!(arbitrum["endpoints"]["rpc"].is_string());
}

#[test]
fn inspect_uri_decrypts_payload() {
    let payload = SessionPayload::CustomMessage(CustomMessagePayload {
        method: "personal_sign".to_string(),
        message: "Sign in to example.org".to_string(),
        chain: "Ethereum".to_string(),
    });
    let key = SessionKey::generate();
    let message = seal(&payload, "6f1c2a48-9d1e-4b8a-a1f4-0c5d7e3b2a19", &key, "VaultBridge").unwrap();
    let uri = build_keysign_uri("vultisig", "vultisig.com", SIGN_MESSAGE, "02abcdef", &message).unwrap();

    let json = stdout_json(&run_cli(&["inspect-uri", &uri]));
    assert_eq!(json["type"], "SignMessage");
    assert_eq!(json["vault"], "02abcdef");
    assert_eq!(json["session_id"], "6f1c2a48-9d1e-4b8a-a1f4-0c5d7e3b2a19");
    assert_eq!(json["payload"]["type"], "custom_message");
    assert_eq!(json["payload"]["data"]["message"], "Sign in to example.org");
}

#[test]
fn inspect_uri_rejects_garbage() {
    let output = run_cli(&["inspect-uri", "vultisig://vultisig.com?type=SignTransaction"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("jsonData"));
}

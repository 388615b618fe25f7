//! Integration tests: launches the reference service on an ephemeral port
//! and drives it with the client.

mod common;

use common::spawn_server;
use cryptoservice::CryptoServiceClient;

const MESSAGE: &str = "哥们你真的逆天啊";

#[test]
fn test_generate_keys_for_supported_strengths() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();

    for strength in [64, 128, 256, 1024, 2048] {
        let keygen = client.generate_keys(strength).unwrap();
        assert!(!keygen.keys.public_key.is_empty());
        assert!(!keygen.keys.private_key.is_empty());
        assert_ne!(keygen.keys.public_key, keygen.keys.private_key);
    }
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let keys = client.generate_keys(128).unwrap().keys;

    for message in [MESSAGE, "Hello, world!", "", "🦀 emoji and\nnewlines\t"] {
        let encrypted = client.encrypt(message, &keys.public_key).unwrap();
        assert!(!encrypted.ciphertext.is_empty());
        assert_ne!(encrypted.ciphertext, message);

        let decrypted = client
            .decrypt(&encrypted.ciphertext, &keys.public_key, &keys.private_key)
            .unwrap();
        assert_eq!(decrypted.message, message);
    }
}

#[test]
fn test_sign_and_verify() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let keys = client.generate_keys(256).unwrap().keys;

    let signed = client
        .sign(MESSAGE, &keys.public_key, &keys.private_key)
        .unwrap();
    assert!(!signed.message_signed.is_empty());

    let verify = client
        .verify_signature(MESSAGE, &signed.message_signed, &keys.public_key)
        .unwrap();
    assert!(verify.verified, "Signature should verify correctly");
}

#[test]
fn test_tampered_message_fails_verification() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let keys = client.generate_keys(128).unwrap().keys;

    let signed = client
        .sign("a different message", &keys.public_key, &keys.private_key)
        .unwrap();
    let verify = client
        .verify_signature(MESSAGE, &signed.message_signed, &keys.public_key)
        .unwrap();
    assert!(!verify.verified);
}

#[test]
fn test_signature_from_other_key_fails_verification() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let signer = client.generate_keys(128).unwrap().keys;
    let other = client.generate_keys(128).unwrap().keys;

    let signed = client
        .sign(MESSAGE, &signer.public_key, &signer.private_key)
        .unwrap();
    let verify = client
        .verify_signature(MESSAGE, &signed.message_signed, &other.public_key)
        .unwrap();
    assert!(!verify.verified);
}

#[test]
fn test_end_to_end_reference_run() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let report = client.run(128, MESSAGE).unwrap();

    assert!(!report.keys.public_key.is_empty());
    assert!(!report.keys.private_key.is_empty());
    assert!(!report.ciphertext.is_empty());
    assert_ne!(report.ciphertext, MESSAGE);
    assert_eq!(report.decrypted, MESSAGE);
    assert!(!report.signature.is_empty());
    assert!(report.verified);
}

#[test]
fn test_repeated_runs_differ_but_verify() {
    let client = CryptoServiceClient::new(&spawn_server()).unwrap();
    let first = client.run(128, MESSAGE).unwrap();
    let second = client.run(128, MESSAGE).unwrap();

    assert_ne!(first.keys, second.keys);
    assert_ne!(first.ciphertext, second.ciphertext);
    assert!(first.verified);
    assert!(second.verified);
}

#[test]
fn test_invalid_route_returns_bad_request() {
    let url = format!("{}/nonexistent", spawn_server());
    let resp = reqwest::blocking::get(&url).unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

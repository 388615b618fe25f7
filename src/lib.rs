//! cryptoservice client library
//!
//! Talks to a REST cryptographic service in five dependent steps:
//! - `GET /keygen/{strength}`
//! - `POST /encrypt`
//! - `POST /decrypt`
//! - `POST /sign`
//! - `POST /verify_sign`
//!
//! The request and response records below are shared by the
//! [`client::CryptoServiceClient`] and the reference [`server`].

pub mod client;
pub mod config;
pub mod server;

use serde::{Deserialize, Serialize};

pub use client::{ClientError, CryptoServiceClient, RunReport, Step};

/// Opaque encoded key material. The client never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Body returned by GET /keygen/{strength}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGenResult {
    pub keys: KeyPair,
    pub time_taken: u64,
}

/// Body for POST /encrypt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptRequest {
    pub message: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptResult {
    pub ciphertext: String,
    pub time_taken: u64,
}

/// Body for POST /decrypt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptRequest {
    pub ciphertext: String,
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptResult {
    pub message: String,
    pub time_taken: u64,
}

/// Body for POST /sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub message: String,
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResult {
    pub message_signed: String,
    pub time_taken: u64,
}

/// Body for POST /verify_sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub message_signed: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub verified: bool,
    pub time_taken: u64,
}

//! Key material for the cryptoservice reference service.
//!
//! Wraps secp256k1 (`k256`) so the service can hand keys, ciphertexts and
//! signatures across HTTP as opaque base64 strings:
//!
//! - public key: compressed SEC1 point (33 bytes)
//! - private key: secret scalar (32 bytes)
//! - signature: fixed-size ECDSA signature (64 bytes)
//! - ciphertext: ephemeral public key (33) || nonce (12) || AES-256-GCM output
//!

use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};
use hkdf::Hkdf;
use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::ecdsa::{signature::Signer, signature::Verifier, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::FieldBytes;
use rand_core::OsRng;
use sha2::Sha256;
use thiserror::Error;

const PUBLIC_KEY_LEN: usize = 33;
const PRIVATE_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HKDF_INFO: &[u8] = b"cryptoservice ecies aes-256-gcm";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid base64 in {0}")]
    Encoding(&'static str),
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("private key does not belong to public key")]
    KeyMismatch,
    #[error("ciphertext is malformed")]
    MalformedCiphertext,
    #[error("ciphertext failed authentication")]
    Decryption,
    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

fn decode(field: &'static str, input: &str) -> Result<Vec<u8>, KeyError> {
    general_purpose::STANDARD
        .decode(input)
        .map_err(|_| KeyError::Encoding(field))
}

fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Derives the AES key from an ECDH shared secret, salted with both public points.
fn derive_key(shared: &[u8], ephemeral: &[u8], recipient: &[u8]) -> [u8; 32] {
    let mut salt = Vec::with_capacity(ephemeral.len() + recipient.len());
    salt.extend_from_slice(ephemeral);
    salt.extend_from_slice(recipient);

    let mut okm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(salt.as_slice()), shared)
        .expand(HKDF_INFO, &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}

/// The public half, as sent in `/encrypt` and `/verify_sign` requests.
#[derive(Debug, Clone)]
pub struct PublicKey {
    point: k256::PublicKey,
    verifying_key: VerifyingKey,
    encoded: Vec<u8>,
}

impl PublicKey {
    /// Parse a base64 compressed SEC1 public key
    pub fn from_encoded(public_key: &str) -> Result<Self, KeyError> {
        let bytes = decode("public key", public_key)?;
        let point =
            k256::PublicKey::from_sec1_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self::from_point(point))
    }

    fn from_point(point: k256::PublicKey) -> Self {
        let encoded = point.to_encoded_point(true).as_bytes().to_vec();
        Self {
            point,
            verifying_key: VerifyingKey::from(&point),
            encoded,
        }
    }

    /// Encrypt `message` so that only the matching private key can read it.
    ///
    /// A fresh ephemeral key and nonce are drawn for every call, so encrypting
    /// the same message twice yields different ciphertexts.
    pub fn encrypt(&self, message: &str) -> String {
        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let ephemeral_public = ephemeral.public_key().to_encoded_point(true);
        let shared = ephemeral.diffie_hellman(&self.point);
        let key = derive_key(
            shared.raw_secret_bytes(),
            ephemeral_public.as_bytes(),
            &self.encoded,
        );

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, message.as_bytes())
            .expect("AES-GCM encryption of an in-memory buffer cannot fail");

        let mut out = Vec::with_capacity(PUBLIC_KEY_LEN + NONCE_LEN + sealed.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        encode(&out)
    }

    /// Check a base64 signature over `message`. Anything undecodable is simply not valid.
    pub fn verify(&self, message: &[u8], signature: &str) -> bool {
        let sig_bytes = match general_purpose::STANDARD.decode(signature) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let sig = match Signature::try_from(sig_bytes.as_slice()) {
            Ok(s) => s,
            Err(_) => return false,
        };
        self.verifying_key.verify(message, &sig).is_ok()
    }

    pub fn encoded(&self) -> String {
        encode(&self.encoded)
    }
}

/// Represents a key pair for encryption and signing
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public = PublicKey::from_point(k256::PublicKey::from(signing_key.verifying_key()));

        Self {
            signing_key,
            public,
        }
    }

    /// Rebuild a key pair from its two encoded halves.
    ///
    /// Fails with [`KeyError::KeyMismatch`] if `private_key` does not derive
    /// `public_key`.
    pub fn from_encoded(public_key: &str, private_key: &str) -> Result<Self, KeyError> {
        let public = PublicKey::from_encoded(public_key)?;

        let private_bytes = decode("private key", private_key)?;
        if private_bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeyError::InvalidPrivateKey);
        }
        let signing_key = SigningKey::from_bytes(FieldBytes::from_slice(&private_bytes))
            .map_err(|_| KeyError::InvalidPrivateKey)?;

        if *signing_key.verifying_key() != public.verifying_key {
            return Err(KeyError::KeyMismatch);
        }

        Ok(Self {
            signing_key,
            public,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn public_key_encoded(&self) -> String {
        self.public.encoded()
    }

    pub fn private_key_encoded(&self) -> String {
        encode(&self.signing_key.to_bytes())
    }

    /// Sign `message`, returning the base64 signature
    pub fn sign(&self, message: &[u8]) -> String {
        let sig: Signature = self.signing_key.sign(message);
        encode(&sig.to_bytes())
    }

    /// Decrypt a ciphertext produced by [`PublicKey::encrypt`]
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, KeyError> {
        let bytes = decode("ciphertext", ciphertext)?;
        if bytes.len() < PUBLIC_KEY_LEN + NONCE_LEN + TAG_LEN {
            return Err(KeyError::MalformedCiphertext);
        }
        let (ephemeral_bytes, rest) = bytes.split_at(PUBLIC_KEY_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let ephemeral = k256::PublicKey::from_sec1_bytes(ephemeral_bytes)
            .map_err(|_| KeyError::MalformedCiphertext)?;
        let shared = diffie_hellman(self.signing_key.as_nonzero_scalar(), ephemeral.as_affine());
        let key = derive_key(shared.raw_secret_bytes(), ephemeral_bytes, &self.public.encoded);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| KeyError::Decryption)?;

        String::from_utf8(plain).map_err(|_| KeyError::Utf8)
    }
}

// ----------------------------------------------
//
// Unit tests
//

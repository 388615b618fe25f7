//! Blocking client for the cryptographic service.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::{
    DecryptRequest, DecryptResult, EncryptRequest, EncryptResult, KeyGenResult, KeyPair,
    SignRequest, SignResult, VerifyRequest, VerifyResult,
};

/// One call of the run, in the order they are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GenerateKeys,
    Encrypt,
    Decrypt,
    Sign,
    VerifySignature,
}

impl Step {
    /// 1-based position in the run
    pub fn number(self) -> u8 {
        match self {
            Step::GenerateKeys => 1,
            Step::Encrypt => 2,
            Step::Decrypt => 3,
            Step::Sign => 4,
            Step::VerifySignature => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::GenerateKeys => "keygen",
            Step::Encrypt => "encrypt",
            Step::Decrypt => "decrypt",
            Step::Sign => "sign",
            Step::VerifySignature => "verify_sign",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.name())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{step} failed: transport error: {source}")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },
    #[error("{step} failed: server returned {status}: {body}")]
    Status {
        step: Step,
        status: StatusCode,
        body: String,
    },
    #[error("{step} failed: response does not match schema: {source}")]
    Schema {
        step: Step,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "{} failed: decrypted message {decrypted:?} differs from original {original:?}",
        Step::Decrypt
    )]
    RoundTripMismatch { original: String, decrypted: String },
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// The step the run stopped at
    pub fn step(&self) -> Option<Step> {
        match self {
            ClientError::Transport { step, .. }
            | ClientError::Status { step, .. }
            | ClientError::Schema { step, .. } => Some(*step),
            ClientError::RoundTripMismatch { .. } => Some(Step::Decrypt),
            ClientError::Build(_) => None,
        }
    }
}

/// Everything a completed run produced, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub keys: KeyPair,
    pub ciphertext: String,
    pub decrypted: String,
    pub signature: String,
    pub verified: bool,
    /// Server-reported `time_taken` for each step, indexed like [`Step::number`] - 1
    pub timings: [u64; 5],
}

/// Handle on one HTTP session with the service.
///
/// The underlying connection pool lives as long as the handle and is
/// released when it is dropped.
#[derive(Debug, Clone)]
pub struct CryptoServiceClient {
    http: Client,
    base_url: String,
    verify_round_trip: bool,
}

impl CryptoServiceClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http(base_url, Client::builder())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let mut client = Self::with_http(&config.server_url, builder)?;
        client.verify_round_trip = config.verify_round_trip;
        Ok(client)
    }

    fn with_http(
        base_url: &str,
        builder: reqwest::blocking::ClientBuilder,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: builder.build().map_err(ClientError::Build)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            verify_round_trip: true,
        })
    }

    /// Whether [`run`](Self::run) fails when decryption does not give back the
    /// original message.
    pub fn verify_round_trip(mut self, enabled: bool) -> Self {
        self.verify_round_trip = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the service for a new key pair of the given strength class.
    pub fn generate_keys(&self, strength: u32) -> Result<KeyGenResult, ClientError> {
        let step = Step::GenerateKeys;
        let url = format!("{}/keygen/{}", self.base_url, strength);
        let resp = self
            .http
            .get(&url)
            .send()
            .map_err(|source| ClientError::Transport { step, source })?;
        parse_response(step, resp)
    }

    pub fn encrypt(&self, message: &str, public_key: &str) -> Result<EncryptResult, ClientError> {
        let body = EncryptRequest {
            message: message.to_string(),
            public_key: public_key.to_string(),
        };
        self.post(Step::Encrypt, &body)
    }

    pub fn decrypt(
        &self,
        ciphertext: &str,
        public_key: &str,
        private_key: &str,
    ) -> Result<DecryptResult, ClientError> {
        let body = DecryptRequest {
            ciphertext: ciphertext.to_string(),
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        };
        self.post(Step::Decrypt, &body)
    }

    pub fn sign(
        &self,
        message: &str,
        public_key: &str,
        private_key: &str,
    ) -> Result<SignResult, ClientError> {
        let body = SignRequest {
            message: message.to_string(),
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        };
        self.post(Step::Sign, &body)
    }

    pub fn verify_signature(
        &self,
        message: &str,
        message_signed: &str,
        public_key: &str,
    ) -> Result<VerifyResult, ClientError> {
        let body = VerifyRequest {
            message: message.to_string(),
            message_signed: message_signed.to_string(),
            public_key: public_key.to_string(),
        };
        self.post(Step::VerifySignature, &body)
    }

    /// Runs the full sequence: keygen, encrypt, decrypt, sign, verify.
    ///
    /// Each step feeds the next; the first failure aborts the run. A `false`
    /// verification is reported in [`RunReport::verified`], not as an error.
    ///
    /// # Example
    /// ```no_run
    /// # use cryptoservice::CryptoServiceClient;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = CryptoServiceClient::new("http://127.0.0.1:8080")?;
    /// let report = client.run(128, "哥们你真的逆天啊")?;
    /// println!("verified: {}", report.verified);
    /// # Ok(()) }
    /// ```
    pub fn run(&self, strength: u32, message: &str) -> Result<RunReport, ClientError> {
        let keygen = self.generate_keys(strength)?;
        let keys = keygen.keys;
        info!(
            "{} ok in {}ms: public key {}",
            Step::GenerateKeys,
            keygen.time_taken,
            keys.public_key
        );

        let encrypted = self.encrypt(message, &keys.public_key)?;
        info!(
            "{} ok in {}ms: ciphertext {}",
            Step::Encrypt,
            encrypted.time_taken,
            encrypted.ciphertext
        );

        let decrypted =
            self.decrypt(&encrypted.ciphertext, &keys.public_key, &keys.private_key)?;
        info!(
            "{} ok in {}ms: message {:?}",
            Step::Decrypt,
            decrypted.time_taken,
            decrypted.message
        );
        if self.verify_round_trip && decrypted.message != message {
            return Err(ClientError::RoundTripMismatch {
                original: message.to_string(),
                decrypted: decrypted.message,
            });
        }

        let signed = self.sign(message, &keys.public_key, &keys.private_key)?;
        info!(
            "{} ok in {}ms: signature {}",
            Step::Sign,
            signed.time_taken,
            signed.message_signed
        );

        let verify = self.verify_signature(message, &signed.message_signed, &keys.public_key)?;
        info!(
            "{} ok in {}ms: verified {}",
            Step::VerifySignature,
            verify.time_taken,
            verify.verified
        );

        Ok(RunReport {
            timings: [
                keygen.time_taken,
                encrypted.time_taken,
                decrypted.time_taken,
                signed.time_taken,
                verify.time_taken,
            ],
            keys,
            ciphertext: encrypted.ciphertext,
            decrypted: decrypted.message,
            signature: signed.message_signed,
            verified: verify.verified,
        })
    }

    fn post<B, T>(&self, step: Step, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, step.name());
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|source| ClientError::Transport { step, source })?;
        parse_response(step, resp)
    }
}

/// Successful keygen bodies carry the private key and are never logged.
fn loggable_body(step: Step, status: StatusCode, body: &str) -> &str {
    if step == Step::GenerateKeys && status.is_success() {
        "<keys redacted>"
    } else {
        body
    }
}

/// Checks the status, then deserializes the body into the step's record.
fn parse_response<T: DeserializeOwned>(step: Step, resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|source| ClientError::Transport { step, source })?;
    debug!("{} → {} {}", step, status, loggable_body(step, status, &body));

    if !status.is_success() {
        return Err(ClientError::Status { step, status, body });
    }
    serde_json::from_str(&body).map_err(|source| ClientError::Schema { step, source })
}

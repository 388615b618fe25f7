use axum::{
    Router,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Json, Path},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse},
    routing::{get, post},
};
use chrono::Utc;
use keypair_lib::{KeyError, KeyPair as ServiceKeys, PublicKey};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{error, info};

use crate::{
    DecryptRequest, DecryptResult, EncryptRequest, EncryptResult, KeyGenResult, KeyPair,
    SignRequest, SignResult, VerifyRequest, VerifyResult,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Largest strength class `/keygen` accepts
pub const MAX_STRENGTH: u32 = 4096;

type ErrorResponse = (StatusCode, JsonResponse<Value>);
type HandlerResult<T> = Result<JsonResponse<T>, ErrorResponse>;

fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, JsonResponse(json!({ "error": message.into() })))
}

/// Unparseable path segment, e.g. `/keygen/abc`. Keeps axum's status, swaps the body for JSON.
fn path_rejection(rejection: PathRejection) -> ErrorResponse {
    error!("{} Rejected path: {}", Utc::now().to_rfc3339(), rejection.body_text());
    error_response(rejection.status(), rejection.body_text())
}

/// Missing content type, bad JSON or a body missing required fields.
fn json_rejection(rejection: JsonRejection) -> ErrorResponse {
    error!("{} Rejected body: {}", Utc::now().to_rfc3339(), rejection.body_text());
    error_response(rejection.status(), rejection.body_text())
}

/// Maps key-material problems to the status the caller should see.
fn key_error_response(err: KeyError) -> ErrorResponse {
    let status = match err {
        KeyError::MalformedCiphertext | KeyError::Decryption | KeyError::Utf8 => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::BAD_REQUEST,
    };
    error!("{} Rejected request: {}", Utc::now().to_rfc3339(), err);
    error_response(status, err.to_string())
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// A strength is a positive multiple of 64, at most [`MAX_STRENGTH`].
pub fn is_supported_strength(strength: u32) -> bool {
    strength > 0 && strength % 64 == 0 && strength <= MAX_STRENGTH
}

/// Builds the router serving the five endpoints
pub fn router() -> Router {
    Router::new()
        .route("/keygen/:strength", get(handle_keygen))
        .route("/encrypt", post(handle_encrypt))
        .route("/decrypt", post(handle_decrypt))
        .route("/sign", post(handle_sign))
        .route("/verify_sign", post(handle_verify_sign))
        .fallback(fallback_handler)
}

/// Binds `addr` and serves until the process exits
pub async fn run_server(addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    run_server_with_listener(listener).await
}

/// Runs the server with a provided listener (useful for tests with ephemeral ports)
pub async fn run_server_with_listener(
    listener: tokio::net::TcpListener,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    info!("cryptoservice reference service starting on {}", addr);

    axum::serve(listener, router()).await?;
    Ok(())
}

/// GET /keygen/{strength} → fresh key pair
async fn handle_keygen(strength: Result<Path<u32>, PathRejection>) -> HandlerResult<KeyGenResult> {
    let Path(strength) = strength.map_err(path_rejection)?;
    let now = Utc::now();
    if !is_supported_strength(strength) {
        error!("{} Request: GET /keygen/{} → unsupported strength", now.to_rfc3339(), strength);
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "unsupported strength {strength}: expected a multiple of 64 up to {MAX_STRENGTH}"
            ),
        ));
    }

    let start = Instant::now();
    let keys = ServiceKeys::generate();
    let resp = KeyGenResult {
        keys: KeyPair {
            public_key: keys.public_key_encoded(),
            private_key: keys.private_key_encoded(),
        },
        time_taken: elapsed_ms(start),
    };

    info!(
        "{} Request: GET /keygen/{} → responding with public key {}",
        now.to_rfc3339(),
        strength,
        resp.keys.public_key
    );
    Ok(JsonResponse(resp))
}

/// POST /encrypt
async fn handle_encrypt(
    payload: Result<Json<EncryptRequest>, JsonRejection>,
) -> HandlerResult<EncryptResult> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let now = Utc::now();
    let start = Instant::now();
    let public_key = PublicKey::from_encoded(&payload.public_key).map_err(key_error_response)?;
    let ciphertext = public_key.encrypt(&payload.message);
    let time_taken = elapsed_ms(start);

    info!(
        "{} Request: POST /encrypt message='{}' → ciphertext='{}'",
        now.to_rfc3339(),
        payload.message,
        ciphertext
    );
    Ok(JsonResponse(EncryptResult {
        ciphertext,
        time_taken,
    }))
}

/// POST /decrypt
async fn handle_decrypt(
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> HandlerResult<DecryptResult> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let now = Utc::now();
    let start = Instant::now();
    let keys = ServiceKeys::from_encoded(&payload.public_key, &payload.private_key)
        .map_err(key_error_response)?;
    let message = keys.decrypt(&payload.ciphertext).map_err(key_error_response)?;
    let time_taken = elapsed_ms(start);

    info!(
        "{} Request: POST /decrypt ciphertext='{}' → message='{}'",
        now.to_rfc3339(),
        payload.ciphertext,
        message
    );
    Ok(JsonResponse(DecryptResult {
        message,
        time_taken,
    }))
}

/// POST /sign
async fn handle_sign(
    payload: Result<Json<SignRequest>, JsonRejection>,
) -> HandlerResult<SignResult> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let now = Utc::now();
    let start = Instant::now();
    let keys = ServiceKeys::from_encoded(&payload.public_key, &payload.private_key)
        .map_err(key_error_response)?;
    let message_signed = keys.sign(payload.message.as_bytes());
    let time_taken = elapsed_ms(start);

    info!(
        "{} Request: POST /sign message='{}' → response sig='{}'",
        now.to_rfc3339(),
        payload.message,
        message_signed
    );
    Ok(JsonResponse(SignResult {
        message_signed,
        time_taken,
    }))
}

/// POST /verify_sign
async fn handle_verify_sign(
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> HandlerResult<VerifyResult> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let now = Utc::now();
    let start = Instant::now();
    let public_key = PublicKey::from_encoded(&payload.public_key).map_err(key_error_response)?;
    let verified = public_key.verify(payload.message.as_bytes(), &payload.message_signed);
    let time_taken = elapsed_ms(start);

    info!(
        "{} Request: POST /verify_sign message='{}' → verified={}",
        now.to_rfc3339(),
        payload.message,
        verified
    );
    Ok(JsonResponse(VerifyResult {
        verified,
        time_taken,
    }))
}

/// Fallback for any unsupported route
async fn fallback_handler() -> impl IntoResponse {
    let now = Utc::now();
    error!("{} Invalid request, returning 400", now.to_rfc3339());
    (StatusCode::BAD_REQUEST, "Invalid request")
}

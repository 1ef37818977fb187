// Cryptographic utility functions and session token construction

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::{
    constant_time::verify_slices_are_equal,
    digest, hmac,
    rand::{SecureRandom, SystemRandom},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

// Errors surfaced by session token signing and verification.
//
// `Malformed`, `InvalidSignature` and `Expired` are deliberately distinct:
// callers map all three to an unauthorized response but log them
// differently.
#[derive(Debug, PartialEq)]
pub enum TokenError {
    Malformed,
    InvalidSignature,
    Expired,
    Serialization(String),
    Rng,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::InvalidSignature => write!(f, "invalid token signature"),
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Serialization(msg) => write!(f, "failed to serialize token part: {}", msg),
            TokenError::Rng => write!(f, "system randomness unavailable"),
        }
    }
}

// Constant header of every session token
#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

const TOKEN_HEADER: TokenHeader = TokenHeader {
    alg: "HS256",
    typ: "JWT",
};

// Minimal view of a token payload used for the expiry check, before the
// payload is handed back as the caller's claims type.
#[derive(Deserialize)]
struct ExpiryProbe {
    exp: Option<u64>,
}

// Retrieves current Unix timestamp in seconds
pub fn get_current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// Computes single-pass SHA256 hash of input data
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let hash = digest::digest(&digest::SHA256, input);
    let mut result = [0u8; 32];
    result.copy_from_slice(hash.as_ref());
    result
}

// Computes HMAC-SHA256 of `data` under `key`
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, data);
    let mut result = [0u8; 32];
    result.copy_from_slice(tag.as_ref());
    result
}

// Constant-time equality, to prevent timing attacks on signature checks
pub fn verify_eq(a: &[u8], b: &[u8]) -> bool {
    verify_slices_are_equal(a, b).is_ok()
}

pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // writing to a String cannot fail
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

// Generates an opaque single-use token with 256 bits of entropy,
// hex-encoded (64 characters)
pub fn generate_opaque_token() -> Result<String, TokenError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes).map_err(|_| TokenError::Rng)?;
    Ok(encode_hex(&bytes))
}

// Signs a claims payload into a compact session token
//
// Flow:
// 1. Serialize the constant header and the payload to JSON
// 2. Encode both in URL-safe base64 without padding
// 3. Sign `header.payload` with HMAC-SHA256 under the server secret
// 4. Concatenate `header.payload.signature`
//
// The resulting token is self-contained: later validation needs only the
// secret, no server-side session state.
pub fn sign_claims<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String, TokenError> {
    let header_json = serde_json::to_vec(&TOKEN_HEADER)
        .map_err(|e| TokenError::Serialization(e.to_string()))?;
    let payload_json =
        serde_json::to_vec(claims).map_err(|e| TokenError::Serialization(e.to_string()))?;

    let encoded_header = URL_SAFE_NO_PAD.encode(header_json);
    let encoded_payload = URL_SAFE_NO_PAD.encode(payload_json);

    let signing_input = format!("{}.{}", encoded_header, encoded_payload);
    let signature = hmac_sha256(secret, signing_input.as_bytes());

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

// Verifies a session token against `secret` and parses its payload.
//
// The token must split into exactly three non-empty dot-separated parts.
// The signature is recomputed over `header.payload` and compared in
// constant time; only then is the payload decoded and the `exp` claim
// checked against `now` (Unix seconds). Any decode or parse failure is a
// rejection, never a pass-through.
pub fn verify_claims<T: DeserializeOwned>(
    token: &str,
    secret: &[u8],
    now: u64,
) -> Result<T, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [encoded_header, encoded_payload, encoded_signature] = parts[..] else {
        return Err(TokenError::Malformed);
    };
    if encoded_header.is_empty() || encoded_payload.is_empty() || encoded_signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let claimed_signature = URL_SAFE_NO_PAD
        .decode(encoded_signature)
        .map_err(|_| TokenError::Malformed)?;

    let signing_input = format!("{}.{}", encoded_header, encoded_payload);
    let expected_signature = hmac_sha256(secret, signing_input.as_bytes());
    if !verify_eq(&expected_signature, &claimed_signature) {
        return Err(TokenError::InvalidSignature);
    }

    let payload_json = URL_SAFE_NO_PAD
        .decode(encoded_payload)
        .map_err(|_| TokenError::Malformed)?;

    let probe: ExpiryProbe =
        serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;
    if let Some(exp) = probe.exp {
        if now > exp {
            return Err(TokenError::Expired);
        }
    }

    serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)
}

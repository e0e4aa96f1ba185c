// ABOUTME: PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
// ABOUTME: Generates code verifiers and SHA256 challenges for the interactive login

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::PkceChallenge,
};

const VERIFIER_LENGTH: usize = 64;

/// Generate a verifier/challenge pair per RFC 7636 using the S256 method
pub fn generate_pkce_challenge() -> AuthResult<PkceChallenge> {
    let code_verifier = generate_code_verifier(VERIFIER_LENGTH)?;
    let code_challenge = code_challenge_for(&code_verifier);

    Ok(PkceChallenge {
        code_verifier,
        code_challenge,
        code_challenge_method: "S256".to_string(),
    })
}

fn generate_code_verifier(length: usize) -> AuthResult<String> {
    if !(43..=128).contains(&length) {
        return Err(AuthError::Pkce(format!(
            "Invalid code verifier length: {}",
            length
        )));
    }

    Ok(rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}

/// Base64url (unpadded) SHA256 of the verifier
pub fn code_challenge_for(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

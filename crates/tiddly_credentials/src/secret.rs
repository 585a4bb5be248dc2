//! Password hashing and random tokens.

use crate::error::{CredentialError, CredentialResult};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a remember token or pepper.
pub const TOKEN_BYTES: usize = 32;

/// Longest password + pepper input bcrypt reads in full.
pub const MAX_HASH_INPUT: usize = 72;

/// Generates a remember token: 32 bytes from the OS RNG, URL-safe base64.
pub fn generate_token() -> CredentialResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CredentialError::random(e.to_string()))?;
    Ok(URL_SAFE.encode(bytes))
}

/// Generates a new pepper. Same shape as a remember token.
pub fn generate_pepper() -> CredentialResult<String> {
    generate_token()
}

/// Hashes `password` with the pepper appended.
///
/// # Errors
///
/// `InvalidInput` when password and pepper together exceed
/// [`MAX_HASH_INPUT`] bytes; bcrypt would silently drop the excess.
pub fn hash_password(password: &str, pepper: &str, cost: u32) -> CredentialResult<String> {
    let input = peppered(password, pepper);
    if input.len() > MAX_HASH_INPUT {
        return Err(CredentialError::invalid_input(format!(
            "password and pepper are {} bytes, at most {MAX_HASH_INPUT} are allowed",
            input.len()
        )));
    }
    Ok(bcrypt::hash(input, cost)?)
}

/// Checks `password` + pepper against a stored bcrypt hash.
///
/// Input longer than [`MAX_HASH_INPUT`] bytes never matches, since no hash
/// can have been made from it.
pub fn verify_password(password: &str, pepper: &str, hash: &str) -> CredentialResult<bool> {
    let input = peppered(password, pepper);
    if input.len() > MAX_HASH_INPUT {
        return Ok(false);
    }
    Ok(bcrypt::verify(input, hash)?)
}

fn peppered(password: &str, pepper: &str) -> String {
    let mut input = String::with_capacity(password.len() + pepper.len());
    input.push_str(password);
    input.push_str(pepper);
    input
}

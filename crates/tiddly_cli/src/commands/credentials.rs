//! Pepper, password and user-file commands.

use std::error::Error;
use tiddly_credentials::{CredentialConfig, CredentialStore};
use tracing::info;

/// Prints a new random pepper.
pub fn pepper() -> Result<(), Box<dyn Error>> {
    println!("{}", tiddly_credentials::generate_pepper()?);
    Ok(())
}

/// Prints the bcrypt hash of `password` + `pepper`.
pub fn hash_password(password: &str, pepper: &str, cost: u32) -> Result<(), Box<dyn Error>> {
    if password.is_empty() {
        return Err("password must not be empty".into());
    }
    println!("{}", tiddly_credentials::hash_password(password, pepper, cost)?);
    Ok(())
}

/// Writes a user into the user file of `config.dir`.
///
/// Takes either a ready hash or a plain password; the password is hashed
/// with the configured pepper.
pub fn add_user(
    config: CredentialConfig,
    email: &str,
    hash: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let store = CredentialStore::new(config);

    let hash = match (hash, password) {
        (Some(hash), _) => hash,
        (None, Some(password)) => {
            if store.config().pepper.is_empty() {
                return Err("no pepper configured; pass --hash or create a configuration file".into());
            }
            store.hash_password(&password)?
        }
        (None, None) => return Err("either --hash or --password is required".into()),
    };

    let user = store.add_user(email, &hash)?;
    info!(email = %user.email, path = %store.config().users_path().display(), "user written");
    println!("Saved {} to {}", user.email, store.config().users_path().display());
    Ok(())
}

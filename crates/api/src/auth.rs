//! Password login and opaque bearer sessions.
//!
//! Tokens are 32 random bytes, base64url-encoded, held in an in-process
//! session table with a TTL. Nothing about the token is self-describing;
//! a restart invalidates all sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Identity;
use ledger::{LedgerError, LedgerStore};
use rand::RngCore;
use thiserror::Error;

const TOKEN_BYTES: usize = 32;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately indistinct.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The stored password hash could not be parsed.
    #[error("Malformed password hash for user")]
    MalformedHash,

    /// Ledger store failure during user lookup.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

struct Session {
    identity: Identity,
    expires_at: Instant,
}

/// Verifies credentials against the ledger's user table and manages
/// bearer sessions.
pub struct AuthService<L: LedgerStore> {
    ledger: L,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl<L: LedgerStore> AuthService<L> {
    /// Creates a new auth service with the given session TTL.
    pub fn new(ledger: L, ttl: Duration) -> Self {
        Self {
            ledger,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Verifies a username/password pair and issues a bearer token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .ledger
            .find_user(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!(username, error = %e, "stored password hash is malformed");
            AuthError::MalformedHash
        })?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let token = generate_token();
        let identity = Identity::new(user.username, user.national_id);
        self.sessions.write().unwrap().insert(
            token.clone(),
            Session {
                identity,
                expires_at: Instant::now() + self.ttl,
            },
        );

        tracing::info!(username, "login succeeded");
        Ok(token)
    }

    /// Resolves a bearer token to the identity it was issued for.
    ///
    /// Expired sessions are dropped on lookup.
    pub fn authenticate(&self, token: &str) -> Option<Identity> {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get(token) {
            Some(session) if session.expires_at > Instant::now() => {
                Some(session.identity.clone())
            }
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hashes a password with argon2 and a fresh random salt. Used when
/// seeding users.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

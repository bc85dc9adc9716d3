//! Accounts: registration, credential checks, preferences and the local
//! session file that remembers who is signed in between CLI invocations.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::models::{Preferences, User};
use crate::storage::Store;

pub const MIN_PASSWORD_LEN: usize = 6;
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Creates a user with default preferences.
pub fn register(store: &Store, input: &RegisterInput, now: DateTime<Utc>) -> Result<User> {
    let username = input.username.trim();
    let email = input.email.trim();

    if username.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(PlanError::validation("username, email and password are all required"));
    }
    if input.password != input.confirm_password {
        return Err(PlanError::validation("passwords do not match"));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PlanError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !email.contains('@') {
        return Err(PlanError::validation("email address is not valid"));
    }
    if store.username_taken(username)? {
        return Err(PlanError::validation(format!("username '{username}' is already taken")));
    }
    if store.email_taken(email)? {
        return Err(PlanError::validation(format!("email '{email}' is already registered")));
    }

    let hash = hash_password(&input.password)?;
    let user = store.insert_user(username, email, &hash, &Preferences::default(), now)?;
    info!(user_id = user.id, username = %user.username, "Registered user");
    Ok(user)
}

/// Checks credentials. Unknown users and wrong passwords fail identically.
pub fn login(store: &Store, login: &str, password: &str) -> Result<User> {
    let invalid = || PlanError::Auth("invalid username or password".to_string());
    let user = store.user_by_login(login.trim())?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash) {
        debug!(user_id = user.id, "Password verification failed");
        return Err(invalid());
    }
    info!(user_id = user.id, "User signed in");
    Ok(user)
}

pub fn update_preferences(store: &Store, user_id: i64, preferences: &Preferences) -> Result<User> {
    if preferences.day_start >= preferences.day_end {
        return Err(PlanError::validation("day start must be before day end"));
    }
    let window = preferences.window_minutes();
    if preferences.max_daily_minutes == 0 || preferences.max_daily_minutes > window {
        return Err(PlanError::validation(format!(
            "max daily minutes must be between 1 and {window} for this window"
        )));
    }
    if !store.update_preferences(user_id, preferences)? {
        return Err(PlanError::not_found("user", user_id));
    }
    store.user(user_id)?.ok_or_else(|| PlanError::not_found("user", user_id))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PlanError::Auth(format!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// The signed-in user, persisted next to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
}

pub fn session_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map(|dir| dir.join(SESSION_FILE))
        .unwrap_or_else(|| PathBuf::from(SESSION_FILE))
}

pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)?;
    Ok(())
}

/// Returns `None` when nobody is signed in.
pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn clear_session(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_file(path)?;
        return Ok(true);
    }
    Ok(false)
}

/// Resolves the session to a stored user.
pub fn current_user(store: &Store, session_file: &Path) -> Result<User> {
    let session = load_session(session_file)?
        .ok_or_else(|| PlanError::Auth("not signed in; run `planwise login` first".to_string()))?;
    store
        .user(session.user_id)?
        .ok_or_else(|| PlanError::Auth("session refers to a missing user; sign in again".to_string()))
}

//! Environment fixture: base URL and the pre-registered test account.
//!
//! Loaded once before any case runs and shared read-only. A `.env` file
//! in the working directory (or a parent) is honoured; real environment
//! variables take precedence over it.

use crate::result::{ShopError, ShopResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Base URL of the shop under test
pub const ENV_BASE_URL: &str = "BASE_URL";
/// Email of the pre-registered account
pub const ENV_TEST_EMAIL: &str = "TEST_EMAIL";
/// Password of the pre-registered account
pub const ENV_TEST_PASSWORD: &str = "TEST_PASSWORD";
/// First name of the pre-registered account
pub const ENV_TEST_USER_NAME: &str = "TEST_USER_NAME";
/// Last name of the pre-registered account
pub const ENV_TEST_USER_LASTNAME: &str = "TEST_USER_LASTNAME";

/// All variables a run requires, in reporting order
pub const REQUIRED_VARIABLES: [&str; 5] = [
    ENV_BASE_URL,
    ENV_TEST_EMAIL,
    ENV_TEST_PASSWORD,
    ENV_TEST_USER_NAME,
    ENV_TEST_USER_LASTNAME,
];

/// Login credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl UserCredentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Registration form contents
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationData {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
}

impl RegistrationData {
    /// Registration where the confirmation equals the password
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            confirm_password: password.clone(),
            password,
        }
    }

    /// All fields blank
    #[must_use]
    pub fn empty() -> Self {
        Self::new("", "", "", "")
    }

    /// Override the confirmation
    #[must_use]
    pub fn with_confirm_password(mut self, confirm: impl Into<String>) -> Self {
        self.confirm_password = confirm.into();
        self
    }
}

impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Read-only run fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Base URL every relative path resolves against
    pub base_url: String,
    /// Pre-registered account credentials
    pub credentials: UserCredentials,
    /// Pre-registered account first name
    pub first_name: String,
    /// Pre-registered account last name
    pub last_name: String,
}

impl Fixture {
    /// Load from the process environment, after applying `.env` if present
    ///
    /// # Errors
    ///
    /// Returns `FixtureMissing` naming the first absent or blank variable
    pub fn from_env() -> ShopResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns `FixtureMissing` naming the first absent or blank variable
    pub fn from_lookup<F>(lookup: F) -> ShopResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ShopError::FixtureMissing {
                    variable: name.to_string(),
                })
        };
        Ok(Self {
            base_url: get(ENV_BASE_URL)?,
            credentials: UserCredentials::new(get(ENV_TEST_EMAIL)?, get(ENV_TEST_PASSWORD)?),
            first_name: get(ENV_TEST_USER_NAME)?,
            last_name: get(ENV_TEST_USER_LASTNAME)?,
        })
    }

    /// Names of every absent or blank required variable
    #[must_use]
    pub fn missing_variables<F>(lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        REQUIRED_VARIABLES
            .into_iter()
            .filter(|name| lookup(name).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }

    /// Registration data for the pre-registered account
    #[must_use]
    pub fn registration(&self) -> RegistrationData {
        RegistrationData::new(
            self.first_name.clone(),
            self.last_name.clone(),
            self.credentials.email.clone(),
            self.credentials.password.clone(),
        )
    }
}

static EMAIL_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Email unique within and across runs: `{prefix}{millis}{seq}@example.com`
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = EMAIL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{millis}{seq}@example.com")
}

//! Built-in suites for the shop's authentication flows.

mod login;
mod register;

pub use login::{login_suite, INVALID_LOGIN_EMAILS};
pub use register::{register_suite, SCRIPT_INJECTION};

use crate::harness::TestSuite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which built-in suite to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteSelection {
    /// Login and registration
    #[default]
    All,
    /// Login only
    Login,
    /// Registration only
    Register,
}

impl SuiteSelection {
    /// Build the selected suite
    #[must_use]
    pub fn build(self) -> TestSuite {
        match self {
            Self::Login => login_suite(),
            Self::Register => register_suite(),
            Self::All => {
                let mut suite = TestSuite::new("all");
                suite.extend(login_suite());
                suite.extend(register_suite());
                suite
            }
        }
    }

    /// Selection name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Login => "login",
            Self::Register => "register",
        }
    }
}

impl fmt::Display for SuiteSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiteSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "login" => Ok(Self::Login),
            "register" => Ok(Self::Register),
            other => Err(format!("unknown suite '{other}' (expected all, login or register)")),
        }
    }
}

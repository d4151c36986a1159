//! Page Object Model
//!
//! A page object binds a fixed set of locators to a session and exposes the
//! user-level actions of one page. Actions never return a verdict; outcome
//! checks belong to expectations.
//!
//! Construction never touches the browser, so it cannot fail even when the
//! page has not been loaded yet.

mod login;
mod register;

pub use login::{LoginLocators, LoginPage};
pub use register::{RegisterLocators, RegisterPage};

use crate::assertion::retry::RetryConfig;
use crate::locator::Locator;
use crate::result::ShopResult;
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A page or component of the shop under test
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Canonical path of the page (`/login`)
    fn path(&self) -> &'static str;

    /// Session the page drives
    fn session(&self) -> &dyn Session;

    /// Page name for logs and listings
    fn page_name(&self) -> &'static str;

    /// Logical field name to locator, in declaration order
    fn locator_table(&self) -> Vec<(&'static str, &Locator)>;

    /// Navigate to the page's canonical path
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if the navigation does not complete
    async fn navigate(&self) -> ShopResult<()> {
        tracing::debug!(page = self.page_name(), path = self.path(), "navigate");
        self.session().goto(self.path()).await
    }
}

/// Printable description of one page locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorDescription {
    /// Logical field name
    pub field: String,
    /// Selector kind (`by-id`, `by-attribute`, `by-text`)
    pub kind: String,
    /// Rendered selector
    pub selector: String,
}

/// Printable description of a page object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescription {
    /// Page name
    pub name: String,
    /// Canonical path
    pub path: String,
    /// Locators in declaration order
    pub locators: Vec<LocatorDescription>,
}

fn describe(name: &str, path: &str, table: &[(&'static str, &Locator)]) -> PageDescription {
    PageDescription {
        name: name.to_string(),
        path: path.to_string(),
        locators: table
            .iter()
            .map(|(field, loc)| LocatorDescription {
                field: (*field).to_string(),
                kind: loc.selector().kind().to_string(),
                selector: loc.selector().to_string(),
            })
            .collect(),
    }
}

/// Describe every page object without opening a session
#[must_use]
pub fn catalogue() -> Vec<PageDescription> {
    let wait = RetryConfig::default();
    vec![
        describe(
            login::PAGE_NAME,
            login::PATH,
            &LoginLocators::new(wait).table(),
        ),
        describe(
            register::PAGE_NAME,
            register::PATH,
            &RegisterLocators::new(wait).table(),
        ),
    ]
}

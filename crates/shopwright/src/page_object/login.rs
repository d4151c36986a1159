//! Login page (`/login`).

use super::PageObject;
use crate::assertion::retry::RetryConfig;
use crate::locator::{AttributeSelector, Locator};
use crate::messages;
use crate::result::ShopResult;
use crate::session::Session;
use std::sync::Arc;

pub(super) const PATH: &str = "/login";
pub(super) const PAGE_NAME: &str = "LoginPage";

/// Locators of the login page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLocators {
    /// `#Email`
    pub email_input: Locator,
    /// `#Password`
    pub password_input: Locator,
    /// `input.login-button[type="submit"]`
    pub submit_button: Locator,
    /// "Log out" link, present only while authenticated
    pub logout_text: Locator,
    /// Login summary error
    pub unsuccessful_login_message: Locator,
    /// Unknown account error
    pub no_customer_found_message: Locator,
    /// Email field validation message
    pub email_error: Locator,
    /// Notice on revisiting the page while authenticated
    pub already_logged_in_message: Locator,
}

impl LoginLocators {
    /// Build the locators with a shared wait policy
    #[must_use]
    pub fn new(wait: RetryConfig) -> Self {
        let at = |loc: Locator| loc.with_wait(wait);
        Self {
            email_input: at(Locator::by_id("Email")),
            password_input: at(Locator::by_id("Password")),
            submit_button: at(Locator::new(
                AttributeSelector::tag("input")
                    .with_class("login-button")
                    .with_attribute("type", "submit"),
            )),
            logout_text: at(Locator::by_text(messages::LOG_OUT)),
            unsuccessful_login_message: at(Locator::by_text(messages::LOGIN_UNSUCCESSFUL)),
            no_customer_found_message: at(Locator::by_text(messages::NO_CUSTOMER_FOUND)),
            email_error: at(Locator::new(
                AttributeSelector::any()
                    .with_attribute("data-valmsg-for", "Email")
                    .descendant("span"),
            )),
            already_logged_in_message: at(Locator::by_text(messages::ALREADY_LOGGED_IN)),
        }
    }

    /// Field name to locator, in declaration order
    #[must_use]
    pub fn table(&self) -> Vec<(&'static str, &Locator)> {
        vec![
            ("email_input", &self.email_input),
            ("password_input", &self.password_input),
            ("submit_button", &self.submit_button),
            ("logout_text", &self.logout_text),
            ("unsuccessful_login_message", &self.unsuccessful_login_message),
            ("no_customer_found_message", &self.no_customer_found_message),
            ("email_error", &self.email_error),
            ("already_logged_in_message", &self.already_logged_in_message),
        ]
    }
}

/// Login page bound to a session
#[derive(Clone)]
pub struct LoginPage {
    session: Arc<dyn Session>,
    locators: LoginLocators,
}

impl std::fmt::Debug for LoginPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPage")
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl LoginPage {
    /// Bind to `session` with the default wait policy
    #[must_use]
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self::with_wait(session, RetryConfig::default())
    }

    /// Bind to `session` with a custom wait policy
    #[must_use]
    pub fn with_wait(session: Arc<dyn Session>, wait: RetryConfig) -> Self {
        Self {
            session,
            locators: LoginLocators::new(wait),
        }
    }

    /// Page locators
    #[must_use]
    pub const fn locators(&self) -> &LoginLocators {
        &self.locators
    }

    /// Fill email, then password
    ///
    /// # Errors
    ///
    /// Returns error if either field cannot be resolved or filled
    pub async fn fill_credentials(&self, email: &str, password: &str) -> ShopResult<()> {
        let session = self.session.as_ref();
        self.locators.email_input.fill(session, email).await?;
        self.locators.password_input.fill(session, password).await
    }

    /// Wait for the submit button to be visible, then click it
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the button never becomes visible
    pub async fn submit(&self) -> ShopResult<()> {
        let session = self.session.as_ref();
        let _ = self.locators.submit_button.wait_for_visible(session).await?;
        self.locators.submit_button.click(session).await
    }

    /// Fill credentials and submit
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<()> {
        self.fill_credentials(email, password).await?;
        self.submit().await
    }
}

impl PageObject for LoginPage {
    fn path(&self) -> &'static str {
        PATH
    }

    fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    fn page_name(&self) -> &'static str {
        PAGE_NAME
    }

    fn locator_table(&self) -> Vec<(&'static str, &Locator)> {
        self.locators.table()
    }
}

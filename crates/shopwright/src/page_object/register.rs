//! Registration page (`/register`).

use super::PageObject;
use crate::assertion::retry::{AssertionCheckResult, RetryAssertion, RetryConfig};
use crate::fixture::RegistrationData;
use crate::locator::{AttributeSelector, Locator};
use crate::messages;
use crate::result::{ShopError, ShopResult};
use crate::session::{Interaction, Session};
use std::sync::Arc;

pub(super) const PATH: &str = "/register";
pub(super) const PAGE_NAME: &str = "RegisterPage";

fn validation_message(field: &str) -> Locator {
    Locator::new(
        AttributeSelector::any()
            .with_attribute("data-valmsg-for", field)
            .descendant("span"),
    )
}

/// Locators of the registration page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLocators {
    /// `#gender-male`
    pub gender_male: Locator,
    /// `#FirstName`
    pub first_name: Locator,
    /// `#LastName`
    pub last_name: Locator,
    /// `#Email`
    pub email: Locator,
    /// `#Password`
    pub password: Locator,
    /// `#ConfirmPassword`
    pub confirm_password: Locator,
    /// `input#register-button[type="submit"]`
    pub register_button: Locator,
    /// Success notice
    pub success_message: Locator,
    /// `.message-error` summary (existing account)
    pub email_exists_error: Locator,
    /// First name validation message
    pub first_name_error: Locator,
    /// Last name validation message
    pub last_name_error: Locator,
    /// Email validation message
    pub email_error: Locator,
    /// Password validation message
    pub password_error: Locator,
    /// Confirmation validation message (also reports a mismatch)
    pub confirm_password_error: Locator,
}

impl RegisterLocators {
    /// Build the locators with a shared wait policy
    #[must_use]
    pub fn new(wait: RetryConfig) -> Self {
        let at = |loc: Locator| loc.with_wait(wait);
        Self {
            gender_male: at(Locator::by_id("gender-male")),
            first_name: at(Locator::by_id("FirstName")),
            last_name: at(Locator::by_id("LastName")),
            email: at(Locator::by_id("Email")),
            password: at(Locator::by_id("Password")),
            confirm_password: at(Locator::by_id("ConfirmPassword")),
            register_button: at(Locator::new(
                AttributeSelector::tag("input")
                    .with_id("register-button")
                    .with_attribute("type", "submit"),
            )),
            success_message: at(Locator::by_text(messages::REGISTRATION_COMPLETED)),
            email_exists_error: at(Locator::new(
                AttributeSelector::any().with_class("message-error"),
            )),
            first_name_error: at(validation_message("FirstName")),
            last_name_error: at(validation_message("LastName")),
            email_error: at(validation_message("Email")),
            password_error: at(validation_message("Password")),
            confirm_password_error: at(validation_message("ConfirmPassword")),
        }
    }

    /// Field name to locator, in declaration order
    #[must_use]
    pub fn table(&self) -> Vec<(&'static str, &Locator)> {
        vec![
            ("gender_male", &self.gender_male),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("password", &self.password),
            ("confirm_password", &self.confirm_password),
            ("register_button", &self.register_button),
            ("success_message", &self.success_message),
            ("email_exists_error", &self.email_exists_error),
            ("first_name_error", &self.first_name_error),
            ("last_name_error", &self.last_name_error),
            ("email_error", &self.email_error),
            ("password_error", &self.password_error),
            ("confirm_password_error", &self.confirm_password_error),
        ]
    }
}

/// Registration page bound to a session
#[derive(Clone)]
pub struct RegisterPage {
    session: Arc<dyn Session>,
    locators: RegisterLocators,
}

impl std::fmt::Debug for RegisterPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterPage")
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl RegisterPage {
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
            locators: RegisterLocators::new(wait),
        }
    }

    /// Page locators
    #[must_use]
    pub const fn locators(&self) -> &RegisterLocators {
        &self.locators
    }

    /// Same locator as `confirm_password_error`
    #[must_use]
    pub const fn password_mismatch_error(&self) -> &Locator {
        &self.locators.confirm_password_error
    }

    /// Select gender, fill every field in form order, then click register
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; later steps are skipped
    pub async fn register(&self, data: &RegistrationData) -> ShopResult<()> {
        self.fill_form(data).await?;
        self.locators.register_button.click(self.session.as_ref()).await
    }

    /// Register, then wait until the shop has answered the submission.
    ///
    /// The form counts as answered once the submitted document is gone
    /// (replaced or navigated away from) or any outcome message is shown.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, or `AssertionTimeout` on the
    /// register button if the submitted form stays untouched
    pub async fn register_and_await_response(&self, data: &RegistrationData) -> ShopResult<()> {
        let session = self.session.as_ref();
        let button = &self.locators.register_button;
        self.fill_form(data).await?;
        let submitted = button.resolve(session).await?;
        session.interact(&submitted, Interaction::Click).await?;

        let wait = *button.wait();
        let page = self;
        let generation = submitted.generation;
        let outcome = RetryAssertion::new(wait)
            .with_description("registration response")
            .verify(move || async move {
                Ok(if page.has_responded(generation).await? {
                    AssertionCheckResult::Pass
                } else {
                    AssertionCheckResult::Fail("submitted form unchanged".to_string())
                })
            })
            .await?;
        outcome.map(|_| ()).map_err(|err| ShopError::AssertionTimeout {
            selector: button.selector().to_string(),
            expected: "to be answered by the shop".to_string(),
            actual: err.message,
            attempts: err.attempts,
            timeout_ms: wait.timeout_ms(),
        })
    }

    async fn fill_form(&self, data: &RegistrationData) -> ShopResult<()> {
        let session = self.session.as_ref();
        let l = &self.locators;
        l.gender_male.click(session).await?;
        l.first_name.fill(session, &data.first_name).await?;
        l.last_name.fill(session, &data.last_name).await?;
        l.email.fill(session, &data.email).await?;
        l.password.fill(session, &data.password).await?;
        l.confirm_password
            .fill(session, &data.confirm_password)
            .await
    }

    async fn has_responded(&self, submitted_generation: u64) -> ShopResult<bool> {
        let session = self.session.as_ref();
        let l = &self.locators;
        match l.register_button.probe(session).await? {
            Some(button) if button.generation == submitted_generation => {}
            _ => return Ok(true),
        }
        for message in [
            &l.success_message,
            &l.email_exists_error,
            &l.first_name_error,
            &l.last_name_error,
            &l.email_error,
            &l.password_error,
            &l.confirm_password_error,
        ] {
            if message.probe(session).await?.is_some_and(|h| h.visible) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl PageObject for RegisterPage {
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

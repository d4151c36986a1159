//! Scripted demo shop shared by the suite integration tests.
//!
//! Mirrors what the real site renders for the login and registration
//! forms: client-side validation messages, the login summary, the
//! `.message-error` notice for existing accounts and the registration
//! result page. Accounts are shared by every session of one shop.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use regex::Regex;
use shopwright::messages;
use shopwright::{
    Fixture, Locator, LoginLocators, MockDocument, MockElement, MockSession, MockSessionFactory,
    RegisterLocators, RetryConfig, RunnerConfig, SessionFactory, SuiteReport, TestHarness,
    TestSuite,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://demo.shop.test";
pub const FIXTURE_EMAIL: &str = "fixture.user@example.com";
pub const FIXTURE_PASSWORD: &str = "FixturePass123";

/// Deliberate misbehaviors, to check that the suites catch them
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// Log in with any well-formed credentials
    pub accept_any_login: bool,
    /// Skip the confirmation comparison on registration
    pub ignore_mismatch: bool,
    /// `/login` refuses connections
    pub login_down: bool,
    /// Register accounts whose fields contain markup
    pub accept_markup: bool,
    /// Send markup submissions to a URL echoing the payload
    pub alert_redirect: bool,
    /// Register an email that already has an account
    pub accept_existing_email: bool,
    /// Flag a malformed login email but still start the session
    pub login_despite_format_error: bool,
}

#[derive(Debug, Clone)]
pub struct DemoShop {
    accounts: Arc<Mutex<HashMap<String, String>>>,
    quirks: Quirks,
    click_latency: Duration,
}

impl DemoShop {
    /// Shop with only the fixture account registered
    pub fn new() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(FIXTURE_EMAIL.to_string(), FIXTURE_PASSWORD.to_string());
        Self {
            accounts: Arc::new(Mutex::new(accounts)),
            quirks: Quirks::default(),
            click_latency: Duration::ZERO,
        }
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Form submissions land this long after the click returns
    pub fn with_click_latency(mut self, latency: Duration) -> Self {
        self.click_latency = latency;
        self
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(email)
    }

    /// A fresh browsing session on this shop
    pub fn session(&self) -> MockSession {
        let login = LoginLocators::new(RetryConfig::default());
        let register = RegisterLocators::new(RetryConfig::default());

        let mut session = MockSession::new(BASE_URL)
            .with_route("/", home(false))
            .with_route("/login", login_form())
            .with_route("/register", register_form())
            .with_route("/registerresult/1", registration_result())
            .with_route("/error", error_page())
            .with_reaction(login.submit_button.selector().clone(), self.on_login())
            .with_reaction(register.register_button.selector().clone(), self.on_register())
            .with_click_latency(self.click_latency);
        if self.quirks.login_down {
            session = session.with_failing_route("/login");
        }
        session
    }

    pub fn factory(&self) -> MockSessionFactory<impl Fn() -> MockSession + Send + Sync + 'static> {
        let shop = self.clone();
        MockSessionFactory::new(move || shop.session())
    }

    fn on_login(&self) -> impl Fn(&mut MockDocument) + Send + Sync + 'static {
        let accounts = Arc::clone(&self.accounts);
        let quirks = self.quirks;
        move |doc| {
            let l = LoginLocators::new(RetryConfig::default());
            let email = doc.value_of("Email");
            let password = doc.value_of("Password");
            doc.hide(l.email_error.selector());

            if !email.is_empty() && !is_valid_email(&email) {
                doc.show(l.email_error.selector(), Some(messages::INVALID_EMAIL));
                if quirks.login_despite_format_error {
                    doc.set_cookie("auth", email);
                    doc.push(logout_link());
                }
                return;
            }

            let known = quirks.accept_any_login
                || accounts
                    .lock()
                    .unwrap()
                    .get(&email)
                    .is_some_and(|p| *p == password);
            if known {
                doc.set_cookie("auth", email);
                doc.set_route("/", home(true));
                doc.set_route("/login", authenticated_login_form());
                doc.navigate("/");
                return;
            }

            doc.navigate("/login");
            doc.push(
                MockElement::new("div")
                    .with_class("message-error")
                    .with_class("validation-summary-errors")
                    .with_text(messages::LOGIN_UNSUCCESSFUL),
            );
            doc.push(MockElement::new("li").with_text(messages::NO_CUSTOMER_FOUND));
        }
    }

    fn on_register(&self) -> impl Fn(&mut MockDocument) + Send + Sync + 'static {
        let accounts = Arc::clone(&self.accounts);
        let quirks = self.quirks;
        move |doc| {
            let l = RegisterLocators::new(RetryConfig::default());
            let first = doc.value_of("FirstName");
            let last = doc.value_of("LastName");
            let email = doc.value_of("Email");
            let password = doc.value_of("Password");
            let confirm = doc.value_of("ConfirmPassword");

            for loc in [
                &l.first_name_error,
                &l.last_name_error,
                &l.email_error,
                &l.password_error,
                &l.confirm_password_error,
                &l.email_exists_error,
            ] {
                doc.hide(loc.selector());
            }

            let mut errors: Vec<(&Locator, &str)> = Vec::new();
            if first.is_empty() {
                errors.push((&l.first_name_error, messages::FIRST_NAME_REQUIRED));
            }
            if last.is_empty() {
                errors.push((&l.last_name_error, messages::LAST_NAME_REQUIRED));
            }
            if email.is_empty() {
                errors.push((&l.email_error, messages::EMAIL_REQUIRED));
            } else if !is_valid_email(&email) {
                errors.push((&l.email_error, messages::INVALID_EMAIL));
            }
            if password.is_empty() {
                errors.push((&l.password_error, messages::PASSWORD_REQUIRED));
            } else if password.chars().count() < 6 {
                errors.push((&l.password_error, messages::PASSWORD_TOO_SHORT));
            }
            if confirm.is_empty() {
                errors.push((&l.confirm_password_error, messages::PASSWORD_REQUIRED));
            } else if confirm != password && !quirks.ignore_mismatch {
                errors.push((&l.confirm_password_error, messages::PASSWORD_MISMATCH));
            }
            if !errors.is_empty() {
                for (loc, text) in errors {
                    doc.show(loc.selector(), Some(text));
                }
                return;
            }

            // Request validation rejects markup server-side
            let has_markup = [&first, &last, &email, &password]
                .iter()
                .any(|v| v.contains('<'));
            if has_markup && quirks.alert_redirect {
                doc.navigate("/welcome/alert");
                return;
            }
            if has_markup && !quirks.accept_markup {
                doc.navigate("/error");
                return;
            }

            let mut accounts = accounts.lock().unwrap();
            if accounts.contains_key(&email) && !quirks.accept_existing_email {
                doc.show(l.email_exists_error.selector(), Some(messages::EMAIL_EXISTS));
                return;
            }
            accounts.insert(email.clone(), password);
            doc.set_cookie("auth", email);
            doc.navigate("/registerresult/1");
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$")
        .unwrap()
        .is_match(email)
}

fn logout_link() -> MockElement {
    MockElement::new("a")
        .with_class("ico-logout")
        .with_attribute("href", "/logout")
        .with_text(messages::LOG_OUT)
}

fn home(authenticated: bool) -> Vec<MockElement> {
    let header = if authenticated {
        logout_link()
    } else {
        MockElement::new("a")
            .with_class("ico-login")
            .with_attribute("href", "/login")
            .with_text("Log in")
    };
    vec![header, MockElement::new("h2").with_text("Welcome to our store")]
}

fn login_form() -> Vec<MockElement> {
    vec![
        MockElement::new("a")
            .with_class("ico-login")
            .with_attribute("href", "/login")
            .with_text("Log in"),
        MockElement::input("Email").with_attribute("type", "email"),
        MockElement::input("Password").with_attribute("type", "password"),
        MockElement::new("input")
            .with_class("button-1")
            .with_class("login-button")
            .with_attribute("type", "submit")
            .with_attribute("value", "Log in"),
        MockElement::validation_message("Email"),
    ]
}

fn authenticated_login_form() -> Vec<MockElement> {
    let mut form: Vec<MockElement> = login_form()
        .into_iter()
        .filter(|el| !el.classes.iter().any(|c| c == "ico-login"))
        .map(|el| {
            if el.classes.iter().any(|c| c == "login-button") {
                el.hidden()
            } else {
                el
            }
        })
        .collect();
    form.push(logout_link());
    form.push(
        MockElement::new("div")
            .with_class("notice")
            .with_text(messages::ALREADY_LOGGED_IN),
    );
    form
}

fn register_form() -> Vec<MockElement> {
    let mut form = vec![
        MockElement::new("input")
            .with_id("gender-male")
            .with_attribute("type", "radio"),
        MockElement::new("input")
            .with_id("gender-female")
            .with_attribute("type", "radio"),
        MockElement::input("FirstName"),
        MockElement::input("LastName"),
        MockElement::input("Email").with_attribute("type", "email"),
        MockElement::input("Password").with_attribute("type", "password"),
        MockElement::input("ConfirmPassword").with_attribute("type", "password"),
        MockElement::new("input")
            .with_id("register-button")
            .with_class("button-1")
            .with_attribute("type", "submit"),
        MockElement::new("div").with_class("message-error").hidden(),
    ];
    for field in ["FirstName", "LastName", "Email", "Password", "ConfirmPassword"] {
        form.push(MockElement::validation_message(field));
    }
    form
}

fn registration_result() -> Vec<MockElement> {
    vec![
        logout_link(),
        MockElement::new("div")
            .with_class("result")
            .with_text(messages::REGISTRATION_COMPLETED),
        MockElement::new("input")
            .with_class("register-continue-button")
            .with_attribute("type", "button"),
    ]
}

fn error_page() -> Vec<MockElement> {
    vec![MockElement::new("h1")
        .with_text("A potentially dangerous Request.Form value was detected from the client.")]
}

/// Read-only fixture matching the shop's registered account
pub fn fixture() -> Arc<Fixture> {
    let vars: HashMap<&str, &str> = [
        ("BASE_URL", BASE_URL),
        ("TEST_EMAIL", FIXTURE_EMAIL),
        ("TEST_PASSWORD", FIXTURE_PASSWORD),
        ("TEST_USER_NAME", "Fixture"),
        ("TEST_USER_LASTNAME", "User"),
    ]
    .into_iter()
    .collect();
    Arc::new(Fixture::from_lookup(|name| vars.get(name).map(|v| (*v).to_string())).unwrap())
}

/// Short waits so failing expectations resolve quickly
pub fn config() -> RunnerConfig {
    RunnerConfig::new()
        .with_workers(4)
        .with_case_timeout(Duration::from_secs(10))
        .with_wait(RetryConfig::new(Duration::from_millis(300)).with_poll_interval(Duration::from_millis(10)))
}

pub async fn run(
    shop: &DemoShop,
    suite: &TestSuite,
    config: RunnerConfig,
    filter: Option<&str>,
) -> SuiteReport {
    let factory: Arc<dyn SessionFactory> = Arc::new(shop.factory());
    TestHarness::new(config, factory, fixture())
        .run(suite, filter)
        .await
}

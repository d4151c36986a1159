//! Login suite.

use crate::harness::{CaseContext, TestCase, TestSuite};
use crate::messages;
use crate::page_object::PageObject;
use crate::result::ShopResult;

/// Malformed emails the login form must reject, with the password sent
/// alongside and a short label used in the case name
pub const INVALID_LOGIN_EMAILS: [(&str, &str, &str); 5] = [
    ("missing @", "correoInvalido.com", "TestPassword123"),
    ("invalid TLD", "usuario@example.c", "TestPassword123"),
    ("surrounding spaces", " usuario@example.com ", "TestPassword123"),
    ("script injection", "<script>alert('xss')</script>", "fakePassword"),
    ("SQL injection", "' OR 1=1 --", "fakePassword"),
];

async fn valid_credentials(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.login_page();
    let creds = &ctx.fixture().credentials;
    page.navigate().await?;
    page.login(&creds.email, &creds.password).await?;
    ctx.expect(&page.locators().logout_text).to_be_visible().await
}

async fn wrong_credentials(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.login_page();
    let l = page.locators();
    page.navigate().await?;
    page.login("correo_invalido@example.com", "claveIncorrecta!")
        .await?;
    ctx.expect(&l.unsuccessful_login_message).to_be_visible().await?;
    ctx.expect(&l.no_customer_found_message).to_be_visible().await?;
    ctx.expect(&l.logout_text).to_be_hidden().await
}

async fn empty_credentials(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.login_page();
    page.navigate().await?;
    page.login("", "").await?;
    ctx.expect(&page.locators().unsuccessful_login_message)
        .to_be_visible()
        .await
}

async fn invalid_email(ctx: CaseContext, email: &str, password: &str) -> ShopResult<()> {
    let page = ctx.login_page();
    let l = page.locators();
    page.navigate().await?;
    page.login(email, password).await?;
    ctx.expect(&l.email_error).to_be_visible().await?;
    ctx.expect(&l.email_error)
        .to_have_text(messages::INVALID_EMAIL)
        .await?;
    ctx.expect(&l.logout_text).to_be_hidden().await
}

async fn already_authenticated(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.login_page();
    let l = page.locators();
    let creds = &ctx.fixture().credentials;
    page.navigate().await?;
    page.login(&creds.email, &creds.password).await?;
    ctx.expect(&l.logout_text).to_be_visible().await?;

    page.navigate().await?;
    ctx.expect(&l.submit_button).to_be_hidden().await?;
    ctx.expect(&l.already_logged_in_message).to_be_visible().await
}

/// Login form cases, in declaration order
#[must_use]
pub fn login_suite() -> TestSuite {
    let mut suite = TestSuite::new("login")
        .with_case(TestCase::new(
            "login: should log in with valid credentials",
            valid_credentials,
        ))
        .with_case(TestCase::new(
            "login: should show error with wrong credentials",
            wrong_credentials,
        ))
        .with_case(TestCase::new(
            "login: should show error with empty email and password",
            empty_credentials,
        ));

    for (label, email, password) in INVALID_LOGIN_EMAILS {
        suite.add_case(TestCase::new(
            format!("login: should reject invalid email ({label})"),
            move |ctx| invalid_email(ctx, email, password),
        ));
    }

    suite.with_case(
        TestCase::new(
            "login: should not show the form when already authenticated",
            already_authenticated,
        )
        .unverified(),
    )
}

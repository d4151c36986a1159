//! Registration suite.

use crate::fixture::{unique_email, RegistrationData};
use crate::harness::{CaseContext, TestCase, TestSuite};
use crate::messages;
use crate::page_object::PageObject;
use crate::result::{ShopError, ShopResult};
use regex::Regex;

/// Payload typed into the first name by the injection case
pub const SCRIPT_INJECTION: &str = r#"<script>alert("hack")</script>"#;

async fn new_user(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    page.navigate().await?;
    let data = RegistrationData::new("Juan", "Pérez", unique_email("testuser"), "TestPassword123!");
    page.register(&data).await?;
    ctx.expect(&page.locators().success_message)
        .to_be_visible()
        .await
}

async fn existing_email(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    let l = page.locators();
    page.navigate().await?;
    page.register(&ctx.fixture().registration()).await?;
    ctx.expect(&l.email_exists_error).to_be_visible().await?;
    ctx.expect(&l.email_exists_error)
        .to_contain_text(messages::EMAIL_EXISTS)
        .await
}

async fn password_mismatch(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    page.navigate().await?;
    let data = RegistrationData::new("Ana", "Gómez", unique_email("testuser"), "12345678")
        .with_confirm_password("87654321");
    page.register(&data).await?;

    let mismatch = page.password_mismatch_error();
    ctx.expect(mismatch).to_be_visible().await?;
    ctx.expect(mismatch)
        .to_have_text(messages::PASSWORD_MISMATCH)
        .await?;
    ctx.expect(&page.locators().success_message)
        .to_be_hidden()
        .await
}

async fn invalid_tld(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    let l = page.locators();
    page.navigate().await?;
    let email = unique_email("testuser").replace("@example.com", "@example.c");
    page.register(&RegistrationData::new("Julian", "Cardona", email, "12345678"))
        .await?;
    ctx.expect(&l.email_error).to_be_visible().await?;
    ctx.expect(&l.email_error)
        .to_have_text(messages::INVALID_EMAIL)
        .await
}

async fn required_fields(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    let l = page.locators();
    page.navigate().await?;
    page.register(&RegistrationData::empty()).await?;

    let expected = [
        (&l.first_name_error, messages::FIRST_NAME_REQUIRED),
        (&l.last_name_error, messages::LAST_NAME_REQUIRED),
        (&l.email_error, messages::EMAIL_REQUIRED),
        (&l.password_error, messages::PASSWORD_REQUIRED),
        (&l.confirm_password_error, messages::PASSWORD_REQUIRED),
    ];
    for (locator, text) in expected {
        ctx.expect(locator).to_be_visible().await?;
        ctx.expect(locator).to_have_text(text).await?;
    }
    Ok(())
}

async fn script_injection(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    page.navigate().await?;
    let data = RegistrationData::new(
        SCRIPT_INJECTION,
        "Hacker",
        unique_email("hacker"),
        "SecurePass123!",
    );
    page.register_and_await_response(&data).await?;

    let marker = Regex::new("alert").map_err(|e| ShopError::session(e.to_string()))?;
    ctx.expect_url().not_to_match(&marker).await?;
    ctx.expect(&page.locators().success_message)
        .to_be_hidden()
        .await
}

async fn duplicate_in_session(ctx: CaseContext) -> ShopResult<()> {
    let page = ctx.register_page();
    let l = page.locators();
    let data = RegistrationData::new("Maria", "Dup", unique_email("duplicate"), "Password123!");

    page.navigate().await?;
    page.register(&data).await?;
    ctx.expect(&l.success_message).to_be_visible().await?;

    page.navigate().await?;
    page.register(&data).await?;
    ctx.expect(&l.email_exists_error).to_be_visible().await
}

/// Registration form cases, in declaration order
#[must_use]
pub fn register_suite() -> TestSuite {
    TestSuite::new("register")
        .with_case(TestCase::new(
            "register: should register a new user with a random email",
            new_user,
        ))
        .with_case(TestCase::new(
            "register: should show error if email already exists",
            existing_email,
        ))
        .with_case(TestCase::new(
            "register: should show error if passwords do not match",
            password_mismatch,
        ))
        .with_case(TestCase::new(
            "register: should show error with invalid email TLD",
            invalid_tld,
        ))
        .with_case(TestCase::new(
            "register: should show required field errors if fields are empty",
            required_fields,
        ))
        .with_case(TestCase::new(
            "register: should not allow HTML or JS code in input fields",
            script_injection,
        ))
        .with_case(TestCase::new(
            "register: should prevent duplicate registration in same session",
            duplicate_in_session,
        ))
}

//! UI messages the shop renders, as asserted by the suites.

/// Client-side email format validation
pub const INVALID_EMAIL: &str = "Please enter a valid email address.";

/// Login summary shown for any rejected login
pub const LOGIN_UNSUCCESSFUL: &str =
    "Login was unsuccessful. Please correct the errors and try again.";

/// Login detail shown when the account does not exist
pub const NO_CUSTOMER_FOUND: &str = "No customer account found";

/// Link text present only while authenticated
pub const LOG_OUT: &str = "Log out";

/// Notice expected when revisiting `/login` with an active session
pub const ALREADY_LOGGED_IN: &str = "You are already logged in";

/// Registration success notice
pub const REGISTRATION_COMPLETED: &str = "Your registration completed";

/// Registration rejected for an existing account
pub const EMAIL_EXISTS: &str = "The specified email already exists";

/// Confirmation differs from the password
pub const PASSWORD_MISMATCH: &str = "The password and confirmation password do not match.";

/// Required first name
pub const FIRST_NAME_REQUIRED: &str = "First name is required.";

/// Required last name
pub const LAST_NAME_REQUIRED: &str = "Last name is required.";

/// Required email
pub const EMAIL_REQUIRED: &str = "Email is required.";

/// Required password (shown for both password fields)
pub const PASSWORD_REQUIRED: &str = "Password is required.";

/// Password shorter than the site minimum
pub const PASSWORD_TOO_SHORT: &str = "The password should have at least 6 characters.";

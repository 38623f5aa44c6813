//! Request shape validation
//!
//! Runs before any call into the auth core so malformed input never touches
//! the stores.

use auth::{AuthError, LoginMode, NewUser, TwoFactorMethod};

use crate::routes::{LoginRequest, SignupRequest, VerifyTwoFactorRequest};

/// Minimum password length after trimming
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn validate_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    if !email.contains('@') {
        return Err(AuthError::validation("A valid email address is required."));
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.trim().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

fn validate_two_factor_method(method: Option<&str>) -> Result<Option<TwoFactorMethod>, AuthError> {
    match method.map(str::trim) {
        None | Some("") => Ok(None),
        Some(method) => method.parse().map(Some),
    }
}

/// Validated signup input, ready for the auth core
pub fn validate_signup(request: &SignupRequest) -> Result<NewUser, AuthError> {
    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AuthError::validation("Name is required."));
    }

    let email = validate_email(request.email.as_deref().unwrap_or_default())?;
    let password = request.password.as_deref().unwrap_or_default();
    validate_password(password)?;

    let mut new_user = NewUser::customer(name, email, password);
    if let Some(method) = validate_two_factor_method(request.two_factor_method.as_deref())? {
        new_user = new_user.with_two_factor(method);
    }
    Ok(new_user)
}

/// Validated login input: email, password and portal mode
pub fn validate_login(request: &LoginRequest) -> Result<(String, String, LoginMode), AuthError> {
    let email = validate_email(request.email.as_deref().unwrap_or_default())?;
    let password = request.password.clone().unwrap_or_default();
    validate_password(&password)?;

    let mode = match request.mode.as_deref().map(str::trim) {
        None | Some("") => LoginMode::Customer,
        Some(mode) => mode.parse()?,
    };

    Ok((email, password, mode))
}

/// Validated challenge id and code
pub fn validate_verify(request: &VerifyTwoFactorRequest) -> Result<(String, String), AuthError> {
    let challenge_id = request.challenge_id.as_deref().map(str::trim).unwrap_or_default();
    let code = request.code.as_deref().map(str::trim).unwrap_or_default();

    if challenge_id.is_empty() || code.is_empty() {
        return Err(AuthError::validation("Challenge ID and code are required."));
    }

    Ok((challenge_id.to_string(), code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str, method: Option<&str>) -> SignupRequest {
        SignupRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            two_factor_method: method.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" a@b.com ").unwrap(), "a@b.com");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password_trims() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("   1234567   ").is_err());
    }

    #[test]
    fn test_validate_signup() {
        let new_user = validate_signup(&signup(" Jane ", "jane@example.com", "password123", Some("sms"))).unwrap();
        assert_eq!(new_user.name, "Jane");
        assert_eq!(new_user.two_factor_method, Some(TwoFactorMethod::Sms));

        let without = validate_signup(&signup("Jane", "jane@example.com", "password123", None)).unwrap();
        assert_eq!(without.two_factor_method, None);
    }

    #[test]
    fn test_validate_signup_failures() {
        let err = validate_signup(&signup("  ", "jane@example.com", "password123", None)).unwrap_err();
        assert_eq!(err.client_message(), "Name is required.");

        let err = validate_signup(&signup("Jane", "jane.example.com", "password123", None)).unwrap_err();
        assert_eq!(err.client_message(), "A valid email address is required.");

        let err = validate_signup(&signup("Jane", "jane@example.com", "short", None)).unwrap_err();
        assert_eq!(err.client_message(), "Password must be at least 8 characters.");

        let err = validate_signup(&signup("Jane", "jane@example.com", "password123", Some("fax"))).unwrap_err();
        assert_eq!(err.client_message(), "Unsupported two-factor method.");
    }

    #[test]
    fn test_validate_login_mode() {
        let request = LoginRequest {
            email: Some("john@example.com".to_string()),
            password: Some("password123".to_string()),
            mode: Some("admin".to_string()),
        };
        let (_, _, mode) = validate_login(&request).unwrap();
        assert_eq!(mode, LoginMode::Admin);

        let request = LoginRequest { mode: None, ..request };
        assert_eq!(validate_login(&request).unwrap().2, LoginMode::Customer);
    }

    #[test]
    fn test_validate_verify() {
        let ok = VerifyTwoFactorRequest {
            challenge_id: Some("abc".to_string()),
            code: Some(" 123456 ".to_string()),
        };
        assert_eq!(validate_verify(&ok).unwrap(), ("abc".to_string(), "123456".to_string()));

        let missing = VerifyTwoFactorRequest {
            challenge_id: None,
            code: Some("123456".to_string()),
        };
        assert!(validate_verify(&missing).is_err());
    }
}

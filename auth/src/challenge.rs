//! Second-factor codes and verification verdicts.
//!
//! A [`CodeIssuer`] decides which code a challenge expects and what hint the
//! client is shown. The demo issuer uses one fixed code per channel; a real
//! issuer would generate a code per challenge and deliver it out of band.

use std::fmt;

use crate::types::{SanitizedUser, TwoFactorChallenge, TwoFactorMethod};

/// Demo code expected for authenticator-app challenges.
pub const DEMO_AUTHENTICATOR_CODE: &str = "246810";
/// Demo code expected for SMS challenges.
pub const DEMO_SMS_CODE: &str = "135790";
/// Demo code expected for email challenges.
pub const DEMO_EMAIL_CODE: &str = "112358";

/// Source of expected second-factor codes.
pub trait CodeIssuer: Send + Sync {
    /// Code that verifies `challenge`.
    fn expected_code(&self, challenge: &TwoFactorChallenge) -> String;

    /// Human-readable hint returned alongside a freshly issued challenge.
    fn hint(&self, method: TwoFactorMethod) -> String;
}

/// Fixed per-channel codes for demo deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCodeIssuer;

impl DemoCodeIssuer {
    pub fn code_for(method: TwoFactorMethod) -> &'static str {
        match method {
            TwoFactorMethod::Authenticator => DEMO_AUTHENTICATOR_CODE,
            TwoFactorMethod::Sms => DEMO_SMS_CODE,
            TwoFactorMethod::Email => DEMO_EMAIL_CODE,
        }
    }
}

impl CodeIssuer for DemoCodeIssuer {
    fn expected_code(&self, challenge: &TwoFactorChallenge) -> String {
        Self::code_for(challenge.method).to_string()
    }

    fn hint(&self, method: TwoFactorMethod) -> String {
        let code = Self::code_for(method);
        match method {
            TwoFactorMethod::Authenticator => {
                format!("Enter the code from your authenticator app (demo code: {code}).")
            }
            TwoFactorMethod::Sms => {
                format!("We sent a code to your phone (demo code: {code}).")
            }
            TwoFactorMethod::Email => {
                format!("We sent a code to your email (demo code: {code}).")
            }
        }
    }
}

/// Why a challenge verification was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeRejection {
    /// Unknown id, already consumed, or purged
    NotFound,
    /// Past its expiry; the challenge has been removed
    Expired,
    /// Wrong code; the challenge stays active until expiry
    InvalidCode,
    /// Code matched but the owning account no longer resolves
    UserMissing,
}

impl ChallengeRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            ChallengeRejection::NotFound => "not found",
            ChallengeRejection::Expired => "expired",
            ChallengeRejection::InvalidCode => "invalid code",
            ChallengeRejection::UserMissing => "verification failed",
        }
    }
}

impl fmt::Display for ChallengeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of verifying a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeVerdict {
    Verified(SanitizedUser),
    Rejected(ChallengeRejection),
}

impl ChallengeVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChallengeVerdict::Verified(_))
    }
}

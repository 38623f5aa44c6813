//! Account registry, password login and the two-factor challenge flow.
//!
//! [`AuthService`] is the only component that mutates accounts and
//! challenges. Request handlers validate input shape, call one of the flow
//! operations ([`AuthService::signup`], [`AuthService::login`],
//! [`AuthService::complete_two_factor`], [`AuthService::passkey_options`])
//! and map the returned [`AuthError`] to a response.
//!
//! Challenge lifecycle: `issued` until either the right code is supplied
//! (challenge consumed) or it is seen past its expiry (challenge removed).
//! Wrong codes leave it active so the user can retry until expiry.
//!
//! Note: the distinct "user not found" and "incorrect password" errors let a
//! caller discover which emails are registered. This is kept as-is for the
//! storefront demo.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::challenge::{ChallengeRejection, ChallengeVerdict, CodeIssuer, DemoCodeIssuer};
use crate::config::AuthConfig;
use crate::credential::{Credential, hash_credential, verify_credential};
use crate::errors::{AuthError, AuthResult, StoreError};
use crate::store::{ChallengeStore, InMemoryChallengeStore, InMemoryUserStore, UserStore};
use crate::types::{
    AuthOutcome, IssuedChallenge, LoginMode, NewUser, PasskeyOptions, SanitizedUser,
    TwoFactorChallenge, User,
};

/// Authentication core over injectable stores.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    challenges: Arc<dyn ChallengeStore>,
    codes: Arc<dyn CodeIssuer>,
    config: AuthConfig,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        challenges: Arc<dyn ChallengeStore>,
        codes: Arc<dyn CodeIssuer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            challenges,
            codes,
            config,
        }
    }

    /// Service backed by empty in-memory stores and the demo code issuer.
    pub fn in_memory(config: AuthConfig) -> Self {
        Self::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryChallengeStore::new()),
            Arc::new(DemoCodeIssuer),
            config,
        )
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Derives a credential with a fresh salt using the configured iteration count.
    pub fn hash_credential(&self, password: &str) -> Credential {
        hash_credential(password, None, self.config.kdf_iterations)
    }

    /// Checks `password` against the account's stored credential.
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        verify_credential(&user.credential, password, self.config.kdf_iterations)
    }

    /// Registers a new account and returns its sanitized view.
    ///
    /// Fails with [`AuthError::EmailAlreadyRegistered`] when the email is
    /// taken (case-insensitive); nothing is stored in that case.
    pub fn create_user(&self, new_user: NewUser) -> AuthResult<SanitizedUser> {
        self.insert_user(new_user, false).map(|user| user.sanitized())
    }

    /// Looks up an account by email, case-insensitively.
    pub fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self.users.find_by_email(email)?)
    }

    fn insert_user(&self, new_user: NewUser, passkey_enabled: bool) -> AuthResult<User> {
        if self.users.find_by_email(&new_user.email)?.is_some() {
            info!("Signup rejected: email already registered");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let NewUser {
            name,
            email,
            password,
            role,
            two_factor_method,
        } = new_user;

        let credential = self.hash_credential(&password);
        let mut user = User::new(name, email.trim().to_string(), role, credential, two_factor_method);
        user.passkey_enabled = passkey_enabled;

        match self.users.insert(user.clone()) {
            Ok(()) => {
                info!(user_id = %user.id, role = ?user.role, two_factor = ?user.two_factor_method, "User created");
                Ok(user)
            }
            // lost a race with a concurrent signup for the same address
            Err(StoreError::ConstraintViolation(_)) => Err(AuthError::EmailAlreadyRegistered),
            Err(e) => Err(e.into()),
        }
    }

    /// Issues a fresh two-factor challenge for an account with 2FA enabled.
    pub fn create_challenge(&self, user: &User) -> AuthResult<IssuedChallenge> {
        let method = match (user.two_factor_enabled, user.two_factor_method) {
            (true, Some(method)) => method,
            _ => {
                error!(user_id = %user.id, "Challenge requested for account without two-factor");
                return Err(AuthError::InternalError);
            }
        };

        let challenge = TwoFactorChallenge::new(
            user.id.clone(),
            method,
            OffsetDateTime::now_utc(),
            self.config.challenge_ttl,
        );
        let issued = IssuedChallenge {
            challenge_id: challenge.challenge_id.clone(),
            hint: self.codes.hint(method),
        };

        self.challenges.insert(challenge)?;
        debug!(user_id = %user.id, method = %method, "Two-factor challenge issued");

        Ok(issued)
    }

    /// Verifies a challenge against the current time.
    pub fn verify_challenge(&self, challenge_id: &str, code: &str) -> AuthResult<ChallengeVerdict> {
        self.verify_challenge_at(challenge_id, code, OffsetDateTime::now_utc())
    }

    /// Verifies a challenge as of `now`.
    ///
    /// Expired challenges are removed. A matching code consumes the
    /// challenge; only the caller that actually removes it gets
    /// [`ChallengeVerdict::Verified`].
    pub fn verify_challenge_at(
        &self,
        challenge_id: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> AuthResult<ChallengeVerdict> {
        let Some(challenge) = self.challenges.get(challenge_id)? else {
            return Ok(ChallengeVerdict::Rejected(ChallengeRejection::NotFound));
        };

        if challenge.is_expired_at(now) {
            self.challenges.remove(challenge_id)?;
            info!(user_id = %challenge.user_id, "Two-factor challenge expired");
            return Ok(ChallengeVerdict::Rejected(ChallengeRejection::Expired));
        }

        if code.trim() != self.codes.expected_code(&challenge) {
            info!(user_id = %challenge.user_id, "Two-factor code rejected");
            return Ok(ChallengeVerdict::Rejected(ChallengeRejection::InvalidCode));
        }

        if self.challenges.remove(challenge_id)?.is_none() {
            return Ok(ChallengeVerdict::Rejected(ChallengeRejection::NotFound));
        }

        match self.users.find_by_id(&challenge.user_id)? {
            Some(user) => {
                info!(user_id = %user.id, "Two-factor challenge verified");
                Ok(ChallengeVerdict::Verified(user.sanitized()))
            }
            None => {
                error!(user_id = %challenge.user_id, "Challenge owner vanished after verification");
                Ok(ChallengeVerdict::Rejected(ChallengeRejection::UserMissing))
            }
        }
    }

    /// Creates an account and, when it has 2FA, issues its first challenge.
    pub fn signup(&self, new_user: NewUser) -> AuthResult<AuthOutcome> {
        let user = self.insert_user(new_user, false)?;
        self.outcome_for(&user)
    }

    /// Password login, optionally restricted to admin accounts.
    pub fn login(&self, email: &str, password: &str, mode: LoginMode) -> AuthResult<AuthOutcome> {
        let user = self
            .users
            .find_by_email(email)?
            .ok_or(AuthError::UserNotFound)?;

        if mode == LoginMode::Admin && !user.is_admin() {
            warn!(user_id = %user.id, "Admin login attempted by non-admin account");
            return Err(AuthError::AdminAccessRequired);
        }

        if !self.verify_password(&user, password) {
            info!(user_id = %user.id, "Login rejected: incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        info!(user_id = %user.id, "Password verified");
        self.outcome_for(&user)
    }

    fn outcome_for(&self, user: &User) -> AuthResult<AuthOutcome> {
        if user.two_factor_enabled {
            let challenge = self.create_challenge(user)?;
            Ok(AuthOutcome::pending(user.sanitized(), challenge))
        } else {
            Ok(AuthOutcome::authenticated(user.sanitized()))
        }
    }

    /// Finishes a login or signup by verifying its second factor.
    ///
    /// On success the returned account should be treated as authenticated.
    pub fn complete_two_factor(&self, challenge_id: &str, code: &str) -> AuthResult<SanitizedUser> {
        match self.verify_challenge(challenge_id, code)? {
            ChallengeVerdict::Verified(user) => Ok(user),
            ChallengeVerdict::Rejected(rejection) => Err(match rejection {
                ChallengeRejection::NotFound => AuthError::ChallengeNotFound,
                ChallengeRejection::Expired => AuthError::ChallengeExpired,
                ChallengeRejection::InvalidCode => AuthError::InvalidCode,
                ChallengeRejection::UserMissing => AuthError::VerificationFailed,
            }),
        }
    }

    /// Reports whether passkey sign-in is available.
    ///
    /// Informational only: no WebAuthn ceremony is performed. Unknown emails
    /// get the same answer as accounts without a passkey.
    pub fn passkey_options(&self, email: Option<&str>) -> AuthResult<PasskeyOptions> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let Some(email) = email else {
            return Ok(PasskeyOptions {
                passkey_enabled: false,
                message: "Passkey sign-in is available on supported devices. Enter your email to check your account."
                    .to_string(),
            });
        };

        let enabled = self
            .users
            .find_by_email(email)?
            .is_some_and(|user| user.passkey_enabled);

        let message = if enabled {
            "Passkey sign-in is enabled for this account. Use your device's passkey prompt to continue."
        } else {
            "Passkeys are not enabled for this account yet. Sign in with your password."
        };

        Ok(PasskeyOptions {
            passkey_enabled: enabled,
            message: message.to_string(),
        })
    }

    /// Removes every expired challenge.
    pub fn purge_expired_challenges(&self) -> AuthResult<usize> {
        let purged = self.challenges.purge_expired(OffsetDateTime::now_utc())?;
        if purged > 0 {
            debug!(purged, "Purged expired two-factor challenges");
        }
        Ok(purged)
    }

    pub fn user_count(&self) -> AuthResult<usize> {
        Ok(self.users.len()?)
    }

    pub fn challenge_count(&self) -> AuthResult<usize> {
        Ok(self.challenges.len()?)
    }

    /// Creates the demo accounts that are missing. Returns how many were added.
    pub fn seed_demo_users(&self) -> AuthResult<usize> {
        let mut created = 0;
        for demo in crate::seed::demo_accounts() {
            if self.users.find_by_email(&demo.user.email)?.is_some() {
                continue;
            }
            match self.insert_user(demo.user, demo.passkey_enabled) {
                Ok(_) => created += 1,
                Err(AuthError::EmailAlreadyRegistered) => {}
                Err(e) => return Err(e),
            }
        }

        info!(created, "Demo accounts seeded");
        Ok(created)
    }
}

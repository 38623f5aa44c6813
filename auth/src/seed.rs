//! Demo accounts created at process start.

use crate::types::{NewUser, TwoFactorMethod, UserRole};

pub const DEMO_ADMIN_EMAIL: &str = "john@academystudios.com";
pub const DEMO_ADMIN_PASSWORD: &str = "AdminPass123!";
pub const DEMO_CUSTOMER_EMAIL: &str = "sarah@academystudios.com";
pub const DEMO_CUSTOMER_PASSWORD: &str = "CustomerPass123!";

/// A demo account and the flags that signup cannot set.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub user: NewUser,
    pub passkey_enabled: bool,
}

/// The admin (authenticator 2FA) and the customer (SMS 2FA, passkey).
pub fn demo_accounts() -> Vec<DemoAccount> {
    vec![
        DemoAccount {
            user: NewUser::customer("John Academy", DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD)
                .with_role(UserRole::Admin)
                .with_two_factor(TwoFactorMethod::Authenticator),
            passkey_enabled: false,
        },
        DemoAccount {
            user: NewUser::customer("Sarah Shopper", DEMO_CUSTOMER_EMAIL, DEMO_CUSTOMER_PASSWORD)
                .with_two_factor(TwoFactorMethod::Sms),
            passkey_enabled: true,
        },
    ]
}

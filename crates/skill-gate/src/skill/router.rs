//! Intent routing for authenticated requests.
//!
//! The gate hands every authenticated request to an [`IntentRouter`] and
//! speaks whatever string it returns. Real integrations live behind this
//! trait; [`AccountIntentRouter`] answers the one intent that needs nothing
//! beyond the validated identity.

use crate::auth::principal::{BearerToken, ValidatedPrincipal};
use async_trait::async_trait;

/// Intent that reports which account the session is linked to.
pub const ACCOUNT_INTENT: &str = "Account";

/// Produces the spoken reply for an authenticated request.
#[async_trait]
pub trait IntentRouter: Send + Sync {
    async fn route(
        &self,
        principal: &ValidatedPrincipal,
        token: &BearerToken,
        intent_name: Option<&str>,
    ) -> String;
}

/// Default router: answers the account intent, declines everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountIntentRouter;

#[async_trait]
impl IntentRouter for AccountIntentRouter {
    async fn route(
        &self,
        principal: &ValidatedPrincipal,
        _token: &BearerToken,
        intent_name: Option<&str>,
    ) -> String {
        match intent_name {
            Some(ACCOUNT_INTENT) => {
                format!("You are using {}'s account", principal.identity_name())
            }
            _ => "I don't know how to do that yet".to_string(),
        }
    }
}

//! The authentication capability the login core delegates to.

use async_trait::async_trait;
use secrecy::SecretString;

use super::error::ErrorInformation;
use super::types::{AuthenticatedUser, UserIdentity};

/// Verifies credentials against a directory.
///
/// Implementations own the set of failure kinds they report; the login core passes the
/// returned [`ErrorInformation`] through without reinterpreting it. Calls may block on network
/// I/O and inherit the caller's cancellation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check a secret for an identity the session already knows.
    async fn authenticate_known_identity(
        &self,
        identity: &UserIdentity,
        secret: &SecretString,
    ) -> Result<AuthenticatedUser, ErrorInformation>;

    /// Find the entry matching `username` (optionally scoped by context and profile) and check
    /// the secret against it.
    async fn search_and_authenticate(
        &self,
        username: &str,
        secret: &SecretString,
        context: Option<&str>,
        profile: Option<&str>,
    ) -> Result<AuthenticatedUser, ErrorInformation>;
}

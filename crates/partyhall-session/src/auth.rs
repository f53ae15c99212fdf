//! Identity hook for the handshake.
//!
//! Partyhall does not issue identities. Whoever deploys it plugs their own
//! identity provider in behind the [`Authenticator`] trait; the server calls
//! it once per connection with the token from the client's `hello` frame.

use partyhall_protocol::UserId;
use rand::Rng;

use crate::SessionError;

/// Prefix of identities issued to clients that sent no token.
pub const GUEST_PREFIX: &str = "guest-";

const GUEST_SUFFIX_LEN: usize = 6;
const MAX_TOKEN_LEN: usize = 64;

/// Turns a client's handshake token into a user identity.
///
/// # Example
///
/// ```rust
/// use partyhall_protocol::UserId;
/// use partyhall_session::{Authenticator, SessionError};
///
/// /// Only lets in a fixed list of users.
/// struct AllowList(Vec<String>);
///
/// impl Authenticator for AllowList {
///     fn authenticate(
///         &self,
///         token: Option<&str>,
///     ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send {
///         let result = match token {
///             Some(t) if self.0.iter().any(|u| u == t) => Ok(UserId::new(t)),
///             _ => Err(SessionError::AuthFailed("not on the list".into())),
///         };
///         async move { result }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns the identity it stands for.
    ///
    /// `None` means the client sent no token at all.
    ///
    /// # Errors
    /// `SessionError::AuthFailed` if the token is rejected.
    fn authenticate(
        &self,
        token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}

/// Trusts the client: a token is taken as the user id verbatim, and a
/// client without one gets a fresh `guest-xxxxxx` identity.
///
/// Suitable for casual play where identity only needs to survive a
/// reconnect, not prove anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestAuthenticator;

impl GuestAuthenticator {
    fn guest_id() -> UserId {
        let mut rng = rand::rng();
        let suffix: String = (0..GUEST_SUFFIX_LEN)
            .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        UserId::new(format!("{GUEST_PREFIX}{suffix}"))
    }

    fn check(token: Option<&str>) -> Result<UserId, SessionError> {
        match token.map(str::trim) {
            None | Some("") => Ok(Self::guest_id()),
            Some(token) if token.len() > MAX_TOKEN_LEN => Err(SessionError::AuthFailed(format!(
                "token longer than {MAX_TOKEN_LEN} bytes"
            ))),
            Some(token) if token.chars().any(char::is_control) => Err(
                SessionError::AuthFailed("token contains control characters".into()),
            ),
            Some(token) => Ok(UserId::new(token)),
        }
    }
}

impl Authenticator for GuestAuthenticator {
    fn authenticate(
        &self,
        token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send {
        let result = Self::check(token);
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guest_authenticator_uses_token_as_id() {
        let id = GuestAuthenticator.authenticate(Some(" alice ")).await.unwrap();
        assert_eq!(id, UserId::new("alice"));
    }

    #[tokio::test]
    async fn test_guest_authenticator_issues_guest_ids() {
        let a = GuestAuthenticator.authenticate(None).await.unwrap();
        let b = GuestAuthenticator.authenticate(Some("")).await.unwrap();
        assert!(a.as_str().starts_with(GUEST_PREFIX));
        assert_eq!(a.as_str().len(), GUEST_PREFIX.len() + GUEST_SUFFIX_LEN);
        assert!(b.as_str().starts_with(GUEST_PREFIX));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_guest_authenticator_rejects_oversized_token() {
        let token = "x".repeat(MAX_TOKEN_LEN + 1);
        let err = GuestAuthenticator.authenticate(Some(&token)).await.unwrap_err();
        assert!(matches!(err, SessionError::AuthFailed(_)));
    }
}

use crate::domain::entities::{
    AuthenticatedUser, PresentedCredentials, RejectReason, SessionOutcome,
};
use crate::domain::errors::{IdentityError, SessionError};
use crate::domain::ports::IdentityProvider;

// Resolves the raw session cookie into a session outcome.
//
// Validation always runs first; refresh is attempted only after the provider
// has refused the access token, and never more than once per call.
pub struct ResolveSessionUseCase<'a, P: ?Sized> {
    pub identity: &'a P,
}

impl<P> ResolveSessionUseCase<'_, P>
where
    P: IdentityProvider + ?Sized,
{
    pub async fn execute(&self, raw_cookie: Option<&str>) -> Result<SessionOutcome, SessionError> {
        let raw = match raw_cookie {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(SessionOutcome::Unauthenticated),
        };

        let Some(credentials) = PresentedCredentials::from_cookie_value(raw) else {
            return Ok(SessionOutcome::Rejected(RejectReason::Malformed));
        };

        match self.identity.validate(&credentials.access_token).await {
            Ok(user) => {
                return Ok(SessionOutcome::Valid(AuthenticatedUser {
                    user,
                    access_token: credentials.access_token,
                }));
            }
            Err(IdentityError::Unavailable(message)) => {
                return Err(SessionError::ProviderUnavailable(message));
            }
            Err(IdentityError::Rejected(_)) => {}
        }

        let Some(refresh_token) = credentials.refresh_token else {
            return Ok(SessionOutcome::Rejected(RejectReason::Invalid));
        };

        match self.identity.refresh_session(&refresh_token).await {
            Ok(session) => Ok(SessionOutcome::Refreshed(
                AuthenticatedUser {
                    user: session.user,
                    access_token: session.credentials.access_token.clone(),
                },
                session.credentials,
            )),
            Err(IdentityError::Rejected(_)) => Ok(SessionOutcome::Rejected(RejectReason::Expired)),
            Err(IdentityError::Unavailable(message)) => {
                Err(SessionError::ProviderUnavailable(message))
            }
        }
    }
}

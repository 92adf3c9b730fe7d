use crate::domain::entities::PresentedCredentials;
use crate::domain::errors::{AuthError, IdentityError};
use crate::domain::ports::IdentityProvider;

// Response returned by the sign-out use case.
pub struct SignOutResponse {
    pub revoked: bool,
}

// Sign-out use case. The session cookie is cleared by the caller whatever the result.
pub struct SignOutUseCase<'a, P: ?Sized> {
    pub identity: &'a P,
}

impl<P> SignOutUseCase<'_, P>
where
    P: IdentityProvider + ?Sized,
{
    pub async fn execute(&self, raw_cookie: Option<&str>) -> Result<SignOutResponse, AuthError> {
        let Some(credentials) = raw_cookie.and_then(PresentedCredentials::from_cookie_value) else {
            return Ok(SignOutResponse { revoked: false });
        };

        match self.identity.sign_out(&credentials.access_token).await {
            Ok(()) => Ok(SignOutResponse { revoked: true }),
            // Already dead on the provider side; nothing left to revoke.
            Err(IdentityError::Rejected(_)) => Ok(SignOutResponse { revoked: false }),
            Err(IdentityError::Unavailable(message)) => Err(AuthError::ProviderUnavailable(message)),
        }
    }
}

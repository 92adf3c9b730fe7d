use crate::domain::entities::ProviderSession;
use crate::domain::errors::AuthError;
use crate::domain::ports::IdentityProvider;

// Password sign-in use case; the caller persists the returned credential pair.
pub struct SignInUseCase<'a, P: ?Sized> {
    pub identity: &'a P,
}

impl<P> SignInUseCase<'_, P>
where
    P: IdentityProvider + ?Sized,
{
    pub async fn execute(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let session = self.identity.sign_in_with_password(email, password).await?;
        Ok(session)
    }
}

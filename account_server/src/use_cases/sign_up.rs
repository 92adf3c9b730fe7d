use crate::domain::entities::User;
use crate::domain::errors::{AuthError, BillingError};
use crate::domain::ports::{BillingProvider, BillingStore, IdentityProvider};

// Account registration followed by billing customer provisioning.
pub struct SignUpUseCase<'a, P: ?Sized, B: ?Sized, S: ?Sized> {
    pub identity: &'a P,
    pub billing: &'a B,
    pub store: &'a S,
}

impl<P, B, S> SignUpUseCase<'_, P, B, S>
where
    P: IdentityProvider + ?Sized,
    B: BillingProvider + ?Sized,
    S: BillingStore + ?Sized,
{
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self.identity.sign_up(email, password, full_name).await?;
        self.create_or_retrieve_customer(&user.id, email).await?;

        Ok(user)
    }

    async fn create_or_retrieve_customer(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, BillingError> {
        if let Some(existing) = self.store.find_customer(user_id).await? {
            return Ok(existing);
        }

        let customer_id = self.billing.create_customer(email, user_id).await?;
        self.store.insert_customer(user_id, &customer_id).await?;
        Ok(customer_id)
    }
}

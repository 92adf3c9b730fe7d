use async_trait::async_trait;

use crate::domain::entities::{
    CheckoutRequest, CheckoutSession, Price, Product, ProviderSession, Subscription,
    SubscriptionDetails, User,
};
use crate::domain::errors::{BillingError, IdentityError};

// Port for the external identity backend that owns accounts and credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn validate(&self, access_token: &str) -> Result<User, IdentityError>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, IdentityError>;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, IdentityError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

// Port for the external payments backend.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError>;
    async fn create_checkout_session(
        &self,
        req: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError>;
    async fn retrieve_subscription(&self, subscription_id: &str)
    -> Result<Subscription, BillingError>;
}

// Port for the local mirror of billing data.
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn upsert_product(&self, product: &Product) -> Result<(), BillingError>;
    async fn upsert_price(&self, price: &Price) -> Result<(), BillingError>;
    async fn delete_product(&self, product_id: &str) -> Result<(), BillingError>;
    async fn delete_price(&self, price_id: &str) -> Result<(), BillingError>;
    async fn find_customer(&self, user_id: &str) -> Result<Option<String>, BillingError>;
    async fn insert_customer(&self, user_id: &str, customer_id: &str) -> Result<(), BillingError>;
    async fn find_user_by_customer(&self, customer_id: &str)
    -> Result<Option<String>, BillingError>;
    async fn upsert_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<(), BillingError>;
    async fn list_subscriptions(
        &self,
        user_id: &str,
        statuses: &[&str],
    ) -> Result<Vec<SubscriptionDetails>, BillingError>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

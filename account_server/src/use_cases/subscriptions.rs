use crate::domain::entities::SubscriptionDetails;
use crate::domain::errors::BillingError;
use crate::domain::ports::BillingStore;

// Statuses that still grant access to a plan.
pub const LISTED_STATUSES: &[&str] = &["trialing", "active"];

// Lists the trialing and active subscriptions of one user.
pub struct ListSubscriptionsUseCase<'a, S: ?Sized> {
    pub store: &'a S,
}

impl<S> ListSubscriptionsUseCase<'_, S>
where
    S: BillingStore + ?Sized,
{
    pub async fn execute(&self, user_id: &str) -> Result<Vec<SubscriptionDetails>, BillingError> {
        self.store.list_subscriptions(user_id, LISTED_STATUSES).await
    }
}

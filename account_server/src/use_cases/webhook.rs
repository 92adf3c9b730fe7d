use crate::domain::entities::BillingEvent;
use crate::domain::errors::{BillingError, WebhookError};
use crate::domain::ports::{BillingProvider, BillingStore};

// Applies a verified billing event to the local billing mirror.
pub struct WebhookUseCase<'a, B: ?Sized, S: ?Sized> {
    pub billing: &'a B,
    pub store: &'a S,
}

impl<B, S> WebhookUseCase<'_, B, S>
where
    B: BillingProvider + ?Sized,
    S: BillingStore + ?Sized,
{
    pub async fn execute(&self, event: BillingEvent) -> Result<(), WebhookError> {
        match event {
            BillingEvent::ProductUpserted(product) => self.store.upsert_product(&product).await?,
            BillingEvent::PriceUpserted(price) => self.store.upsert_price(&price).await?,
            BillingEvent::ProductDeleted(id) => self.store.delete_product(&id).await?,
            BillingEvent::PriceDeleted(id) => self.store.delete_price(&id).await?,
            BillingEvent::SubscriptionChanged {
                subscription_id,
                customer_id,
                created,
            } => {
                self.manage_subscription_status_change(&subscription_id, &customer_id, created)
                    .await?
            }
            BillingEvent::CheckoutCompleted {
                mode,
                subscription_id,
                customer_id,
            } => {
                // Only subscription checkouts carry state worth mirroring.
                if mode == "subscription" {
                    let (Some(subscription_id), Some(customer_id)) = (subscription_id, customer_id)
                    else {
                        return Err(WebhookError::InvalidPayload(
                            "checkout session without subscription or customer".to_string(),
                        ));
                    };
                    self.manage_subscription_status_change(&subscription_id, &customer_id, true)
                        .await?;
                }
            }
            BillingEvent::Unsupported(event_type) => {
                return Err(WebhookError::UnsupportedEvent(event_type));
            }
        }

        Ok(())
    }

    async fn manage_subscription_status_change(
        &self,
        subscription_id: &str,
        customer_id: &str,
        created: bool,
    ) -> Result<(), BillingError> {
        let user_id = self
            .store
            .find_user_by_customer(customer_id)
            .await?
            .ok_or_else(|| BillingError::NotFound {
                entity: "customer",
                id: customer_id.to_string(),
            })?;

        let subscription = self.billing.retrieve_subscription(subscription_id).await?;
        self.store.upsert_subscription(&user_id, &subscription).await?;

        tracing::info!(
            subscription_id,
            user_id = %user_id,
            status = %subscription.status,
            created,
            "subscription mirrored"
        );
        Ok(())
    }
}

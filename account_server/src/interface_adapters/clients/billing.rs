use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::domain::entities::{CheckoutRequest, CheckoutSession, Price, Product, Subscription};
use crate::domain::errors::BillingError;
use crate::domain::ports::BillingProvider;

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

// Thin reqwest client for the Stripe REST API (form-encoded requests, JSON responses).
#[derive(Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl BillingClient {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(provider_error)?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(provider_error)
    }
}

#[async_trait]
impl BillingProvider for BillingClient {
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError> {
        let created: CreatedObject = self
            .post_form(
                "/v1/customers",
                &[("email", email), ("metadata[user_id]", user_id)],
            )
            .await?;
        Ok(created.id)
    }

    async fn create_checkout_session(
        &self,
        req: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        self.post_form(
            "/v1/checkout/sessions",
            &[
                ("customer", req.customer_id.as_str()),
                ("mode", "subscription"),
                ("line_items[0][price]", req.price_id.as_str()),
                ("line_items[0][quantity]", "1"),
                ("allow_promotion_codes", "true"),
                ("billing_address_collection", "required"),
                ("success_url", req.success_url.as_str()),
                ("cancel_url", req.cancel_url.as_str()),
                ("metadata[plan]", req.plan.as_str()),
                ("metadata[user_id]", req.user_id.as_str()),
                ("subscription_data[metadata][plan]", req.plan.as_str()),
                ("subscription_data[metadata][user_id]", req.user_id.as_str()),
            ],
        )
        .await
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, BillingError> {
        let response = self
            .http
            .get(format!("{}/v1/subscriptions/{subscription_id}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(provider_error)?;

        let object = check_status(response)
            .await?
            .json::<Value>()
            .await
            .map_err(provider_error)?;
        decode_subscription(object).map_err(BillingError::Provider)
    }
}

async fn check_status(response: Response) -> Result<Response, BillingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .unwrap_or_default()
        .error
        .message
        .unwrap_or_else(|| status.to_string());
    Err(BillingError::Provider(message))
}

fn provider_error(err: impl std::fmt::Display) -> BillingError {
    BillingError::Provider(err.to_string())
}

// Wire shapes of the provider objects mirrored locally.

#[derive(Debug, Deserialize)]
struct ProductObject {
    id: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct PriceObject {
    id: String,
    product: ObjectRef,
    #[serde(default)]
    active: bool,
    currency: String,
    unit_amount: Option<i64>,
    #[serde(rename = "type")]
    price_type: String,
    recurring: Option<Recurring>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct Recurring {
    interval: Option<String>,
    interval_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: ObjectRef,
    status: String,
    #[serde(default)]
    items: ItemList,
    quantity: Option<i64>,
    #[serde(default)]
    cancel_at_period_end: bool,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    created: i64,
    ended_at: Option<i64>,
    canceled_at: Option<i64>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ItemList {
    #[serde(default)]
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: Option<ObjectRef>,
    quantity: Option<i64>,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
}

// Either a bare id or an expanded object with an `id` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ObjectRef {
    Id(String),
    Expanded { id: String },
}

impl ObjectRef {
    pub(crate) fn into_id(self) -> String {
        match self {
            ObjectRef::Id(id) | ObjectRef::Expanded { id } => id,
        }
    }
}

pub(crate) fn decode_product(object: Value) -> Result<Product, String> {
    let product: ProductObject = serde_json::from_value(object).map_err(|err| err.to_string())?;
    Ok(Product {
        id: product.id,
        active: product.active,
        name: product.name,
        description: product.description,
        image: product.images.into_iter().next(),
        metadata: product.metadata,
    })
}

pub(crate) fn decode_price(object: Value) -> Result<Price, String> {
    let price: PriceObject = serde_json::from_value(object).map_err(|err| err.to_string())?;
    let (interval, interval_count) = match price.recurring {
        Some(recurring) => (recurring.interval, recurring.interval_count),
        None => (None, None),
    };
    Ok(Price {
        id: price.id,
        product_id: price.product.into_id(),
        active: price.active,
        currency: price.currency,
        unit_amount: price.unit_amount,
        price_type: price.price_type,
        interval,
        interval_count,
        metadata: price.metadata,
    })
}

pub(crate) fn decode_subscription(object: Value) -> Result<Subscription, String> {
    let subscription: SubscriptionObject =
        serde_json::from_value(object).map_err(|err| err.to_string())?;
    // Newer API versions moved quantity and billing periods onto the first item.
    let item = subscription.items.data.into_iter().next();
    let (price_id, item_quantity, item_start, item_end) = match item {
        Some(item) => (
            item.price.map(ObjectRef::into_id),
            item.quantity,
            item.current_period_start,
            item.current_period_end,
        ),
        None => (None, None, None, None),
    };

    Ok(Subscription {
        id: subscription.id,
        customer_id: subscription.customer.into_id(),
        status: subscription.status,
        price_id,
        quantity: subscription.quantity.or(item_quantity),
        cancel_at_period_end: subscription.cancel_at_period_end,
        current_period_start: subscription.current_period_start.or(item_start),
        current_period_end: subscription.current_period_end.or(item_end),
        created: subscription.created,
        ended_at: subscription.ended_at,
        canceled_at: subscription.canceled_at,
        metadata: subscription.metadata,
    })
}

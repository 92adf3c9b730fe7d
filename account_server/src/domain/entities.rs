use serde::{Deserialize, Serialize};
use serde_json::Value;

// Access/refresh pair issued by the identity provider. Always rotated together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    // JSON body stored in the session cookie.
    pub fn to_cookie_value(&self) -> String {
        serde_json::json!({
            "access_token": self.access_token,
            "refresh_token": self.refresh_token,
        })
        .to_string()
    }
}

// Credentials as presented by a client. The refresh half may be missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentedCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct CookieCredentials {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl PresentedCredentials {
    // Returns None when the value is not a JSON object carrying a non-empty access token.
    pub fn from_cookie_value(raw: &str) -> Option<Self> {
        let parsed: CookieCredentials = serde_json::from_str(raw).ok()?;
        if parsed.access_token.is_empty() {
            return None;
        }

        Some(Self {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.filter(|token| !token.is_empty()),
        })
    }
}

// User record as the identity provider describes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub app_metadata: Value,
}

// Identity handed to a guarded handler, together with the access token that
// proved it so the handler can make further authenticated calls.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticatedUser {
    pub user: User,
    pub access_token: String,
}

// Session returned by sign-in and refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderSession {
    pub credentials: CredentialPair,
    pub user: User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Malformed,
    Invalid,
    Expired,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::Invalid => "invalid",
            RejectReason::Expired => "expired",
        }
    }
}

// Terminal state of one pass through the session guard.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    Unauthenticated,
    Valid(AuthenticatedUser),
    Refreshed(AuthenticatedUser, CredentialPair),
    Rejected(RejectReason),
}

// Catalog product mirrored from the billing provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub active: bool,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub metadata: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub product_id: String,
    pub active: bool,
    pub currency: String,
    pub unit_amount: Option<i64>,
    pub price_type: String,
    pub interval: Option<String>,
    pub interval_count: Option<i64>,
    pub metadata: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub price_id: Option<String>,
    pub quantity: Option<i64>,
    pub cancel_at_period_end: bool,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub created: i64,
    pub ended_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub metadata: Value,
}

// Subscription joined with its price and product for account views.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubscriptionDetails {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub price: Option<Price>,
    pub product: Option<Product>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub price_id: String,
    pub plan: String,
    pub user_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

// Billing webhook event after signature verification and decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum BillingEvent {
    ProductUpserted(Product),
    PriceUpserted(Price),
    ProductDeleted(String),
    PriceDeleted(String),
    SubscriptionChanged {
        subscription_id: String,
        customer_id: String,
        created: bool,
    },
    CheckoutCompleted {
        mode: String,
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    Unsupported(String),
}

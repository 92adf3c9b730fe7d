use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::entities::{
    CheckoutRequest, CheckoutSession, CredentialPair, Price, Product, ProviderSession,
    Subscription, SubscriptionDetails, User,
};
use crate::domain::errors::{BillingError, IdentityError};
use crate::domain::ports::{BillingProvider, BillingStore, Clock, IdentityProvider};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

pub(crate) fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        user_metadata: json!({ "full_name": "Test Pilot" }),
        app_metadata: json!({ "provider": "email" }),
    }
}

pub(crate) fn test_subscription(id: &str, customer_id: &str, status: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        status: status.to_string(),
        price_id: Some("price_basic".to_string()),
        quantity: Some(1),
        cancel_at_period_end: false,
        current_period_start: Some(1_700_000_000),
        current_period_end: Some(1_702_592_000),
        created: 1_700_000_000,
        ended_at: None,
        canceled_at: None,
        metadata: json!({}),
    }
}

// Failure toggles make a port call behave as if the backend were unreachable.
#[derive(Clone, Copy, Default)]
pub(crate) struct IdentityFailures {
    pub validate: bool,
    pub refresh: bool,
    pub sign_in: bool,
    pub sign_up: bool,
    pub sign_out: bool,
}

#[derive(Default)]
struct IdentityTables {
    access: HashMap<String, User>,
    refresh: HashMap<String, User>,
    accounts: HashMap<String, (String, User)>,
    calls: Vec<String>,
    issued: u64,
}

// In-memory identity provider with single-use refresh tokens.
#[derive(Clone)]
pub(crate) struct FakeIdentityProvider {
    tables: Arc<Mutex<IdentityTables>>,
    failures: IdentityFailures,
}

impl FakeIdentityProvider {
    pub(crate) fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(IdentityTables::default())),
            failures: IdentityFailures::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: IdentityFailures) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_access(&self, token: impl Into<String>, user: User) {
        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard.access.insert(token.into(), user);
    }

    pub(crate) fn insert_refresh(&self, token: impl Into<String>, user: User) {
        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard.refresh.insert(token.into(), user);
    }

    pub(crate) fn insert_account(&self, email: &str, password: &str, user: User) {
        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        let guard = self.tables.lock().expect("identity mutex poisoned");
        guard.calls.clone()
    }

    pub(crate) fn is_access_live(&self, token: &str) -> bool {
        let guard = self.tables.lock().expect("identity mutex poisoned");
        guard.access.contains_key(token)
    }

    fn record(&self, call: String) {
        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard.calls.push(call);
    }

    fn issue(&self, user: &User) -> CredentialPair {
        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard.issued += 1;
        let pair = CredentialPair {
            access_token: format!("access-{}", guard.issued),
            refresh_token: format!("refresh-{}", guard.issued),
        };
        guard.access.insert(pair.access_token.clone(), user.clone());
        guard.refresh.insert(pair.refresh_token.clone(), user.clone());
        pair
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn validate(&self, access_token: &str) -> Result<User, IdentityError> {
        self.record(format!("validate:{access_token}"));
        if self.failures.validate {
            return Err(IdentityError::Unavailable("validate failed".to_string()));
        }

        let guard = self.tables.lock().expect("identity mutex poisoned");
        guard
            .access
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("invalid JWT".to_string()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, IdentityError> {
        self.record(format!("refresh:{refresh_token}"));
        if self.failures.refresh {
            return Err(IdentityError::Unavailable("refresh failed".to_string()));
        }

        // Refresh tokens are consumed on first use.
        let user = {
            let mut guard = self.tables.lock().expect("identity mutex poisoned");
            guard.refresh.remove(refresh_token)
        }
        .ok_or_else(|| IdentityError::Rejected("Invalid Refresh Token".to_string()))?;

        let credentials = self.issue(&user);
        Ok(ProviderSession { credentials, user })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        self.record(format!("sign_in:{email}"));
        if self.failures.sign_in {
            return Err(IdentityError::Unavailable("sign in failed".to_string()));
        }

        let account = {
            let guard = self.tables.lock().expect("identity mutex poisoned");
            guard.accounts.get(email).cloned()
        };
        match account {
            Some((stored, user)) if stored == password => {
                let credentials = self.issue(&user);
                Ok(ProviderSession { credentials, user })
            }
            _ => Err(IdentityError::Rejected(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, IdentityError> {
        self.record(format!("sign_up:{email}"));
        if self.failures.sign_up {
            return Err(IdentityError::Unavailable("sign up failed".to_string()));
        }

        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        if guard.accounts.contains_key(email) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        let user = User {
            id: format!("user-{}", guard.accounts.len() + 1),
            email: Some(email.to_string()),
            user_metadata: json!({ "full_name": full_name }),
            app_metadata: json!({ "provider": "email" }),
        };
        guard
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.record(format!("sign_out:{access_token}"));
        if self.failures.sign_out {
            return Err(IdentityError::Unavailable("sign out failed".to_string()));
        }

        let mut guard = self.tables.lock().expect("identity mutex poisoned");
        guard
            .access
            .remove(access_token)
            .map(|_| ())
            .ok_or_else(|| IdentityError::Rejected("invalid JWT".to_string()))
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct BillingFailures {
    pub create_customer: bool,
    pub checkout: bool,
    pub retrieve: bool,
}

#[derive(Default)]
struct BillingProviderTables {
    customers: Vec<(String, String)>,
    checkouts: Vec<CheckoutRequest>,
    subscriptions: HashMap<String, Subscription>,
}

// In-memory billing provider that records what it was asked to do.
#[derive(Clone)]
pub(crate) struct FakeBillingProvider {
    tables: Arc<Mutex<BillingProviderTables>>,
    failures: BillingFailures,
    checkout_url: Option<String>,
}

impl FakeBillingProvider {
    pub(crate) fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(BillingProviderTables::default())),
            failures: BillingFailures::default(),
            checkout_url: Some("https://checkout.example.com/c/pay/cs_test_1".to_string()),
        }
    }

    pub(crate) fn with_failures(mut self, failures: BillingFailures) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn without_checkout_url(mut self) -> Self {
        self.checkout_url = None;
        self
    }

    pub(crate) fn insert_subscription(&self, subscription: Subscription) {
        let mut guard = self.tables.lock().expect("billing mutex poisoned");
        guard
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    pub(crate) fn created_customers(&self) -> Vec<(String, String)> {
        let guard = self.tables.lock().expect("billing mutex poisoned");
        guard.customers.clone()
    }

    pub(crate) fn checkouts(&self) -> Vec<CheckoutRequest> {
        let guard = self.tables.lock().expect("billing mutex poisoned");
        guard.checkouts.clone()
    }
}

#[async_trait]
impl BillingProvider for FakeBillingProvider {
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError> {
        if self.failures.create_customer {
            return Err(BillingError::Provider("create customer failed".to_string()));
        }

        let mut guard = self.tables.lock().expect("billing mutex poisoned");
        let customer_id = format!("cus_{}", guard.customers.len() + 1);
        guard
            .customers
            .push((email.to_string(), user_id.to_string()));
        Ok(customer_id)
    }

    async fn create_checkout_session(
        &self,
        req: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        if self.failures.checkout {
            return Err(BillingError::Provider("checkout failed".to_string()));
        }

        let mut guard = self.tables.lock().expect("billing mutex poisoned");
        guard.checkouts.push(req);
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: self.checkout_url.clone(),
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, BillingError> {
        if self.failures.retrieve {
            return Err(BillingError::Provider("retrieve failed".to_string()));
        }

        let guard = self.tables.lock().expect("billing mutex poisoned");
        guard
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| BillingError::NotFound {
                entity: "subscription",
                id: subscription_id.to_string(),
            })
    }
}

#[derive(Default)]
struct StoreTables {
    products: HashMap<String, Product>,
    prices: HashMap<String, Price>,
    customers: HashMap<String, String>,
    subscriptions: HashMap<String, (String, Subscription)>,
    listed_statuses: Vec<Vec<String>>,
}

// In-memory billing mirror; `failing` makes every call a storage failure.
#[derive(Clone)]
pub(crate) struct RecordingBillingStore {
    tables: Arc<Mutex<StoreTables>>,
    failing: bool,
}

impl RecordingBillingStore {
    pub(crate) fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(StoreTables::default())),
            failing: false,
        }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn insert_test_customer(&self, user_id: &str, customer_id: &str) {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard
            .customers
            .insert(user_id.to_string(), customer_id.to_string());
    }

    pub(crate) fn product(&self, id: &str) -> Option<Product> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        guard.products.get(id).cloned()
    }

    pub(crate) fn price(&self, id: &str) -> Option<Price> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        guard.prices.get(id).cloned()
    }

    pub(crate) fn subscription(&self, id: &str) -> Option<(String, Subscription)> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        guard.subscriptions.get(id).cloned()
    }

    // Status sets requested by each listing, in call order.
    pub(crate) fn listed_statuses(&self) -> Vec<Vec<String>> {
        let guard = self.tables.lock().expect("store mutex poisoned");
        guard.listed_statuses.clone()
    }

    fn check(&self) -> Result<(), BillingError> {
        if self.failing {
            return Err(BillingError::Storage("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingStore for RecordingBillingStore {
    async fn upsert_product(&self, product: &Product) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn upsert_price(&self, price: &Price) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.prices.insert(price.id.clone(), price.clone());
        Ok(())
    }

    async fn delete_product(&self, product_id: &str) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.products.remove(product_id);
        Ok(())
    }

    async fn delete_price(&self, price_id: &str) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.prices.remove(price_id);
        Ok(())
    }

    async fn find_customer(&self, user_id: &str) -> Result<Option<String>, BillingError> {
        self.check()?;
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard.customers.get(user_id).cloned())
    }

    async fn insert_customer(&self, user_id: &str, customer_id: &str) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard
            .customers
            .insert(user_id.to_string(), customer_id.to_string());
        Ok(())
    }

    async fn find_user_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, BillingError> {
        self.check()?;
        let guard = self.tables.lock().expect("store mutex poisoned");
        Ok(guard
            .customers
            .iter()
            .find(|(_, customer)| customer.as_str() == customer_id)
            .map(|(user, _)| user.clone()))
    }

    async fn upsert_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<(), BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard.subscriptions.insert(
            subscription.id.clone(),
            (user_id.to_string(), subscription.clone()),
        );
        Ok(())
    }

    async fn list_subscriptions(
        &self,
        user_id: &str,
        statuses: &[&str],
    ) -> Result<Vec<SubscriptionDetails>, BillingError> {
        self.check()?;
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        guard
            .listed_statuses
            .push(statuses.iter().map(|status| status.to_string()).collect());
        let mut active: Vec<SubscriptionDetails> = guard
            .subscriptions
            .values()
            .filter(|(owner, sub)| owner == user_id && statuses.contains(&sub.status.as_str()))
            .map(|(_, sub)| {
                let price = sub
                    .price_id
                    .as_ref()
                    .and_then(|id| guard.prices.get(id).cloned());
                let product = price
                    .as_ref()
                    .and_then(|price| guard.products.get(&price.product_id).cloned());
                SubscriptionDetails {
                    subscription: sub.clone(),
                    price,
                    product,
                }
            })
            .collect();
        active.sort_by(|a, b| a.subscription.id.cmp(&b.subscription.id));
        Ok(active)
    }
}

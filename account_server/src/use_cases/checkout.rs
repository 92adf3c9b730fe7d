use url::form_urlencoded;

use crate::domain::entities::CheckoutRequest;
use crate::domain::errors::CheckoutError;
use crate::domain::ports::{BillingProvider, BillingStore};

// Plan selection coming from the pricing page.
#[derive(Clone, Debug)]
pub struct CheckoutSelection {
    pub plan: String,
    pub price_id: String,
    pub lang: String,
}

// Starts a subscription checkout for an authenticated user and returns the
// hosted checkout URL to redirect to.
pub struct CheckoutUseCase<'a, B: ?Sized, S: ?Sized> {
    pub billing: &'a B,
    pub store: &'a S,
    pub site_url: &'a str,
}

impl<B, S> CheckoutUseCase<'_, B, S>
where
    B: BillingProvider + ?Sized,
    S: BillingStore + ?Sized,
{
    pub async fn execute(
        &self,
        user_id: &str,
        selection: &CheckoutSelection,
    ) -> Result<String, CheckoutError> {
        let customer_id = self
            .store
            .find_customer(user_id)
            .await?
            .ok_or(CheckoutError::CustomerNotFound)?;

        let site = self.site_url.trim_end_matches('/');
        let session = self
            .billing
            .create_checkout_session(CheckoutRequest {
                customer_id,
                price_id: selection.price_id.clone(),
                plan: selection.plan.clone(),
                user_id: user_id.to_string(),
                success_url: format!("{site}/{}/profile?success=true", selection.lang),
                cancel_url: format!("{site}/{}/pricing?canceled=true", selection.lang),
            })
            .await?;

        session.url.ok_or(CheckoutError::MissingUrl)
    }
}

// Login page URL that returns the visitor to this checkout after sign-in.
pub fn login_redirect_url(site_url: &str, selection: &CheckoutSelection) -> String {
    let site = site_url.trim_end_matches('/');
    let checkout_query = form_urlencoded::Serializer::new(String::new())
        .append_pair("plan", &selection.plan)
        .append_pair("price", &selection.price_id)
        .finish();
    let back_to = format!("{site}/checkout?{checkout_query}");
    let login_query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectUrl", &back_to)
        .finish();

    format!("{site}/{}/login?{login_query}", selection.lang)
}

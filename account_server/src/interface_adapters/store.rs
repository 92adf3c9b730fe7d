use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::entities::{Price, Product, Subscription, SubscriptionDetails};
use crate::domain::errors::BillingError;
use crate::domain::ports::BillingStore;

// PostgreSQL-backed mirror of billing data. Metadata columns hold JSON text.
#[derive(Clone)]
pub struct PostgresBillingStore {
    pub db: PgPool,
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    async fn upsert_product(&self, product: &Product) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, active, name, description, image, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                active = EXCLUDED.active,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(&product.id)
        .bind(product.active)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.metadata.to_string())
        .execute(&self.db)
        .await
        .map_err(storage_error)?;

        tracing::info!(product_id = %product.id, "product upserted");
        Ok(())
    }

    async fn upsert_price(&self, price: &Price) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO prices
                (id, product_id, active, currency, unit_amount, price_type,
                 billing_interval, interval_count, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                product_id = EXCLUDED.product_id,
                active = EXCLUDED.active,
                currency = EXCLUDED.currency,
                unit_amount = EXCLUDED.unit_amount,
                price_type = EXCLUDED.price_type,
                billing_interval = EXCLUDED.billing_interval,
                interval_count = EXCLUDED.interval_count,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(&price.id)
        .bind(&price.product_id)
        .bind(price.active)
        .bind(&price.currency)
        .bind(price.unit_amount)
        .bind(&price.price_type)
        .bind(&price.interval)
        .bind(price.interval_count)
        .bind(price.metadata.to_string())
        .execute(&self.db)
        .await
        .map_err(storage_error)?;

        tracing::info!(price_id = %price.id, "price upserted");
        Ok(())
    }

    async fn delete_product(&self, product_id: &str) -> Result<(), BillingError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await
            .map_err(storage_error)?;

        tracing::info!(product_id, "product deleted");
        Ok(())
    }

    async fn delete_price(&self, price_id: &str) -> Result<(), BillingError> {
        sqlx::query("DELETE FROM prices WHERE id = $1")
            .bind(price_id)
            .execute(&self.db)
            .await
            .map_err(storage_error)?;

        tracing::info!(price_id, "price deleted");
        Ok(())
    }

    async fn find_customer(&self, user_id: &str) -> Result<Option<String>, BillingError> {
        sqlx::query_scalar::<_, String>(
            "SELECT billing_customer_id FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(storage_error)
    }

    async fn insert_customer(&self, user_id: &str, customer_id: &str) -> Result<(), BillingError> {
        sqlx::query("INSERT INTO customers (user_id, billing_customer_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(customer_id)
            .execute(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(())
    }

    async fn find_user_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, BillingError> {
        sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM customers WHERE billing_customer_id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await
        .map_err(storage_error)
    }

    async fn upsert_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<(), BillingError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, user_id, customer_id, status, price_id, quantity, cancel_at_period_end,
                 current_period_start, current_period_end, created, ended_at, canceled_at,
                 metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                customer_id = EXCLUDED.customer_id,
                status = EXCLUDED.status,
                price_id = EXCLUDED.price_id,
                quantity = EXCLUDED.quantity,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                created = EXCLUDED.created,
                ended_at = EXCLUDED.ended_at,
                canceled_at = EXCLUDED.canceled_at,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(&subscription.id)
        .bind(user_id)
        .bind(&subscription.customer_id)
        .bind(&subscription.status)
        .bind(&subscription.price_id)
        .bind(subscription.quantity)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.created)
        .bind(subscription.ended_at)
        .bind(subscription.canceled_at)
        .bind(subscription.metadata.to_string())
        .execute(&self.db)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn list_subscriptions(
        &self,
        user_id: &str,
        statuses: &[&str],
    ) -> Result<Vec<SubscriptionDetails>, BillingError> {
        let statuses: Vec<String> = statuses.iter().map(|status| status.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT
                s.id, s.customer_id, s.status, s.price_id, s.quantity, s.cancel_at_period_end,
                s.current_period_start, s.current_period_end, s.created, s.ended_at,
                s.canceled_at, s.metadata,
                p.id AS price_row_id, p.product_id, p.active AS price_active, p.currency,
                p.unit_amount, p.price_type, p.billing_interval, p.interval_count,
                p.metadata AS price_metadata,
                pr.id AS product_row_id, pr.active AS product_active, pr.name,
                pr.description, pr.image, pr.metadata AS product_metadata
            FROM subscriptions s
            LEFT JOIN prices p ON p.id = s.price_id
            LEFT JOIN products pr ON pr.id = p.product_id
            WHERE s.user_id = $1 AND s.status = ANY($2)
            ORDER BY s.id
            "#,
        )
        .bind(user_id)
        .bind(&statuses)
        .fetch_all(&self.db)
        .await
        .map_err(storage_error)?;

        rows.iter()
            .map(subscription_details_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(storage_error)
    }
}

fn subscription_details_from_row(row: &PgRow) -> Result<SubscriptionDetails, sqlx::Error> {
    let subscription = Subscription {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        status: row.try_get("status")?,
        price_id: row.try_get("price_id")?,
        quantity: row.try_get("quantity")?,
        cancel_at_period_end: row.try_get("cancel_at_period_end")?,
        current_period_start: row.try_get("current_period_start")?,
        current_period_end: row.try_get("current_period_end")?,
        created: row.try_get("created")?,
        ended_at: row.try_get("ended_at")?,
        canceled_at: row.try_get("canceled_at")?,
        metadata: metadata_from_text(row.try_get("metadata")?),
    };

    let price = match row.try_get::<Option<String>, _>("price_row_id")? {
        Some(id) => Some(Price {
            id,
            product_id: row.try_get("product_id")?,
            active: row.try_get("price_active")?,
            currency: row.try_get("currency")?,
            unit_amount: row.try_get("unit_amount")?,
            price_type: row.try_get("price_type")?,
            interval: row.try_get("billing_interval")?,
            interval_count: row.try_get("interval_count")?,
            metadata: metadata_from_text(row.try_get("price_metadata")?),
        }),
        None => None,
    };

    let product = match row.try_get::<Option<String>, _>("product_row_id")? {
        Some(id) => Some(Product {
            id,
            active: row.try_get("product_active")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            metadata: metadata_from_text(row.try_get("product_metadata")?),
        }),
        None => None,
    };

    Ok(SubscriptionDetails {
        subscription,
        price,
        product,
    })
}

fn metadata_from_text(raw: Option<String>) -> Value {
    raw.and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| Value::Object(Default::default()))
}

fn storage_error(err: sqlx::Error) -> BillingError {
    BillingError::Storage(err.to_string())
}

//! Order repository.
//!
//! Lifecycle transitions are conditional single-statement updates. When the
//! update matches no row, the order is re-read only to report which
//! precondition failed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use horologe_core::{
    FulfillmentStage, LineItem, OrderId, PaymentResult, Price, ShippingAddress, UserId,
};

use super::RepositoryError;
use crate::models::{NewOrder, OrderRecord, Transition};

const ORDER_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, total_price, \
                             paid_at, payment_result, delivered_at, fulfillment_stage, \
                             created_at, updated_at";

/// Order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError>;

    /// A customer's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError>;

    /// Every order, newest first.
    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError>;

    /// Record a payment, overwriting any earlier one. `None` if absent.
    async fn mark_paid(
        &self,
        id: OrderId,
        payment: PaymentResult,
        at: DateTime<Utc>,
    ) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Mark a paid, undelivered order as delivered.
    async fn mark_delivered(
        &self,
        id: OrderId,
        at: DateTime<Utc>,
    ) -> Result<Transition, RepositoryError>;

    /// Set the fulfillment stage of an undelivered order.
    async fn set_stage(
        &self,
        id: OrderId,
        stage: FulfillmentStage,
    ) -> Result<Transition, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Sum of `total_price` over paid orders.
    async fn paid_revenue(&self) -> Result<Decimal, RepositoryError>;

    /// The `limit` most recent orders, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<OrderRecord>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    items: Json<Vec<LineItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    total_price: Price,
    paid_at: Option<DateTime<Utc>>,
    payment_result: Option<Json<PaymentResult>>,
    delivered_at: Option<DateTime<Utc>>,
    fulfillment_stage: FulfillmentStage,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            total_price: row.total_price,
            paid_at: row.paid_at,
            payment_result: row.payment_result.map(|json| json.0),
            delivered_at: row.delivered_at,
            fulfillment_stage: row.fulfillment_stage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL`-backed [`OrderRepository`].
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Work out why a conditional update matched nothing.
    async fn classify_miss(&self, id: OrderId) -> Result<Transition, RepositoryError> {
        Ok(match self.get(id).await? {
            None => Transition::NotFound,
            Some(order) if order.is_delivered() => Transition::AlreadyDelivered,
            Some(order) if !order.is_paid() => Transition::NotPaid,
            // Paid between the update and the re-read
            Some(order) => {
                return Err(RepositoryError::Conflict(format!(
                    "order {} changed concurrently",
                    order.id
                )));
            }
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.customer_order
                (user_id, items, shipping_address, payment_method, total_price,
                 payment_result, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(&order.payment_method)
        .bind(order.total_price)
        .bind(order.payment_result.as_ref().map(Json))
        .bind(order.paid_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_paid(
        &self,
        id: OrderId,
        payment: PaymentResult,
        at: DateTime<Utc>,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.customer_order
            SET paid_at = $2, payment_result = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(at)
        .bind(Json(&payment))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn mark_delivered(
        &self,
        id: OrderId,
        at: DateTime<Utc>,
    ) -> Result<Transition, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.customer_order
            SET delivered_at = $2, fulfillment_stage = 'delivered', updated_at = NOW()
            WHERE id = $1 AND paid_at IS NOT NULL AND delivered_at IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Transition::Applied(row.into())),
            None => self.classify_miss(id).await,
        }
    }

    async fn set_stage(
        &self,
        id: OrderId,
        stage: FulfillmentStage,
    ) -> Result<Transition, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.customer_order
            SET fulfillment_stage = $2, updated_at = NOW()
            WHERE id = $1 AND delivered_at IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(stage)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Transition::Applied(row.into())),
            None => match self.get(id).await? {
                None => Ok(Transition::NotFound),
                Some(_) => Ok(Transition::AlreadyDelivered),
            },
        }
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer_order")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn paid_revenue(&self) -> Result<Decimal, RepositoryError> {
        let revenue: Decimal = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(total_price), 0)
            FROM shop.customer_order
            WHERE paid_at IS NOT NULL
            ",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.customer_order
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

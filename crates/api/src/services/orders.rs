//! Order lifecycle service.
//!
//! Validates order creation, enforces ownership, and drives the
//! paid/delivered transitions. Every storage call is bounded by the
//! configured timeout.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use horologe_core::{
    CreateOrderRequest, DashboardSummary, FulfillmentStage, MarkPaidRequest, Order, OrderId,
    PaymentResult, Price, RecentOrder,
};

use crate::db::{Repositories, RepositoryError, with_timeout};
use crate::images::ImageResolver;
use crate::models::{CurrentUser, NewOrder, OrderRecord, Transition};

/// How many orders the dashboard lists.
pub const RECENT_ORDER_LIMIT: i64 = 5;

/// Payer email recorded when a manual payment names nobody.
pub const FALLBACK_PAYER_EMAIL: &str = "admin@example.com";

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request is malformed or violates an order rule.
    #[error("{0}")]
    Validation(String),

    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The caller may not see or change this order.
    #[error("not authorized to access this order")]
    Forbidden,

    /// The order's current state does not allow the transition.
    #[error("{0}")]
    InvalidState(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Order operations over the configured repositories.
pub struct OrderService<'a> {
    repos: &'a Repositories,
    images: &'a ImageResolver,
    timeout: Duration,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories, images: &'a ImageResolver, timeout: Duration) -> Self {
        Self {
            repos,
            images,
            timeout,
        }
    }

    /// Place an order for `caller`.
    ///
    /// An order submitted with a payment result is created already paid.
    /// `total_price` is stored as submitted; a mismatch with the line items
    /// is logged, not corrected.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for an empty order, a zero quantity,
    /// line items adding up past `Price::MAX`, a blank payment method, or
    /// missing shipping fields. Nothing is stored
    /// in that case.
    #[instrument(skip(self, caller, request), fields(user_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        let computed = validate_create(&request)?;
        if computed != request.total_price {
            tracing::warn!(
                submitted = %request.total_price,
                computed = %computed,
                "order total differs from line items"
            );
        }

        let items = request
            .items
            .into_iter()
            .map(|mut item| {
                item.image_url = self.images.resolve(&item.image_url);
                item
            })
            .collect();
        let paid_at = request.payment_result.as_ref().map(|_| Utc::now());

        let order = NewOrder {
            user_id: caller.id,
            items,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method.trim().to_owned(),
            total_price: request.total_price,
            payment_result: request.payment_result,
            paid_at,
        };
        let record = with_timeout(self.timeout, self.repos.orders.create(order)).await?;

        tracing::info!(order_id = %record.id, total = %record.total_price, "order created");
        Ok(record.into_order())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if it does not exist and
    /// `OrderError::Forbidden` unless the caller owns it or is an admin.
    pub async fn get_by_id(&self, id: OrderId, caller: &CurrentUser) -> Result<Order, OrderError> {
        Ok(self.load_visible(id, caller).await?.into_order())
    }

    /// A customer's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if storage fails.
    pub async fn list_for_user(&self, caller: &CurrentUser) -> Result<Vec<Order>, OrderError> {
        let records = with_timeout(self.timeout, self.repos.orders.list_for_user(caller.id)).await?;
        Ok(records.into_iter().map(OrderRecord::into_order).collect())
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` unless the caller is an admin.
    pub async fn list_all(&self, caller: &CurrentUser) -> Result<Vec<Order>, OrderError> {
        require_admin(caller)?;
        let records = with_timeout(self.timeout, self.repos.orders.list_all()).await?;
        Ok(records.into_iter().map(OrderRecord::into_order).collect())
    }

    /// Record a manual payment.
    ///
    /// Missing fields get defaults: a generated `manual-payment-<millis>`
    /// id, status `completed`, the current time, and the payer email from
    /// `email`, then `payer.email_address`, then [`FALLBACK_PAYER_EMAIL`].
    /// Paying again overwrites the earlier payment.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist and
    /// `OrderError::Forbidden` unless the caller owns it or is an admin.
    #[instrument(skip(self, caller, request), fields(user_id = %caller.id))]
    pub async fn mark_paid(
        &self,
        id: OrderId,
        caller: &CurrentUser,
        request: MarkPaidRequest,
    ) -> Result<Order, OrderError> {
        self.load_visible(id, caller).await?;

        let now = Utc::now();
        let payment = PaymentResult {
            external_id: non_blank(request.id)
                .unwrap_or_else(|| format!("manual-payment-{}", now.timestamp_millis())),
            status: non_blank(request.status).unwrap_or_else(|| "completed".to_owned()),
            update_time: non_blank(request.update_time).unwrap_or_else(|| now.to_rfc3339()),
            payer_email: non_blank(request.email)
                .or_else(|| non_blank(request.payer.and_then(|p| p.email_address)))
                .unwrap_or_else(|| FALLBACK_PAYER_EMAIL.to_owned()),
        };

        let record = with_timeout(self.timeout, self.repos.orders.mark_paid(id, payment, now))
            .await?
            .ok_or(OrderError::NotFound(id))?;

        tracing::info!(order_id = %id, "order marked paid");
        Ok(record.into_order())
    }

    /// Mark a paid order as delivered.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` for non-admins, `NotFound` if absent,
    /// and `InvalidState` if the order is unpaid or already delivered.
    #[instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn mark_delivered(
        &self,
        id: OrderId,
        caller: &CurrentUser,
    ) -> Result<Order, OrderError> {
        require_admin(caller)?;

        let outcome =
            with_timeout(self.timeout, self.repos.orders.mark_delivered(id, Utc::now())).await?;
        let record = applied(id, outcome)?;

        tracing::info!(order_id = %id, "order delivered");
        Ok(record.into_order())
    }

    /// Set the fulfillment stage of an undelivered order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` for non-admins, `Validation` for an
    /// unknown stage name, and `InvalidState` for `Delivered` (which only
    /// the delivery transition may set) or an already delivered order.
    #[instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn set_status(
        &self,
        id: OrderId,
        caller: &CurrentUser,
        status: &str,
    ) -> Result<Order, OrderError> {
        require_admin(caller)?;

        let stage: FulfillmentStage = status
            .parse()
            .map_err(|e: horologe_core::UnknownStage| OrderError::Validation(e.to_string()))?;
        if stage == FulfillmentStage::Delivered {
            return Err(OrderError::InvalidState(
                "use the deliver action to mark an order delivered".to_owned(),
            ));
        }

        let outcome = with_timeout(self.timeout, self.repos.orders.set_stage(id, stage)).await?;
        let record = applied(id, outcome)?;

        tracing::info!(order_id = %id, stage = %stage, "fulfillment stage updated");
        Ok(record.into_order())
    }

    /// Store-wide totals and the most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` unless the caller is an admin.
    pub async fn dashboard_summary(
        &self,
        caller: &CurrentUser,
    ) -> Result<DashboardSummary, OrderError> {
        require_admin(caller)?;

        let (total_products, total_orders, total_users, total_revenue, recent) = tokio::try_join!(
            with_timeout(self.timeout, self.repos.products.count()),
            with_timeout(self.timeout, self.repos.orders.count()),
            with_timeout(self.timeout, self.repos.users.count_customers()),
            with_timeout(self.timeout, self.repos.orders.paid_revenue()),
            with_timeout(self.timeout, self.repos.orders.recent(RECENT_ORDER_LIMIT)),
        )?;

        let owners: BTreeSet<_> = recent.iter().map(|o| o.user_id).collect();
        let mut emails = std::collections::BTreeMap::new();
        for user_id in owners {
            if let Some(user) =
                with_timeout(self.timeout, self.repos.users.get_by_id(user_id)).await?
            {
                emails.insert(user_id, user.email.into_inner());
            }
        }

        let recent_orders = recent
            .into_iter()
            .map(|order| RecentOrder {
                id: order.id,
                user_id: order.user_id,
                customer_email: emails.get(&order.user_id).cloned(),
                total_amount: order.total_price,
                date: order.created_at,
                status: order.state(),
            })
            .collect();

        Ok(DashboardSummary {
            total_products,
            total_orders,
            total_users,
            total_revenue,
            recent_orders,
        })
    }

    async fn load_visible(
        &self,
        id: OrderId,
        caller: &CurrentUser,
    ) -> Result<OrderRecord, OrderError> {
        let record = with_timeout(self.timeout, self.repos.orders.get(id))
            .await?
            .ok_or(OrderError::NotFound(id))?;
        if !caller.is_admin && !record.is_owned_by(caller.id) {
            return Err(OrderError::Forbidden);
        }
        Ok(record)
    }
}

/// Check a new order and return the sum of its line items.
fn validate_create(request: &CreateOrderRequest) -> Result<Price, OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::Validation("No order items".to_owned()));
    }
    if let Some(item) = request.items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::Validation(format!(
            "quantity for {} must be at least 1",
            item.name
        )));
    }
    let computed = request
        .items
        .iter()
        .try_fold(Price::ZERO, |total, item| {
            item.unit_price
                .checked_times(item.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
        })
        .ok_or_else(|| {
            OrderError::Validation(format!("order total exceeds the maximum of {}", Price::MAX))
        })?;
    if request.payment_method.trim().is_empty() {
        return Err(OrderError::Validation(
            "payment method is required".to_owned(),
        ));
    }
    let missing = request.shipping_address.missing_fields();
    if !missing.is_empty() {
        return Err(OrderError::Validation(format!(
            "shipping address is missing: {}",
            missing.join(", ")
        )));
    }
    Ok(computed)
}

fn require_admin(caller: &CurrentUser) -> Result<(), OrderError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}

fn applied(id: OrderId, outcome: Transition) -> Result<OrderRecord, OrderError> {
    match outcome {
        Transition::Applied(record) => Ok(record),
        Transition::NotFound => Err(OrderError::NotFound(id)),
        Transition::AlreadyDelivered => Err(OrderError::InvalidState(
            "Order has already been delivered".to_owned(),
        )),
        Transition::NotPaid => Err(OrderError::InvalidState(
            "Order must be paid before it can be delivered".to_owned(),
        )),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//! Order models.

use chrono::{DateTime, Utc};

use horologe_core::{
    FulfillmentStage, LineItem, Order, OrderId, OrderState, PaymentResult, Price,
    ShippingAddress, UserId,
};

/// An order as stored.
///
/// `paid_at` and `delivered_at` are the source of truth for the lifecycle;
/// `is_paid`, `is_delivered` and [`OrderState`] are derived from them, so
/// they can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Price,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub fulfillment_stage: FulfillmentStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> OrderState {
        OrderState::from_flags(self.is_paid(), self.is_delivered())
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Convert into the API representation.
    #[must_use]
    pub fn into_order(self) -> Order {
        let state = self.state();
        Order {
            id: self.id,
            user_id: self.user_id,
            items: self.items,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            total_price: self.total_price,
            is_paid: self.paid_at.is_some(),
            paid_at: self.paid_at,
            payment_result: self.payment_result,
            is_delivered: self.delivered_at.is_some(),
            delivered_at: self.delivered_at,
            fulfillment_stage: self.fulfillment_stage,
            state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A validated order ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Price,
    pub payment_result: Option<PaymentResult>,
    /// Set when the order is created already paid.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Outcome of a conditional lifecycle update.
///
/// Repositories apply the precondition and the write as one step and report
/// which precondition failed, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied(OrderRecord),
    NotFound,
    AlreadyDelivered,
    NotPaid,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn record() -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            id: OrderId::new(1),
            user_id: UserId::new(7),
            items: Vec::new(),
            shipping_address: ShippingAddress::default(),
            payment_method: "Cash on Delivery".into(),
            total_price: Price::new(Decimal::from(10)).unwrap_or(Price::ZERO),
            paid_at: None,
            payment_result: None,
            delivered_at: None,
            fulfillment_stage: FulfillmentStage::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_flags_follow_timestamps() {
        let mut order = record();
        assert_eq!(order.state(), OrderState::Created);

        order.paid_at = Some(Utc::now());
        assert_eq!(order.state(), OrderState::Paid);

        order.delivered_at = Some(Utc::now());
        let api = order.into_order();
        assert!(api.is_paid);
        assert!(api.is_delivered);
        assert_eq!(api.state, OrderState::Delivered);
    }

    #[test]
    fn test_ownership() {
        let order = record();
        assert!(order.is_owned_by(UserId::new(7)));
        assert!(!order.is_owned_by(UserId::new(8)));
    }
}

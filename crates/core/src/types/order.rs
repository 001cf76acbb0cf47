//! Order wire types shared by the API and its clients.
//!
//! Field names are camelCase on the wire. Request types accept the legacy
//! aliases older storefront builds still send (`orderItems`, `product`,
//! `price`, `image`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FulfillmentStage, OrderId, OrderState, Price, ProductId, UserId};

/// A product reference plus quantity and price at the time of ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Price,
    #[serde(alias = "image", default)]
    pub image_url: String,
    pub quantity: u32,
}

impl LineItem {
    /// `unit_price * quantity`, saturating at [`Price::MAX`].
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Where an order ships to, as captured by checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Record of a confirmed (manual) payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    #[serde(alias = "id")]
    pub external_id: String,
    pub status: String,
    #[serde(alias = "update_time")]
    pub update_time: String,
    #[serde(alias = "email_address")]
    pub payer_email: String,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(alias = "orderItems", default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: String,
    pub total_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
}

/// Body of `PUT /api/orders/{id}/pay`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "updateTime")]
    pub update_time: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub payer: Option<Payer>,
}

/// Nested payer object some payment confirmations carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payer {
    #[serde(default, alias = "emailAddress")]
    pub email_address: Option<String>,
}

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// An order as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Price,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub fulfillment_stage: FulfillmentStage,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the dashboard's recent orders list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: Option<String>,
    pub total_amount: Price,
    pub date: DateTime<Utc>,
    pub status: OrderState,
}

/// Body of `GET /api/admin/dashboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_users: i64,
    /// Sum over paid orders; unbounded, so not a [`Price`].
    pub total_revenue: Decimal,
    pub recent_orders: Vec<RecentOrder>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_legacy_names() {
        let body = r#"{
            "orderItems": [
                {"product": 3, "name": "Sport Black Watch", "price": 149.99, "image": "watch3.jpg", "quantity": 2}
            ],
            "shippingAddress": {"firstName": "Asha", "city": "Pune"},
            "paymentMethod": "Cash on Delivery",
            "totalPrice": 299.98
        }"#;
        let request: CreateOrderRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.items.len(), 1);
        let item = &request.items[0];
        assert_eq!(item.product_id, ProductId::new(3));
        assert_eq!(item.image_url, "watch3.jpg");
        assert_eq!(item.subtotal(), request.total_price);
        assert!(request.payment_result.is_none());
    }

    #[test]
    fn test_missing_items_defaults_to_empty() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"totalPrice": 0}"#).unwrap();
        assert!(request.items.is_empty());
    }

    #[test]
    fn test_missing_address_fields() {
        let address = ShippingAddress {
            first_name: "Asha".into(),
            city: "Pune".into(),
            ..ShippingAddress::default()
        };
        assert_eq!(address.missing_fields(), vec!["address", "postalCode", "country"]);
    }

    #[test]
    fn test_mark_paid_request_reads_nested_payer() {
        let body = r#"{"id": "txn-1", "update_time": "2025-01-01T00:00:00Z", "payer": {"email_address": "p@x.io"}}"#;
        let request: MarkPaidRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.id.as_deref(), Some("txn-1"));
        assert_eq!(
            request.payer.and_then(|p| p.email_address).as_deref(),
            Some("p@x.io")
        );
        assert!(request.email.is_none());
    }
}

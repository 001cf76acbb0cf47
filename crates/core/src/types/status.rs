//! Status enums for orders and products.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical lifecycle state of an order.
///
/// Derived from the paid/delivered timestamps; never stored on its own.
/// Serializes to the dashboard display labels, so `Created` reads as
/// `"Pending"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Placed, awaiting payment.
    #[serde(rename = "Pending")]
    Created,
    /// Payment recorded, not yet delivered.
    Paid,
    /// Delivered to the customer (always paid first).
    Delivered,
}

impl OrderState {
    /// Derive the state from the payment and delivery flags.
    ///
    /// Delivery wins over payment, matching the precedence of the display
    /// status (Delivered > Paid > Pending).
    #[must_use]
    pub const fn from_flags(is_paid: bool, is_delivered: bool) -> Self {
        if is_delivered {
            Self::Delivered
        } else if is_paid {
            Self::Paid
        } else {
            Self::Created
        }
    }

    /// Human-readable label shown on dashboards.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created => "Pending",
            Self::Paid => "Paid",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Admin-maintained fulfillment progress of an order.
///
/// `Delivered` is only ever set by the delivery transition, which also
/// stamps `delivered_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.fulfillment_stage", rename_all = "snake_case")
)]
pub enum FulfillmentStage {
    #[default]
    #[serde(rename = "Order placed")]
    OrderPlaced,
    Packing,
    Shipped,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    Delivered,
}

impl FulfillmentStage {
    /// Every stage, in fulfillment order.
    pub const ALL: [Self; 5] = [
        Self::OrderPlaced,
        Self::Packing,
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// Label as shown to customers and admins.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "Order placed",
            Self::Packing => "Packing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a fulfillment stage name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fulfillment stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for FulfillmentStage {
    type Err = UnknownStage;

    /// Accepts the display label or its `snake_case` form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownStage(s.to_owned()))
    }
}

/// Product category in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_category", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Male,
    Female,
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(format!("invalid product category: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_precedence() {
        assert_eq!(OrderState::from_flags(false, false), OrderState::Created);
        assert_eq!(OrderState::from_flags(true, false), OrderState::Paid);
        assert_eq!(OrderState::from_flags(true, true), OrderState::Delivered);
        // Delivered wins even if the flags were ever inconsistent
        assert_eq!(OrderState::from_flags(false, true), OrderState::Delivered);
    }

    #[test]
    fn test_state_serializes_as_display_label() {
        assert_eq!(
            serde_json::to_string(&OrderState::Created).unwrap(),
            "\"Pending\""
        );
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!(
            "out for delivery".parse::<FulfillmentStage>().unwrap(),
            FulfillmentStage::OutForDelivery
        );
        assert_eq!(
            "order_placed".parse::<FulfillmentStage>().unwrap(),
            FulfillmentStage::OrderPlaced
        );
        assert_eq!(
            "SHIPPED".parse::<FulfillmentStage>().unwrap(),
            FulfillmentStage::Shipped
        );
        assert!("Lost in transit".parse::<FulfillmentStage>().is_err());
    }

    #[test]
    fn test_stage_json_uses_labels() {
        let json = serde_json::to_string(&FulfillmentStage::OrderPlaced).unwrap();
        assert_eq!(json, "\"Order placed\"");
    }

    #[test]
    fn test_category_round_trip_strings() {
        assert_eq!("Female".parse::<ProductCategory>().unwrap(), ProductCategory::Female);
        assert_eq!(ProductCategory::Male.to_string(), "male");
        assert!("kids".parse::<ProductCategory>().is_err());
    }
}

//! Checkout: turning the cart into an order.
//!
//! The total sent to the server is the cart's own `total_amount()`. The
//! cart is cleared only after the server has accepted the order; any
//! failure leaves it untouched so the shopper can retry.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use horologe_core::{CreateOrderRequest, LineItem, Order, Product, ProductId, ShippingAddress};

use crate::cart::{Cart, CartProduct};
use crate::storage::CartStorage;
use crate::store::{CartError, CartStore};

/// Errors that can occur while talking to the store API.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The configured API base URL is unusable.
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The order was placed but the cart could not be cleared.
    #[error("order placed but cart could not be cleared: {0}")]
    Cart(#[from] CartError),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build the order-creation request for the current cart.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no items.
pub fn build_order_request(
    cart: &Cart,
    shipping_address: ShippingAddress,
    payment_method: impl Into<String>,
) -> Result<CreateOrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let items = cart
        .items()
        .iter()
        .map(|item| LineItem {
            product_id: item.product_id,
            name: item.name.clone(),
            unit_price: item.unit_price,
            image_url: item.image_url.clone(),
            quantity: item.quantity,
        })
        .collect();

    Ok(CreateOrderRequest {
        items,
        shipping_address,
        payment_method: payment_method.into(),
        total_price: cart.total_amount(),
        payment_result: None,
    })
}

/// Minimal client for the storefront endpoints checkout needs.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl StoreClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, CheckoutError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        })
    }

    /// Fetch a product and snapshot it for the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the request fails or the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<CartProduct, CheckoutError> {
        let url = self.base_url.join(&format!("api/products/{id}"))?;
        let response = self.http.get(url).send().await?;
        let product: Product = Self::parse(response).await?;

        Ok(CartProduct {
            product_id: product.id,
            name: product.name,
            unit_price: product.price,
            image_url: product.image_url,
        })
    }

    /// Place an order for everything in the cart, then clear it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart, `Rejected` if
    /// the server refuses the order, and `Http` for transport failures. The
    /// cart is only cleared when the server returns the created order.
    pub async fn place_order<S: CartStorage>(
        &self,
        store: &mut CartStore<S>,
        shipping_address: ShippingAddress,
        payment_method: &str,
    ) -> Result<Order, CheckoutError> {
        let request = build_order_request(store.cart(), shipping_address, payment_method)?;
        let url = self.base_url.join("api/orders")?;

        let mut builder = self.http.post(url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let order: Order = Self::parse(builder.send().await?).await?;

        tracing::info!(order_id = %order.id, total = %order.total_price, "order placed");
        store.clear_cart()?;
        Ok(order)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CheckoutError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(CheckoutError::Rejected { status, message })
    }
}

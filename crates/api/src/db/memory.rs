//! In-memory storage backend.
//!
//! Implements every repository trait over plain collections behind one
//! `RwLock`. Used when no database is configured and by the test suites.
//! Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use horologe_core::{
    Email, FulfillmentStage, NewProduct, OrderId, PaymentResult, ProductId, ProductUpdate, UserId,
};

use super::{OrderRepository, ProductRepository, RepositoryError, TokenRepository, UserRepository};
use crate::models::{
    NewOrder, NewUser, OrderRecord, ProductFilter, ProductRecord, ProfileChanges, Transition, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    tokens: HashMap<String, (UserId, DateTime<Utc>)>,
    products: BTreeMap<ProductId, ProductRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
    last_user_id: i32,
    last_product_id: i32,
    last_order_id: i32,
}

fn newest_first(mut orders: Vec<OrderRecord>) -> Vec<OrderRecord> {
    orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    orders
}

/// In-memory implementation of all repositories.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let record = User {
            id: UserId::new(tables.last_user_id),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .insert(record.id, (record.clone(), user.password_hash));
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|(user, _)| user.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.get_password_hash(email).await?.map(|(user, _)| user))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some((user, hash)) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(password_hash) = changes.password_hash {
            *hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|(user, _)| {
            user.is_admin = is_admin;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn count_customers(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.users.values().filter(|(u, _)| !u.is_admin).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.tokens.contains_key(token_hash) {
            return Err(RepositoryError::Conflict("token already exists".to_owned()));
        }
        tables
            .tokens
            .insert(token_hash.to_owned(), (user_id, expires_at));
        Ok(())
    }

    async fn find_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(token_hash)
            .filter(|(_, expires_at)| *expires_at > now)
            .and_then(|(user_id, _)| tables.users.get(user_id))
            .map(|(user, _)| user.clone()))
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tokens.remove(token_hash).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(u64::try_from(before - tables.tokens.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<ProductRecord>, i64), RepositoryError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&ProductRecord> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: ProductId) -> Result<Option<ProductRecord>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<ProductRecord, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_product_id += 1;
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(tables.last_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
            is_bestseller: product.is_bestseller,
            in_stock: product.in_stock,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<ProductRecord>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(image) = update.image {
            product.image = image;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(is_bestseller) = update.is_bestseller {
            product.is_bestseller = is_bestseller;
        }
        if let Some(in_stock) = update.in_stock {
            product.in_stock = in_stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.products.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&order.user_id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} does not exist",
                order.user_id
            )));
        }

        tables.last_order_id += 1;
        let now = Utc::now();
        let record = OrderRecord {
            id: OrderId::new(tables.last_order_id),
            user_id: order.user_id,
            items: order.items,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            total_price: order.total_price,
            paid_at: order.paid_at,
            payment_result: order.payment_result,
            delivered_at: None,
            fulfillment_stage: FulfillmentStage::default(),
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError> {
        let tables = self.tables.read().await;
        let orders = tables
            .orders
            .values()
            .filter(|o| o.is_owned_by(user_id))
            .cloned()
            .collect();
        Ok(newest_first(orders))
    }

    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let tables = self.tables.read().await;
        let orders = tables.orders.values().cloned().collect();
        Ok(newest_first(orders))
    }

    async fn mark_paid(
        &self,
        id: OrderId,
        payment: PaymentResult,
        at: DateTime<Utc>,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.paid_at = Some(at);
            order.payment_result = Some(payment);
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn mark_delivered(
        &self,
        id: OrderId,
        at: DateTime<Utc>,
    ) -> Result<Transition, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(Transition::NotFound);
        };
        if order.is_delivered() {
            return Ok(Transition::AlreadyDelivered);
        }
        if !order.is_paid() {
            return Ok(Transition::NotPaid);
        }

        order.delivered_at = Some(at);
        order.fulfillment_stage = FulfillmentStage::Delivered;
        order.updated_at = Utc::now();
        Ok(Transition::Applied(order.clone()))
    }

    async fn set_stage(
        &self,
        id: OrderId,
        stage: FulfillmentStage,
    ) -> Result<Transition, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(Transition::NotFound);
        };
        if order.is_delivered() {
            return Ok(Transition::AlreadyDelivered);
        }

        order.fulfillment_stage = stage;
        order.updated_at = Utc::now();
        Ok(Transition::Applied(order.clone()))
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.orders.len()).unwrap_or(i64::MAX))
    }

    async fn paid_revenue(&self) -> Result<Decimal, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|o| o.is_paid())
            .map(|o| o.total_price.amount())
            .fold(Decimal::ZERO, Decimal::saturating_add))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<OrderRecord>, RepositoryError> {
        let orders = self.list_all().await?;
        Ok(orders
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use horologe_core::{LineItem, Price, ProductCategory, ShippingAddress};

    use super::*;

    fn rupees(amount: i64) -> Price {
        Price::new(Decimal::from(amount)).unwrap()
    }

    async fn customer(store: &MemoryStore, email: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                first_name: "Test".into(),
                last_name: String::new(),
                email: Email::parse(email).unwrap(),
                password_hash: "hash".into(),
                is_admin: false,
            },
        )
        .await
        .unwrap()
    }

    fn new_order(user_id: UserId, total: i64) -> NewOrder {
        NewOrder {
            user_id,
            items: vec![LineItem {
                product_id: ProductId::new(1),
                name: "Watch".into(),
                unit_price: rupees(total),
                image_url: String::new(),
                quantity: 1,
            }],
            shipping_address: ShippingAddress::default(),
            payment_method: "Cash on Delivery".into(),
            total_price: rupees(total),
            payment_result: None,
            paid_at: None,
        }
    }

    fn payment() -> PaymentResult {
        PaymentResult {
            external_id: "manual".into(),
            status: "completed".into(),
            update_time: Utc::now().to_rfc3339(),
            payer_email: "admin@example.com".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        customer(&store, "a@example.com").await;

        let result = UserRepository::create(
            &store,
            NewUser {
                first_name: "Other".into(),
                last_name: String::new(),
                email: Email::parse("A@Example.com").unwrap(),
                password_hash: "hash".into(),
                is_admin: false,
            },
        )
        .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delivery_requires_payment_and_happens_once() {
        let store = MemoryStore::new();
        let user = customer(&store, "a@example.com").await;
        let order = OrderRepository::create(&store, new_order(user.id, 100))
            .await
            .unwrap();

        let now = Utc::now();
        assert_eq!(
            store.mark_delivered(order.id, now).await.unwrap(),
            Transition::NotPaid
        );

        store.mark_paid(order.id, payment(), now).await.unwrap();
        let Transition::Applied(delivered) = store.mark_delivered(order.id, now).await.unwrap()
        else {
            panic!("expected delivery to apply");
        };
        assert_eq!(delivered.fulfillment_stage, FulfillmentStage::Delivered);

        assert_eq!(
            store.mark_delivered(order.id, now).await.unwrap(),
            Transition::AlreadyDelivered
        );
        assert_eq!(
            store.mark_delivered(OrderId::new(99), now).await.unwrap(),
            Transition::NotFound
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_deliveries_apply_once() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let user = customer(&store, "a@example.com").await;
        let order = OrderRepository::create(store.as_ref(), new_order(user.id, 100))
            .await
            .unwrap();
        let now = Utc::now();
        store.mark_paid(order.id, payment(), now).await.unwrap();

        let id = order.id;
        let deliver = |store: std::sync::Arc<MemoryStore>| {
            tokio::spawn(async move { store.mark_delivered(id, now).await.unwrap() })
        };
        let (first, second) = tokio::join!(deliver(store.clone()), deliver(store.clone()));
        let outcomes = [first.unwrap(), second.unwrap()];

        let applied = outcomes
            .iter()
            .filter(|o| matches!(o, Transition::Applied(_)))
            .count();
        let rejected = outcomes
            .iter()
            .filter(|o| **o == Transition::AlreadyDelivered)
            .count();
        assert_eq!((applied, rejected), (1, 1));
    }

    #[tokio::test]
    async fn test_paid_revenue_is_not_capped_at_a_single_price() {
        let store = MemoryStore::new();
        let user = customer(&store, "a@example.com").await;
        let now = Utc::now();
        for _ in 0..2 {
            let mut order = new_order(user.id, 1);
            order.total_price = Price::MAX;
            let order = OrderRepository::create(&store, order).await.unwrap();
            store.mark_paid(order.id, payment(), now).await.unwrap();
        }

        assert_eq!(
            store.paid_revenue().await.unwrap(),
            Price::MAX.amount() * Decimal::TWO
        );
    }

    #[tokio::test]
    async fn test_expired_tokens_do_not_resolve() {
        let store = MemoryStore::new();
        let user = customer(&store, "a@example.com").await;
        let now = Utc::now();

        store
            .insert("live", user.id, now + chrono::TimeDelta::hours(1))
            .await
            .unwrap();
        store
            .insert("dead", user.id, now - chrono::TimeDelta::hours(1))
            .await
            .unwrap();

        assert_eq!(store.find_user("live", now).await.unwrap(), Some(user));
        assert_eq!(store.find_user("dead", now).await.unwrap(), None);
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_product_listing_filters_and_pages() {
        let store = MemoryStore::new();
        for (name, category, bestseller) in [
            ("Classic Silver Watch", ProductCategory::Male, true),
            ("Gold Luxury Watch", ProductCategory::Female, true),
            ("Sport Black Watch", ProductCategory::Male, false),
        ] {
            ProductRepository::create(
                &store,
                NewProduct {
                    name: name.into(),
                    description: format!("{name} description"),
                    price: rupees(100),
                    image: String::new(),
                    category,
                    is_bestseller: bestseller,
                    in_stock: true,
                },
            )
            .await
            .unwrap();
        }

        let filter = ProductFilter {
            category: Some(ProductCategory::Male),
            ..ProductFilter::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 2);
        // Newest first
        assert_eq!(page[0].name, "Sport Black Watch");

        let filter = ProductFilter {
            bestseller_only: true,
            search: Some("GOLD".into()),
            ..ProductFilter::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Gold Luxury Watch");

        let filter = ProductFilter {
            offset: 2,
            limit: 2,
            ..ProductFilter::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }
}

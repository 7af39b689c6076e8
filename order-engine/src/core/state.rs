use parking_lot::Mutex;
use shared::order::OrderQuery;
use std::sync::Arc;
use std::time::Duration;

use super::Config;
use super::error::Result;
use crate::cart::CartCache;
use crate::catalog::{HttpProductApi, ProductApi, ProductCatalog};
use crate::notify::{NotificationDispatcher, NotificationSink, WebhookNotifier};
use crate::orders::{
    CheckoutService, LiveOrderSync, OrderBackend, OrderStateMachine, OrderStoreClient,
    RedbOrderStore,
};
use crate::storage::{LocalStorage, RedbLocalStorage};

const PRODUCT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Composition root: one instance of every service, wired once.
///
/// Cheap to clone; all services sit behind `Arc`.
///
/// | Field | Role |
/// |-------|------|
/// | orders | store client (writes, queries, feeds) |
/// | local | cart + offline order storage |
/// | checkout | storefront checkout over the shared cart |
/// | live_sync | admin view snapshot |
/// | catalog | cached product reads |
#[derive(Clone)]
pub struct EngineState {
    pub config: Config,
    pub orders: Arc<OrderStoreClient>,
    pub local: Arc<dyn LocalStorage>,
    pub checkout: Arc<CheckoutService>,
    pub live_sync: LiveOrderSync,
    pub catalog: Arc<ProductCatalog>,
}

impl EngineState {
    /// Open the on-disk stores under `work_dir` and wire every service
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let backend = Arc::new(RedbOrderStore::open(config.orders_db_path())?);
        let local = Arc::new(RedbLocalStorage::open(config.local_db_path())?);
        let api = Arc::new(HttpProductApi::new(
            &config.product_api_url,
            PRODUCT_API_TIMEOUT,
        )?);

        tracing::info!(work_dir = %config.work_dir, "Engine stores opened");
        Ok(Self::with_parts(config, backend, local, api))
    }

    /// Wire services over caller-supplied backends
    pub fn with_parts(
        config: &Config,
        backend: Arc<dyn OrderBackend>,
        local: Arc<dyn LocalStorage>,
        product_api: Arc<dyn ProductApi>,
    ) -> Self {
        let state_machine = OrderStateMachine::new(config.transition_policy);
        let orders = Arc::new(
            OrderStoreClient::new(backend, state_machine).with_notifier(build_notifier(config)),
        );

        let cart = Arc::new(Mutex::new(CartCache::load(local.clone())));
        let checkout = Arc::new(CheckoutService::new(orders.clone(), local.clone(), cart));
        let live_sync = LiveOrderSync::new(orders.clone());
        let catalog = Arc::new(ProductCatalog::new(product_api, config.product_cache_ttl()));

        Self {
            config: config.clone(),
            orders,
            local,
            checkout,
            live_sync,
            catalog,
        }
    }

    /// Query backing the admin live view
    pub fn admin_query(&self) -> OrderQuery {
        OrderQuery::new().limit(self.config.admin_order_limit)
    }

    /// Start the admin live view with [`admin_query`](Self::admin_query)
    pub async fn start_live_sync(&self) -> Result<()> {
        self.live_sync.start(self.admin_query()).await?;
        Ok(())
    }
}

/// Webhook dispatcher, or a disabled one when turned off or unbuildable
pub fn build_notifier(config: &Config) -> NotificationDispatcher {
    if !config.webhook_enabled {
        tracing::info!("Order notifications disabled");
        return NotificationDispatcher::disabled();
    }
    match WebhookNotifier::new(config.webhook_url.clone(), config.webhook_timeout()) {
        Ok(notifier) => {
            let sink: Arc<dyn NotificationSink> = Arc::new(notifier);
            NotificationDispatcher::new(Some(sink))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Webhook client unavailable, notifications disabled");
            NotificationDispatcher::disabled()
        }
    }
}

//! Shared application state for the hubSocket gateway.
//!
//! Wires the connection registry, push proxy, dispatcher and acceptor from a
//! validated config and the hub table. Startup errors are returned, not
//! panicked on.

use std::sync::Arc;
use std::time::Duration;

use hubsocket_core::error::Result;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::hub::{ConstructorFactory, HubFactory, HubRegistry};
use crate::obs::HubMetrics;
use crate::realtime::{ClientProxy, ConnectionRegistry, LoopSettings};
use crate::transport::Acceptor;

const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    acceptor: Acceptor,
    metrics: Arc<HubMetrics>,
}

impl AppState {
    /// Build application state with hubs constructed by their registered constructors.
    pub fn new(cfg: GatewayConfig, hubs: HubRegistry) -> Result<Self> {
        Self::with_factory(cfg, hubs, Arc::new(ConstructorFactory))
    }

    pub fn with_factory(
        cfg: GatewayConfig,
        hubs: HubRegistry,
        factory: Arc<dyn HubFactory>,
    ) -> Result<Self> {
        cfg.validate()?;

        if hubs.is_empty() {
            tracing::warn!("no hubs registered; every call will be dropped");
        }

        let metrics = Arc::new(HubMetrics::default());
        let registry = Arc::new(ConnectionRegistry::new());
        let clients = ClientProxy::new(
            Arc::clone(&registry),
            Duration::from_millis(cfg.dispatch.broadcast_send_timeout_ms),
        );
        let dispatcher = Arc::new(Dispatcher::new(
            hubs,
            factory,
            clients,
            Duration::from_millis(cfg.dispatch.hub_call_timeout_ms),
            Arc::clone(&metrics),
        ));
        let acceptor = Acceptor::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            LoopSettings::from_config(&cfg),
            cfg.connection.inbound_queue,
            Arc::clone(&metrics),
        );

        tracing::info!(hubs = ?dispatcher.registered_hubs(), "hub table ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                dispatcher,
                acceptor,
                metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    pub fn acceptor(&self) -> &Acceptor {
        &self.inner.acceptor
    }

    /// Push handle for code outside hub methods (e.g. background jobs).
    pub fn clients(&self) -> ClientProxy {
        self.inner.dispatcher.clients().clone()
    }

    pub fn metrics(&self) -> &HubMetrics {
        &self.inner.metrics
    }

    /// Dispose every registered connection and wait, up to `grace`, for their
    /// teardown to finish. Returns how many were still live at the deadline.
    pub async fn close_connections(&self, grace: Duration) -> usize {
        let conns = self.inner.registry.snapshot();
        tracing::info!(count = conns.len(), "closing live connections");
        for conn in conns {
            conn.dispose().await;
        }

        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let live = self.inner.acceptor.live_connections();
            if live == 0 || tokio::time::Instant::now() >= deadline {
                return live;
            }
            tokio::time::sleep(CLOSE_POLL_INTERVAL).await;
        }
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Point-in-time values rendered alongside the metric families.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![(
            "hubsocket_registry_connections",
            u64::try_from(self.inner.registry.len()).unwrap_or(u64::MAX),
        )]
    }
}

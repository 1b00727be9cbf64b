use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use tokio::time::{timeout, Duration, Instant};

use hubsocket_core::error::{HubSocketError, Result};
use hubsocket_core::protocol::Envelope;

use crate::hub::{Args, HubContext, HubDescriptor, HubFactory, HubRegistry, MethodEntry};
use crate::obs::HubMetrics;
use crate::realtime::{ClientProxy, Connection};

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a decodable envelope; dropped.
    DecodeError,
    /// Envelope without `methodName` (a stray reply); dropped.
    NotACall,
    /// No registered hub declares the method; dropped.
    Unmatched,
    /// Ran against `matched` hubs, `failed` of which reported an error.
    Dispatched { matched: usize, failed: usize },
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::DecodeError => "decode_error",
            DispatchOutcome::NotACall => "not_a_call",
            DispatchOutcome::Unmatched => "unmatched",
            DispatchOutcome::Dispatched { failed: 0, .. } => "ok",
            DispatchOutcome::Dispatched { .. } => "error",
        }
    }
}

/// Resolves inbound calls against the hub table and runs them.
pub struct Dispatcher {
    hubs: HubRegistry,
    factory: Arc<dyn HubFactory>,
    clients: ClientProxy,
    call_timeout: Duration,
    metrics: Arc<HubMetrics>,
}

impl Dispatcher {
    pub fn new(
        hubs: HubRegistry,
        factory: Arc<dyn HubFactory>,
        clients: ClientProxy,
        call_timeout: Duration,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            hubs,
            factory,
            clients,
            call_timeout,
            metrics,
        }
    }

    pub fn registered_hubs(&self) -> Vec<&'static str> {
        self.hubs.names()
    }

    pub fn clients(&self) -> &ClientProxy {
        &self.clients
    }

    /// Handle one completed message from `conn`.
    pub async fn dispatch_text(&self, conn: &Connection, text: &str) -> DispatchOutcome {
        let outcome = match Envelope::decode(text) {
            Ok(env) => self.dispatch_envelope(conn, &env, true).await,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "dropping malformed message");
                DispatchOutcome::DecodeError
            }
        };
        self.metrics.messages.inc(&[("outcome", outcome.as_str())]);
        outcome
    }

    /// Synthetic `OnConnected`/`OnDisconnected` call. Never replies; failures
    /// are logged and counted only.
    pub async fn dispatch_lifecycle(&self, conn: &Connection, method_name: &str) -> DispatchOutcome {
        self.dispatch_envelope(conn, &Envelope::lifecycle(method_name), false)
            .await
    }

    async fn dispatch_envelope(&self, conn: &Connection, env: &Envelope, reply: bool) -> DispatchOutcome {
        let Some(method_name) = env.method_name.as_deref() else {
            tracing::debug!(conn_id = %conn.id(), "ignoring envelope without methodName");
            return DispatchOutcome::NotACall;
        };

        let mut matched = 0usize;
        let mut failed = 0usize;

        for hub in self.hubs.hubs() {
            let Some(entry) = hub.resolve(method_name) else {
                continue;
            };
            matched += 1;

            let started = Instant::now();
            let result = self.invoke(hub, entry, conn, env).await;
            self.metrics.dispatch_duration.observe(
                &[("hub", hub.name()), ("method", entry.name())],
                started.elapsed(),
            );

            match result {
                Ok(Some(value)) if reply && !value.is_null() => {
                    let out = Envelope::reply(value, env.promise_id.clone());
                    if let Err(e) = conn.send(&out).await {
                        tracing::warn!(conn_id = %conn.id(), hub = hub.name(), method = entry.name(), error = %e, "reply not sent");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    failed += 1;
                    self.report_failure(conn, hub, entry, env, &e, reply).await;
                }
            }
        }

        if matched == 0 {
            tracing::debug!(conn_id = %conn.id(), method = method_name, "no hub declares method");
            return DispatchOutcome::Unmatched;
        }
        DispatchOutcome::Dispatched { matched, failed }
    }

    /// One hub attempt: instance, context, binding, bounded invocation.
    /// Panics inside the hub method are caught and reported like errors.
    async fn invoke(
        &self,
        hub: &HubDescriptor,
        entry: &MethodEntry,
        conn: &Connection,
        env: &Envelope,
    ) -> Result<Option<Value>> {
        let instance = self.factory.create(hub)?;
        let ctx = HubContext::new(conn.id(), self.clients.clone());
        let args = Args::bind(entry.params(), &env.data)?;

        let call = AssertUnwindSafe(entry.invoke(instance, ctx, args)).catch_unwind();
        match timeout(self.call_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(HubSocketError::Invocation(format!(
                "{}.{} panicked",
                hub.name(),
                entry.name()
            ))),
            Err(_) => Err(HubSocketError::Timeout(
                u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    async fn report_failure(
        &self,
        conn: &Connection,
        hub: &HubDescriptor,
        entry: &MethodEntry,
        env: &Envelope,
        err: &HubSocketError,
        push: bool,
    ) {
        let code = err.client_code().as_str();
        self.metrics.hub_errors.inc(&[
            ("hub", hub.name()),
            ("method", entry.name()),
            ("code", code),
        ]);
        tracing::warn!(conn_id = %conn.id(), hub = hub.name(), method = entry.name(), code, error = %err, "hub call failed");

        // Lifecycle calls have no caller to report to.
        if !push {
            return;
        }
        let out = Envelope::error(err, hub.name(), entry.name(), env.promise_id.clone());
        if let Err(e) = conn.send(&out).await {
            tracing::warn!(conn_id = %conn.id(), error = %e, "error push not sent");
        }
    }
}

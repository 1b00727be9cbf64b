use serde_json::{json, Value};

use hubsocket_core::error::{HubSocketError, Result};

use crate::hub::{Args, Hub, HubContext, MethodTable, ParamDescriptor};

/// Request/response sanity checks: echo, arithmetic, failure and latency.
#[derive(Default)]
pub struct EchoHub;

impl Hub for EchoHub {
    const NAME: &'static str = "EchoHub";

    fn methods(table: &mut MethodTable<Self>) {
        table
            .method("Echo", &[ParamDescriptor::required("text")], Self::echo)
            .method(
                "Add",
                &[ParamDescriptor::required("a"), ParamDescriptor::required("b")],
                Self::add,
            )
            .method("Fail", &[ParamDescriptor::optional("reason")], Self::fail)
            .method("Slow", &[ParamDescriptor::required("ms")], Self::slow)
            .method("OnConnected", &[], Self::on_connected)
            .method("OnDisconnected", &[], Self::on_disconnected);
    }
}

impl EchoHub {
    async fn echo(self, _ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let text: String = args.get("text")?;
        Ok(Some(Value::String(text)))
    }

    async fn add(self, _ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let a: i64 = args.get("a")?;
        let b: i64 = args.get("b")?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| HubSocketError::Invocation("integer overflow".into()))?;
        Ok(Some(json!(sum)))
    }

    async fn fail(self, _ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let reason: Option<String> = args.get("reason")?;
        Err(HubSocketError::Invocation(
            reason.unwrap_or_else(|| "failure requested".into()),
        ))
    }

    /// Sleeps `ms` milliseconds, then returns it.
    async fn slow(self, _ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let ms: u64 = args.get("ms")?;
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        Ok(Some(json!(ms)))
    }

    async fn on_connected(self, ctx: HubContext, _args: Args) -> Result<Option<Value>> {
        tracing::info!(conn_id = %ctx.connection_id(), peers = ctx.clients().connection_count(), "peer connected");
        Ok(None)
    }

    async fn on_disconnected(self, ctx: HubContext, _args: Args) -> Result<Option<Value>> {
        tracing::info!(conn_id = %ctx.connection_id(), "peer disconnected");
        Ok(None)
    }
}

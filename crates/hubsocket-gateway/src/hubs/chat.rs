use serde_json::{json, Value};

use hubsocket_core::error::Result;

use crate::hub::{Args, Hub, HubContext, MethodTable, ParamDescriptor};
use crate::realtime::ConnectionId;

/// Server push: broadcast to everyone, or whisper to one connection.
#[derive(Default)]
pub struct ChatHub;

impl Hub for ChatHub {
    const NAME: &'static str = "ChatHub";

    fn methods(table: &mut MethodTable<Self>) {
        table
            .method("Broadcast", &[ParamDescriptor::required("message")], Self::broadcast)
            .method(
                "Whisper",
                &[
                    ParamDescriptor::required("connectionId"),
                    ParamDescriptor::required("message"),
                ],
                Self::whisper,
            )
            .method("WhoAmI", &[], Self::who_am_i);
    }
}

impl ChatHub {
    /// Fire-and-forget: the caller sees the broadcast itself, not a reply.
    async fn broadcast(self, ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let message: String = args.get("message")?;
        let delivered = ctx
            .clients()
            .send_to_all(json!({
                "from": ctx.connection_id(),
                "message": message,
            }))
            .await?;
        tracing::debug!(conn_id = %ctx.connection_id(), delivered, "broadcast sent");
        Ok(None)
    }

    /// Replies with whether the target was still connected.
    async fn whisper(self, ctx: HubContext, args: Args) -> Result<Option<Value>> {
        let target: ConnectionId = args.get::<String>("connectionId")?.parse()?;
        let message: String = args.get("message")?;
        let delivered = ctx
            .clients()
            .send_to_connection(
                target,
                "Whisper",
                json!({ "from": ctx.connection_id(), "message": message }),
            )
            .await?;
        Ok(Some(json!(delivered)))
    }

    async fn who_am_i(self, ctx: HubContext, _args: Args) -> Result<Option<Value>> {
        Ok(Some(json!(ctx.connection_id())))
    }
}

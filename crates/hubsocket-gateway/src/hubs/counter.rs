use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use hubsocket_core::error::Result;

use crate::hub::{Args, Hub, HubContext, MethodTable};

/// Process-wide counter. Instances are per call; the count lives behind a
/// shared handle captured by the registered constructor.
#[derive(Clone)]
pub struct CounterHub {
    count: Arc<AtomicU64>,
}

impl CounterHub {
    pub fn shared() -> Self {
        Self {
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn increment(self, _ctx: HubContext, _args: Args) -> Result<Option<Value>> {
        let next = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Some(json!(next)))
    }

    async fn current(self, _ctx: HubContext, _args: Args) -> Result<Option<Value>> {
        Ok(Some(json!(self.count.load(Ordering::Relaxed))))
    }
}

impl Hub for CounterHub {
    const NAME: &'static str = "CounterHub";

    fn methods(table: &mut MethodTable<Self>) {
        table
            .method("Increment", &[], Self::increment)
            .method("Current", &[], Self::current);
    }
}

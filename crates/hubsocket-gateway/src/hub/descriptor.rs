use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use hubsocket_core::error::{HubSocketError, Result};

use crate::hub::HubContext;

/// Type-erased hub instance as produced by a `HubFactory`.
pub type HubInstance = Box<dyn Any + Send>;

/// Future returned by every registered method. `None` (or JSON null) means no reply.
pub type HubFuture = Pin<Box<dyn Future<Output = Result<Option<Value>>> + Send>>;

type Invoker = Arc<dyn Fn(HubInstance, HubContext, Args) -> HubFuture + Send + Sync>;
type Constructor = Arc<dyn Fn() -> HubInstance + Send + Sync>;

/// A server-side object whose methods peers call by name.
///
/// A fresh instance is built for every call, so state that must outlive a call
/// lives behind shared handles captured by the constructor.
pub trait Hub: Send + Sized + 'static {
    const NAME: &'static str;

    fn methods(table: &mut MethodTable<Self>);
}

/// One declared parameter, bound by exact (case-sensitive) field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub required: bool,
}

impl ParamDescriptor {
    pub const fn required(name: &'static str) -> Self {
        Self { name, required: true }
    }

    /// Binds to null when the field is absent.
    pub const fn optional(name: &'static str) -> Self {
        Self { name, required: false }
    }
}

/// Arguments bound from a call's `data`, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(&'static str, Value)>,
}

impl Args {
    /// Bind `data` against the declared parameters.
    ///
    /// Extra fields are ignored. A missing required parameter, or a `data`
    /// that is neither an object nor null, is a binding failure.
    pub fn bind(params: &[ParamDescriptor], data: &Value) -> Result<Self> {
        if params.is_empty() {
            return Ok(Self::default());
        }

        let fields = match data {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(HubSocketError::Binding(format!(
                    "expected an object of named arguments, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut values = Vec::with_capacity(params.len());
        for p in params {
            match fields.and_then(|f| f.get(p.name)) {
                Some(v) => values.push((p.name, v.clone())),
                None if p.required => {
                    return Err(HubSocketError::Binding(format!(
                        "missing required parameter '{}'",
                        p.name
                    )))
                }
                None => values.push((p.name, Value::Null)),
            }
        }
        Ok(Self { values })
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Convert one bound argument to the handler's parameter type.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let v = self
            .raw(name)
            .ok_or_else(|| HubSocketError::Binding(format!("no parameter named '{name}'")))?;
        serde_json::from_value(v.clone())
            .map_err(|e| HubSocketError::Binding(format!("parameter '{name}': {e}")))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A resolved method: declared parameters plus the erased invoker.
#[derive(Clone)]
pub struct MethodEntry {
    name: String,
    params: Vec<ParamDescriptor>,
    invoker: Invoker,
}

impl MethodEntry {
    /// Name as registered (original casing).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn invoke(&self, instance: HubInstance, ctx: HubContext, args: Args) -> HubFuture {
        (self.invoker)(instance, ctx, args)
    }
}

/// Builder passed to `Hub::methods`.
pub struct MethodTable<H> {
    methods: Vec<MethodEntry>,
    _hub: PhantomData<fn() -> H>,
}

impl<H: Hub> MethodTable<H> {
    fn new() -> Self {
        Self {
            methods: Vec::new(),
            _hub: PhantomData,
        }
    }

    pub fn method<F, Fut>(&mut self, name: &str, params: &[ParamDescriptor], handler: F) -> &mut Self
    where
        F: Fn(H, HubContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Value>>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let invoker: Invoker = Arc::new(move |instance: HubInstance, ctx: HubContext, args: Args| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let hub = instance.downcast::<H>().map_err(|_| {
                    HubSocketError::Internal(format!("factory returned a foreign instance for hub {}", H::NAME))
                })?;
                handler(*hub, ctx, args).await
            }) as HubFuture
        });

        self.methods.push(MethodEntry {
            name: name.to_string(),
            params: params.to_vec(),
            invoker,
        });
        self
    }
}

/// Everything the dispatcher knows about one hub type.
pub struct HubDescriptor {
    name: &'static str,
    constructor: Constructor,
    methods: HashMap<String, MethodEntry>,
}

impl HubDescriptor {
    /// Build the method table for `H`. Two methods whose names differ only
    /// by case are rejected: lookup is case-insensitive.
    pub fn build<H, C>(constructor: C) -> Result<Self>
    where
        H: Hub,
        C: Fn() -> H + Send + Sync + 'static,
    {
        let mut table = MethodTable::<H>::new();
        H::methods(&mut table);

        let mut methods = HashMap::with_capacity(table.methods.len());
        for entry in table.methods {
            let key = entry.name.to_lowercase();
            if methods.contains_key(&key) {
                return Err(HubSocketError::Internal(format!(
                    "hub {} declares method '{}' more than once (names are case-insensitive)",
                    H::NAME,
                    entry.name
                )));
            }
            methods.insert(key, entry);
        }

        Ok(Self {
            name: H::NAME,
            constructor: Arc::new(move || Box::new(constructor()) as HubInstance),
            methods,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Case-insensitive method lookup.
    pub fn resolve(&self, method_name: &str) -> Option<&MethodEntry> {
        self.methods.get(&method_name.to_lowercase())
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.values().map(|m| m.name()).collect();
        names.sort_unstable();
        names
    }

    /// Fresh instance from the registered constructor.
    pub fn construct(&self) -> HubInstance {
        (self.constructor)()
    }
}

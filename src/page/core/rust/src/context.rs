/* src/page/core/rust/src/context.rs */

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::services::BoxStream;

pub const ROUTE_PARAMS: &str = "_routeParams";
pub const ROUTE_QUERY_PARAMS: &str = "_routeQueryParams";
pub const ROUTE_CONFIG: &str = "_routeConfig";
pub const EDITING: &str = "_editing";

/// The route a page was opened on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSnapshot {
  pub params: Map<String, Value>,
  pub query_params: Map<String, Value>,
  /// Route configuration; `data.editing` selects editing mode.
  pub config: Value,
}

impl RouteSnapshot {
  pub fn new() -> Self {
    Self { config: Value::Object(Map::new()), ..Self::default() }
  }

  pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.params.insert(key.into(), value.into());
    self
  }

  pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.query_params.insert(key.into(), value.into());
    self
  }

  /// Set one key under the route's `data` block.
  pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    if !self.config.is_object() {
      self.config = Value::Object(Map::new());
    }
    if let Value::Object(config) = &mut self.config {
      let data = config.entry("data").or_insert_with(|| Value::Object(Map::new()));
      if let Value::Object(data) = data {
        data.insert(key.into(), value.into());
      }
    }
    self
  }

  pub fn editing(self, editing: bool) -> Self {
    self.data("editing", editing)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
  Init,
  Loading,
  Ready,
  Error(String),
}

/// Page-scoped key/value state read by token formatting.
///
/// Cloning shares the same underlying state.
#[derive(Clone)]
pub struct PageContext {
  inner: Arc<ContextInner>,
}

struct StatusFanout {
  current: PageStatus,
  subscribers: Vec<mpsc::UnboundedSender<PageStatus>>,
}

struct ContextInner {
  values: RwLock<Map<String, Value>>,
  status: Mutex<StatusFanout>,
  editing: bool,
}

impl PageContext {
  pub fn new(route: &RouteSnapshot) -> Self {
    let editing = formwork_format::lookup(&route.config, "data.editing")
      .is_some_and(formwork_format::to_boolean);

    let mut values = Map::new();
    values.insert(ROUTE_PARAMS.to_string(), Value::Object(route.params.clone()));
    values.insert(ROUTE_QUERY_PARAMS.to_string(), Value::Object(route.query_params.clone()));
    values.insert(ROUTE_CONFIG.to_string(), route.config.clone());
    values.insert(EDITING.to_string(), Value::Bool(editing));

    Self {
      inner: Arc::new(ContextInner {
        values: RwLock::new(values),
        status: Mutex::new(StatusFanout { current: PageStatus::Init, subscribers: Vec::new() }),
        editing,
      }),
    }
  }

  /// Shallow-merge `partial`, overwriting existing keys. `_editing` is fixed
  /// at construction and is never overwritten.
  pub fn set(&self, partial: Map<String, Value>) {
    let mut values = self.inner.values.write().unwrap_or_else(PoisonError::into_inner);
    for (key, value) in partial {
      if key == EDITING {
        warn!("ignoring attempt to overwrite {EDITING}");
        continue;
      }
      values.insert(key, value);
    }
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self.inner.values.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
  }

  /// Context as a JSON object, for token formatting.
  pub fn snapshot(&self) -> Value {
    Value::Object(self.to_map())
  }

  pub fn to_map(&self) -> Map<String, Value> {
    self.inner.values.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn editing(&self) -> bool {
    self.inner.editing
  }

  pub fn route_query_param(&self, key: &str) -> Option<Value> {
    self.get(ROUTE_QUERY_PARAMS).and_then(|q| q.get(key).cloned())
  }

  /// A key of the route's `data` block (e.g. `notificationTitle`).
  pub fn route_data(&self, key: &str) -> Option<Value> {
    self.get(ROUTE_CONFIG).and_then(|c| c.get("data")?.get(key).cloned())
  }

  pub fn status(&self) -> PageStatus {
    self.fanout().current.clone()
  }

  /// Every status emitted after subscribing, in order. Each subscriber has
  /// its own unbounded queue, so a slow reader never loses a status.
  pub fn subscribe_status(&self) -> BoxStream<PageStatus> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.fanout().subscribers.push(tx);
    Box::pin(UnboundedReceiverStream::new(rx))
  }

  pub(crate) fn set_status(&self, status: PageStatus) {
    // Held across the sends so concurrent writers publish in the order they store.
    let mut fanout = self.fanout();
    debug!(?status, subscribers = fanout.subscribers.len(), "page status");
    fanout.subscribers.retain(|tx| tx.send(status.clone()).is_ok());
    fanout.current = status;
  }

  fn fanout(&self) -> MutexGuard<'_, StatusFanout> {
    self.inner.status.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

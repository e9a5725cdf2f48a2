/* src/page/core/rust/src/services.rs */

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_core::Stream;
use serde_json::{Map, Value};

use crate::config::{ButtonConfig, FormValues};
use crate::errors::PageResult;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// One call across the remote procedure boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
  pub service: String,
  pub method: String,
  pub params: Map<String, Value>,
  /// Run as a background task and resolve once it completes.
  pub long_running: bool,
}

pub trait RpcService: Send + Sync {
  fn invoke(&self, call: RpcCall) -> BoxFuture<PageResult<Value>>;
}

pub trait Navigator: Send + Sync {
  fn navigate(&self, url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
  /// Resolves to `true` only when the user confirms.
  Confirmation,
  /// Runs a long-running request; resolves to the dialog's close result.
  Task,
}

pub trait DialogService: Send + Sync {
  fn open(&self, kind: DialogKind, config: Value) -> BoxFuture<PageResult<Value>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
  Success,
  Info,
  Warning,
  Error,
}

pub trait Notifier: Send + Sync {
  fn notify(&self, kind: NotificationType, title: Option<&str>, message: &str);
}

/// Blocking progress overlay shown while a write is in flight.
pub trait ProgressIndicator: Send + Sync {
  fn start(&self, message: &str);
  fn stop(&self);
}

pub type ClickHandlerFn = Arc<dyn Fn(&ButtonConfig, &FormValues) + Send + Sync>;

/// Collaborators a mounted page talks to.
#[derive(Clone)]
pub struct PageServices {
  pub rpc: Arc<dyn RpcService>,
  pub navigator: Arc<dyn Navigator>,
  pub dialogs: Arc<dyn DialogService>,
  pub notifier: Arc<dyn Notifier>,
  pub progress: Arc<dyn ProgressIndicator>,
  click_handlers: HashMap<String, ClickHandlerFn>,
}

impl PageServices {
  pub fn new(
    rpc: Arc<dyn RpcService>,
    navigator: Arc<dyn Navigator>,
    dialogs: Arc<dyn DialogService>,
    notifier: Arc<dyn Notifier>,
    progress: Arc<dyn ProgressIndicator>,
  ) -> Self {
    Self { rpc, navigator, dialogs, notifier, progress, click_handlers: HashMap::new() }
  }

  /// Register the callback a `click` action with this name hands off to.
  pub fn click_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
  where
    F: Fn(&ButtonConfig, &FormValues) + Send + Sync + 'static,
  {
    self.click_handlers.insert(name.into(), Arc::new(handler));
    self
  }

  pub fn find_click_handler(&self, name: &str) -> Option<&ClickHandlerFn> {
    self.click_handlers.get(name)
  }
}

/* src/page/core/rust/src/testing.rs */

// In-process collaborators that record what the engine asked of them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use crate::errors::{PageError, PageResult};
use crate::services::{
  BoxFuture, DialogKind, DialogService, Navigator, NotificationType, Notifier, PageServices, ProgressIndicator,
  RpcCall, RpcService,
};

#[derive(Clone)]
enum Scripted {
  Respond(Value),
  Fail { code: String, message: String },
}

/// Answers per method name; unscripted methods answer `{}`.
#[derive(Default)]
pub(crate) struct FakeRpc {
  script: Mutex<HashMap<String, Scripted>>,
  calls: Mutex<Vec<RpcCall>>,
  delay: Mutex<Option<Duration>>,
  in_flight: Arc<AtomicUsize>,
  max_in_flight: Arc<AtomicUsize>,
}

impl FakeRpc {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub(crate) fn respond(self: Arc<Self>, method: &str, value: Value) -> Arc<Self> {
    self.script.lock().unwrap().insert(method.to_string(), Scripted::Respond(value));
    self
  }

  pub(crate) fn fail(self: Arc<Self>, method: &str, code: &str, message: &str) -> Arc<Self> {
    let failure = Scripted::Fail { code: code.to_string(), message: message.to_string() };
    self.script.lock().unwrap().insert(method.to_string(), failure);
    self
  }

  /// Every call takes `delay` to resolve.
  pub(crate) fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
    *self.delay.lock().unwrap() = Some(delay);
    self
  }

  pub(crate) fn calls(&self) -> Vec<RpcCall> {
    self.calls.lock().unwrap().clone()
  }

  pub(crate) fn methods(&self) -> Vec<String> {
    self.calls().into_iter().map(|c| c.method).collect()
  }

  pub(crate) fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

impl RpcService for FakeRpc {
  fn invoke(&self, call: RpcCall) -> BoxFuture<PageResult<Value>> {
    let scripted = self.script.lock().unwrap().get(&call.method).cloned();
    self.calls.lock().unwrap().push(call);
    let delay = *self.delay.lock().unwrap();
    let in_flight = Arc::clone(&self.in_flight);
    let max_in_flight = Arc::clone(&self.max_in_flight);

    Box::pin(async move {
      let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
      max_in_flight.fetch_max(now, Ordering::SeqCst);
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      in_flight.fetch_sub(1, Ordering::SeqCst);
      match scripted {
        Some(Scripted::Respond(value)) => Ok(value),
        Some(Scripted::Fail { code, message }) => Err(PageError::remote(code, message)),
        None => Ok(json!({})),
      }
    })
  }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
  urls: Mutex<Vec<String>>,
}

impl RecordingNavigator {
  pub(crate) fn urls(&self) -> Vec<String> {
    self.urls.lock().unwrap().clone()
  }
}

impl Navigator for RecordingNavigator {
  fn navigate(&self, url: &str) {
    self.urls.lock().unwrap().push(url.to_string());
  }
}

/// Closes dialogs with queued answers; `true` once the queue is empty.
#[derive(Default)]
pub(crate) struct ScriptedDialogs {
  answers: Mutex<VecDeque<Value>>,
  opened: Mutex<Vec<(DialogKind, Value)>>,
}

impl ScriptedDialogs {
  pub(crate) fn answer(&self, value: Value) {
    self.answers.lock().unwrap().push_back(value);
  }

  pub(crate) fn opened(&self) -> Vec<(DialogKind, Value)> {
    self.opened.lock().unwrap().clone()
  }
}

impl DialogService for ScriptedDialogs {
  fn open(&self, kind: DialogKind, config: Value) -> BoxFuture<PageResult<Value>> {
    self.opened.lock().unwrap().push((kind, config));
    let answer = self.answers.lock().unwrap().pop_front().unwrap_or(Value::Bool(true));
    Box::pin(async move { Ok(answer) })
  }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
  shown: Mutex<Vec<(NotificationType, String)>>,
}

impl RecordingNotifier {
  pub(crate) fn shown(&self) -> Vec<(NotificationType, String)> {
    self.shown.lock().unwrap().clone()
  }
}

impl Notifier for RecordingNotifier {
  fn notify(&self, kind: NotificationType, _title: Option<&str>, message: &str) {
    self.shown.lock().unwrap().push((kind, message.to_string()));
  }
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
  events: Mutex<Vec<String>>,
}

impl RecordingProgress {
  pub(crate) fn events(&self) -> Vec<String> {
    self.events.lock().unwrap().clone()
  }
}

impl ProgressIndicator for RecordingProgress {
  fn start(&self, message: &str) {
    self.events.lock().unwrap().push(format!("start: {message}"));
  }

  fn stop(&self) {
    self.events.lock().unwrap().push("stop".to_string());
  }
}

/// One set of fakes plus the `PageServices` wired to them.
pub(crate) struct Harness {
  pub(crate) rpc: Arc<FakeRpc>,
  pub(crate) navigator: Arc<RecordingNavigator>,
  pub(crate) dialogs: Arc<ScriptedDialogs>,
  pub(crate) notifier: Arc<RecordingNotifier>,
  pub(crate) progress: Arc<RecordingProgress>,
}

impl Harness {
  pub(crate) fn new(rpc: Arc<FakeRpc>) -> Self {
    Self {
      rpc,
      navigator: Arc::default(),
      dialogs: Arc::default(),
      notifier: Arc::default(),
      progress: Arc::default(),
    }
  }

  pub(crate) fn services(&self) -> PageServices {
    PageServices::new(
      self.rpc.clone(),
      self.navigator.clone(),
      self.dialogs.clone(),
      self.notifier.clone(),
      self.progress.clone(),
    )
  }
}

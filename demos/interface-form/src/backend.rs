/* demos/interface-form/src/backend.rs */

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use formwork::{
  BoxFuture, DialogKind, DialogService, Navigator, NotificationType, Notifier, PageError, PageResult,
  ProgressIndicator, RpcCall, RpcService,
};
use formwork::sanitize::NEW_CONF_OBJ_UUID;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// In-process stand-in for the network configuration service. Clones
/// share the same interface table.
#[derive(Clone)]
pub struct NetworkBackend {
  state: Arc<BackendState>,
}

struct BackendState {
  interfaces: Mutex<BTreeMap<String, Map<String, Value>>>,
  latency: Duration,
}

impl NetworkBackend {
  pub fn new(latency: Duration) -> Self {
    let mut interfaces = BTreeMap::new();
    if let Value::Object(eth0) = json!({
      "uuid": "3c7f1d2e-8a4b-4c5d-9e6f-0a1b2c3d4e5f",
      "devicename": "eth0",
      "method": "static",
      "address": "192.168.10.2",
      "netmask": "255.255.255.0",
      "gateway": "192.168.10.1",
      "mtu": 1500,
      "wol": false
    }) {
      interfaces.insert("3c7f1d2e-8a4b-4c5d-9e6f-0a1b2c3d4e5f".to_string(), eth0);
    }
    Self { state: Arc::new(BackendState { interfaces: Mutex::new(interfaces), latency }) }
  }

  pub fn interfaces(&self) -> Vec<Map<String, Value>> {
    self.state.interfaces.lock().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
  }

  fn handle(&self, call: &RpcCall) -> PageResult<Value> {
    let mut interfaces = self.state.interfaces.lock().unwrap_or_else(PoisonError::into_inner);
    match call.method.as_str() {
      "getEthernetIface" => {
        let uuid = call.params.get("uuid").and_then(Value::as_str).unwrap_or_default();
        interfaces
          .get(uuid)
          .map(|iface| Value::Object(iface.clone()))
          .ok_or_else(|| PageError::remote("OBJECT_NOT_FOUND", format!("no interface with uuid {uuid}")))
      }
      "setEthernetIface" => {
        let mut iface = call.params.clone();
        let uuid = match iface.get("uuid").and_then(Value::as_str) {
          Some(uuid) if uuid != NEW_CONF_OBJ_UUID => uuid.to_string(),
          _ => format!("iface-{}", interfaces.len() + 1),
        };
        iface.insert("uuid".to_string(), Value::String(uuid.clone()));
        interfaces.insert(uuid, iface.clone());
        Ok(Value::Object(iface))
      }
      "enumerateDevices" => Ok(json!(interfaces.values().filter_map(|i| i.get("devicename")).collect::<Vec<_>>())),
      "identify" => Ok(json!({"devicename": call.params.get("devicename")})),
      other => Err(PageError::remote("UNKNOWN_METHOD", format!("{}.{other} is not implemented", call.service))),
    }
  }
}

impl RpcService for NetworkBackend {
  fn invoke(&self, call: RpcCall) -> BoxFuture<PageResult<Value>> {
    let backend = self.clone();
    Box::pin(async move {
      tokio::time::sleep(backend.state.latency).await;
      info!(service = %call.service, method = %call.method, "rpc");
      backend.handle(&call)
    })
  }
}

pub struct LogNavigator;

impl Navigator for LogNavigator {
  fn navigate(&self, url: &str) {
    info!(%url, "navigate");
  }
}

/// Answers every confirmation with a fixed choice.
pub struct AutoDialogs {
  pub confirm: bool,
}

impl DialogService for AutoDialogs {
  fn open(&self, kind: DialogKind, config: Value) -> BoxFuture<PageResult<Value>> {
    let answer = match kind {
      DialogKind::Confirmation => self.confirm,
      DialogKind::Task => true,
    };
    info!(?kind, %config, answer, "dialog");
    Box::pin(async move { Ok(Value::Bool(answer)) })
  }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, kind: NotificationType, title: Option<&str>, message: &str) {
    match kind {
      NotificationType::Error | NotificationType::Warning => warn!(?kind, ?title, "{message}"),
      _ => info!(?kind, ?title, "{message}"),
    }
  }
}

pub struct LogProgress;

impl ProgressIndicator for LogProgress {
  fn start(&self, message: &str) {
    info!("{message}");
  }

  fn stop(&self) {
    info!("done");
  }
}

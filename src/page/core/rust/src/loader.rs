/* src/page/core/rust/src/loader.rs */

use std::sync::Arc;
use std::time::Duration;

use formwork_format::{format, format_deep, to_boolean};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::config::{FormValues, RequestConfig};
use crate::context::{PageContext, PageStatus};
use crate::errors::{PageError, PageResult};
use crate::form::FormHandle;
use crate::response;
use crate::services::{RpcCall, RpcService};

/// Issues the configured read request and shapes its response. At most
/// one read is in flight at a time.
pub struct DataLoader {
  request: Option<RequestConfig>,
  context: PageContext,
  rpc: Arc<dyn RpcService>,
  in_flight: Mutex<()>,
}

impl DataLoader {
  pub fn new(request: Option<RequestConfig>, context: PageContext, rpc: Arc<dyn RpcService>) -> Self {
    Self { request, context, rpc, in_flight: Mutex::new(()) }
  }

  /// Run the read request once.
  ///
  /// `Ok(None)` when nothing was loaded: no read request is configured or
  /// its `onlyIf` guard formatted to false. Waits for a load already in
  /// flight to finish first.
  pub async fn load(&self) -> PageResult<Option<FormValues>> {
    let _in_flight = self.in_flight.lock().await;
    self.fetch().await
  }

  async fn fetch(&self) -> PageResult<Option<FormValues>> {
    let Some((request, get)) = self.request.as_ref().and_then(|r| Some((r, r.get.as_ref()?))) else {
      self.context.set_status(PageStatus::Ready);
      return Ok(None);
    };

    if let Some(guard) = &get.only_if {
      let result = format(guard, &self.context.snapshot());
      if !to_boolean(&Value::String(result)) {
        debug!(guard = %guard, "read request skipped");
        self.context.set_status(PageStatus::Ready);
        return Ok(None);
      }
    }

    self.context.set_status(PageStatus::Loading);
    let ctx = self.context.snapshot();
    let params = get.params.iter().map(|(k, v)| (k.clone(), format_deep(v, &ctx))).collect();
    let call = RpcCall {
      service: request.service.clone(),
      method: get.method.clone(),
      params,
      long_running: get.task,
    };
    debug!(service = %call.service, method = %call.method, "loading page data");

    let result = self.rpc.invoke(call).await.and_then(|mut res| {
      if let Some(t) = &get.transform {
        res = response::transform(res, t);
      }
      if let Some(f) = &get.filter {
        res = response::filter(res, &f.props, f.mode);
      }
      match res {
        Value::Object(values) => Ok(values),
        other => Err(PageError::remote(
          "INVALID_RESPONSE",
          format!("expected an object response, got {other}"),
        )),
      }
    });

    match result {
      Ok(values) => {
        self.context.set_status(PageStatus::Ready);
        Ok(Some(values))
      }
      Err(e) => {
        warn!(error = %e, "failed to load page data");
        self.context.set_status(PageStatus::Error(e.to_string()));
        Err(e)
      }
    }
  }

  /// Load and push the result into `form`, marking it pristine. A failed
  /// load leaves the form untouched.
  pub async fn load_into(&self, form: &dyn FormHandle) -> PageResult<bool> {
    let _in_flight = self.in_flight.lock().await;
    self.fetch_into(form).await
  }

  async fn fetch_into(&self, form: &dyn FormHandle) -> PageResult<bool> {
    match self.fetch().await? {
      Some(values) => {
        form.patch_values(&values);
        form.mark_pristine();
        info!(fields = values.len(), "page data loaded");
        Ok(true)
      }
      None => Ok(false),
    }
  }

  /// Load at startup and, with a period, again on every tick that fires
  /// while no load is in flight. Ticks that fire during a load, including
  /// a manual one, are dropped.
  pub(crate) async fn run(self: Arc<Self>, form: Arc<dyn FormHandle>, period: Option<Duration>) {
    let start = Instant::now();
    let mut tick = 0u32;
    loop {
      match self.in_flight.try_lock() {
        // Failures already reach the status stream; the next tick retries.
        Ok(_in_flight) => {
          let _ = self.fetch_into(form.as_ref()).await;
        }
        Err(_) => debug!(tick, "reload tick dropped, a load is in flight"),
      }

      let Some(period) = period else { break };
      tick = next_tick(period, tick, start.elapsed());
      sleep_until(start + period * tick).await;
    }
  }
}

/// Index of the first tick at or after `elapsed` that comes after `last`.
pub(crate) fn next_tick(period: Duration, last: u32, elapsed: Duration) -> u32 {
  let due = elapsed.as_nanos().div_ceil(period.as_nanos().max(1));
  u32::try_from(due).unwrap_or(u32::MAX).max(last.saturating_add(1))
}

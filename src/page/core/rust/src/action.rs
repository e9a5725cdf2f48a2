/* src/page/core/rust/src/action.rs */

use formwork_format::{format, format_deep, is_formatable, is_truthy, stringify};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::{
  ActionRequest, ButtonConfig, ConfirmationDialogConfig, Execute, FormPageConfig, FormValues, PostRequest,
  TaskDialogConfig,
};
use crate::context::PageContext;
use crate::errors::PageResult;
use crate::form::{FormHandle, submit_values};
use crate::services::{DialogKind, NotificationType, PageServices, ProgressIndicator, RpcCall};

/// How a button click ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonOutcome {
  /// A confirmation dialog was declined; nothing after it ran.
  Cancelled,
  Completed,
}

const TASK_DIALOG_WIDTH: &str = "75%";

/// One click, run strictly in order: write request (submit button only),
/// confirmation, then the button's own action. A failed stage stops the rest.
pub(crate) struct ButtonPipeline<'a> {
  pub(crate) config: &'a FormPageConfig,
  pub(crate) context: &'a PageContext,
  pub(crate) form: &'a dyn FormHandle,
  pub(crate) services: &'a PageServices,
  pub(crate) default_progress_message: &'a str,
}

impl ButtonPipeline<'_> {
  pub(crate) async fn run(&self, button: &ButtonConfig) -> PageResult<ButtonOutcome> {
    // Snapshot taken at click time is authoritative for the whole click.
    let mut values = submit_values(&self.config.fields, &self.form.values());

    if button.is_submit() {
      let write = self.config.request.as_ref().and_then(|r| Some((r.service.as_str(), r.post.as_ref()?)));
      match write {
        Some((service, post)) => match self.submit(service, post, values).await? {
          Some(payload) => values = payload,
          None => return Ok(ButtonOutcome::Cancelled),
        },
        None => self.form.mark_pristine(),
      }
    }

    self.pre_action(button, &values).await
  }

  /// The write path. `Ok(None)` when its confirmation was declined.
  async fn submit(&self, service: &str, post: &PostRequest, values: FormValues) -> PageResult<Option<FormValues>> {
    let ctx = self.context.to_map();

    // The full snapshot, not the possibly intersected payload.
    if let Some(dialog) = &post.confirmation_dialog_config {
      if !self.confirm(dialog, &merged(&[&values, &ctx])).await? {
        debug!("write request not confirmed");
        return Ok(None);
      }
    }

    let payload = build_write_payload(post, values, &ctx);

    let message = post.progress_message.as_deref().unwrap_or(self.default_progress_message);
    let result = {
      let _progress = ProgressGuard::start(self.services.progress.as_ref(), message);
      let call = RpcCall {
        service: service.to_string(),
        method: post.method.clone(),
        params: payload.clone(),
        long_running: post.task,
      };
      info!(service = %call.service, method = %call.method, "submitting form");
      self.services.rpc.invoke(call).await
    };

    let response = match result {
      Ok(response) => response,
      Err(e) => {
        warn!(error = %e, "write request failed");
        self.services.notifier.notify(NotificationType::Error, None, &e.message());
        return Err(e);
      }
    };

    self.form.mark_pristine();
    if let Some(title) = self.context.route_data("notificationTitle").filter(is_truthy) {
      let data = merged(&[&response_layer(response), &payload, &ctx]);
      let message = format(&stringify(&title), &data);
      self.services.notifier.notify(NotificationType::Success, None, &message);
    }
    Ok(Some(payload))
  }

  async fn pre_action(&self, button: &ButtonConfig, values: &FormValues) -> PageResult<ButtonOutcome> {
    if let Some(dialog) = &button.confirmation_dialog_config {
      if !self.confirm(dialog, &Value::Object(values.clone())).await? {
        debug!("button action not confirmed");
        return Ok(ButtonOutcome::Cancelled);
      }
    }

    if let Some(execute) = &button.execute {
      self.execute(button, execute, values).await?;
    }
    Ok(ButtonOutcome::Completed)
  }

  /// Only an explicit `true` from the dialog counts as confirmation.
  async fn confirm(&self, dialog: &ConfirmationDialogConfig, data: &Value) -> PageResult<bool> {
    let mut dialog = dialog.clone();
    if let Some(message) = &dialog.message {
      dialog.message = Some(format(message, data));
    }
    let result = self.services.dialogs.open(DialogKind::Confirmation, serde_json::to_value(&dialog)?).await?;
    Ok(result == Value::Bool(true))
  }

  async fn execute(&self, button: &ButtonConfig, execute: &Execute, values: &FormValues) -> PageResult<()> {
    match execute {
      Execute::Click { click } => match self.services.find_click_handler(click) {
        Some(handler) => handler(button, values),
        None => warn!(handler = %click, "no click handler registered"),
      },
      Execute::Url { url } => {
        let target = match self.context.route_query_param("returnUrl") {
          Some(Value::String(return_url)) => return_url,
          _ => format(url, &merged(&[values, &self.context.to_map()])),
        };
        debug!(url = %target, "navigating");
        self.services.navigator.navigate(&target);
      }
      Execute::Request { request } => self.request(request, values).await?,
      Execute::TaskDialog { task_dialog } => self.task_dialog(task_dialog, values).await?,
    }
    Ok(())
  }

  async fn request(&self, request: &ActionRequest, values: &FormValues) -> PageResult<()> {
    let ctx = self.context.to_map();
    let data = merged(&[values, &ctx]);
    let params = request.params.iter().map(|(k, v)| (k.clone(), format_deep(v, &data))).collect();

    let result = {
      let _progress =
        request.progress_message.as_deref().map(|m| ProgressGuard::start(self.services.progress.as_ref(), m));
      let call = RpcCall {
        service: request.service.clone(),
        method: request.method.clone(),
        params,
        long_running: request.task,
      };
      info!(service = %call.service, method = %call.method, "running button request");
      self.services.rpc.invoke(call).await
    };

    let response = match result {
      Ok(response) => response,
      Err(e) => {
        warn!(error = %e, "button request failed");
        self.services.notifier.notify(NotificationType::Error, None, &e.message());
        return Err(e);
      }
    };

    let data = merged(&[&response_layer(response), values, &ctx]);
    if let Some(notification) = &request.success_notification {
      self.services.notifier.notify(NotificationType::Success, None, &format(notification, &data));
    }
    if let Some(url) = &request.success_url {
      self.services.navigator.navigate(&format(url, &data));
    }
    Ok(())
  }

  async fn task_dialog(&self, task_dialog: &TaskDialogConfig, values: &FormValues) -> PageResult<()> {
    let data = merged(&[values, &self.context.to_map()]);
    let mut config = task_dialog.config.clone();

    if let Some(params) = config.get_mut("request").and_then(|r| r.get_mut("params")) {
      if is_formatable(params) {
        *params = format_deep(params, &data);
      }
    }
    config.entry("width").or_insert_with(|| Value::String(TASK_DIALOG_WIDTH.to_string()));

    let result = self.services.dialogs.open(DialogKind::Task, Value::Object(config)).await?;
    match &task_dialog.success_url {
      Some(url) if is_truthy(&result) => self.services.navigator.navigate(&format(url, &data)),
      _ => {}
    }
    Ok(())
  }
}

/// Format the configured write params against context and values (values
/// win), merge them onto the values and, with `intersectParams`, keep only
/// keys both declared as params and present in the values.
pub(crate) fn build_write_payload(post: &PostRequest, values: FormValues, ctx: &Map<String, Value>) -> FormValues {
  let Some(params) = &post.params else {
    return values;
  };
  let data = merged(&[ctx, &values]);
  let formatted: Map<String, Value> = params.iter().map(|(k, v)| (k.clone(), format_deep(v, &data))).collect();

  let mut payload = match merged(&[&values, &formatted]) {
    Value::Object(map) => map,
    _ => values.clone(),
  };
  if post.intersect_params {
    payload.retain(|key, _| params.contains_key(key) && values.contains_key(key));
  }
  payload
}

fn response_layer(response: Value) -> Map<String, Value> {
  let mut layer = Map::new();
  layer.insert("_response".to_string(), response);
  layer
}

/// Deep-merge `layers` left to right; later layers win.
pub(crate) fn merged(layers: &[&Map<String, Value>]) -> Value {
  let mut out = Map::new();
  for layer in layers {
    merge_into(&mut out, layer);
  }
  Value::Object(out)
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
  for (key, value) in source {
    match (target.get_mut(key), value) {
      (Some(Value::Object(existing)), Value::Object(incoming)) => merge_into(existing, incoming),
      _ => {
        target.insert(key.clone(), value.clone());
      }
    }
  }
}

struct ProgressGuard<'a>(&'a dyn ProgressIndicator);

impl<'a> ProgressGuard<'a> {
  fn start(indicator: &'a dyn ProgressIndicator, message: &str) -> Self {
    indicator.start(message);
    Self(indicator)
  }
}

impl Drop for ProgressGuard<'_> {
  fn drop(&mut self) {
    self.0.stop();
  }
}

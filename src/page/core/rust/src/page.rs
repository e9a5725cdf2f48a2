/* src/page/core/rust/src/page.rs */

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use formwork_format::format_deep;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::action::{ButtonOutcome, ButtonPipeline};
use crate::config::{ButtonConfig, FormPageConfig, FormValues, flatten_fields};
use crate::constraint;
use crate::context::{PageContext, PageStatus, ROUTE_QUERY_PARAMS, RouteSnapshot};
use crate::debounce::next_settled;
use crate::errors::{PageError, PageResult};
use crate::field_state::{FieldStates, evaluate_field_states};
use crate::form::{FormHandle, submit_values};
use crate::loader::DataLoader;
use crate::sanitize::{format_config, sanitize};
use crate::services::{BoxStream, PageServices};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
  /// Quiet period before constraints are re-evaluated after an edit.
  pub constraint_debounce: Duration,
  /// Progress message shown while a write without its own message runs.
  pub default_progress_message: String,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self {
      constraint_debounce: Duration::from_millis(5),
      default_progress_message: "Please wait ...".to_string(),
    }
  }
}

/// A sanitized page bound to its route, ready to seed and mount a form.
pub struct PageSetup {
  config: FormPageConfig,
  context: PageContext,
  options: EngineOptions,
}

impl PageSetup {
  pub fn new(raw: FormPageConfig, route: &RouteSnapshot) -> PageResult<Self> {
    Self::with_options(raw, route, EngineOptions::default())
  }

  /// Sanitize `raw`, seed the page context from `route` and resolve the
  /// token-bearing config paths.
  pub fn with_options(raw: FormPageConfig, route: &RouteSnapshot, options: EngineOptions) -> PageResult<Self> {
    let mut config = sanitize(raw)?;
    let context = PageContext::new(route);
    format_config(&mut config, &context.snapshot());

    info!(editing = context.editing(), title = ?config.title, "page initialized");
    Ok(Self { config, context, options })
  }

  pub fn from_value(raw: Value, route: &RouteSnapshot) -> PageResult<Self> {
    Self::new(serde_json::from_value(raw)?, route)
  }

  pub fn config(&self) -> &FormPageConfig {
    &self.config
  }

  pub fn context(&self) -> &PageContext {
    &self.context
  }

  /// Default value of every named field, formatted against the context.
  /// Fields without a default start as `null`. In creating mode a route
  /// query parameter with the field's name replaces the default verbatim.
  pub fn initial_values(&self) -> FormValues {
    let ctx = self.context.snapshot();
    let query = if self.context.editing() { None } else { self.context.get(ROUTE_QUERY_PARAMS) };
    flatten_fields(&self.config.fields)
      .into_iter()
      .filter_map(|field| {
        let name = field.name.clone()?;
        let value = match query.as_ref().and_then(|q| q.get(&name)) {
          Some(overlay) => overlay.clone(),
          None => field.value.as_ref().map_or(Value::Null, |v| format_deep(v, &ctx)),
        };
        Some((name, value))
      })
      .collect()
  }

  /// Attach the page to a form and its collaborators and start the
  /// background work: the initial load (with auto-reload) in editing mode
  /// and the debounced constraint listener. Must run inside a tokio runtime.
  pub fn mount(self, form: Arc<dyn FormHandle>, services: PageServices) -> FormPage {
    let Self { config, context, options } = self;

    let values = form.values();
    let mut buttons = config.buttons.clone();
    refresh_buttons(&mut buttons, &values);
    let (buttons, _) = watch::channel(buttons);
    let (fields, _) = watch::channel(evaluate_field_states(&config.fields, &values));

    let loader = Arc::new(DataLoader::new(config.request.clone(), context.clone(), Arc::clone(&services.rpc)));
    let changes = form.value_changes();
    let inner = Arc::new(PageInner { config, context, form, services, loader, options, buttons, fields });

    let mut tasks = vec![tokio::spawn(listen(Arc::clone(&inner), changes))];
    if inner.context.editing() {
      let period = inner.config.auto_reload.interval();
      debug!(?period, "starting data loader");
      tasks.push(tokio::spawn(Arc::clone(&inner.loader).run(Arc::clone(&inner.form), period)));
    } else {
      inner.context.set_status(PageStatus::Ready);
    }

    FormPage { inner, tasks: Mutex::new(tasks) }
  }
}

struct PageInner {
  config: FormPageConfig,
  context: PageContext,
  form: Arc<dyn FormHandle>,
  services: PageServices,
  loader: Arc<DataLoader>,
  options: EngineOptions,
  buttons: watch::Sender<Vec<ButtonConfig>>,
  fields: watch::Sender<FieldStates>,
}

impl PageInner {
  fn refresh(&self, values: &FormValues) {
    self.buttons.send_if_modified(|buttons| refresh_buttons(buttons, values));
    let states = evaluate_field_states(&self.config.fields, values);
    self.fields.send_if_modified(|current| {
      let changed = *current != states;
      if changed {
        *current = states;
      }
      changed
    });
  }
}

/// Re-derive `disabled` of buttons with an enabling constraint. Returns
/// whether any button changed.
fn refresh_buttons(buttons: &mut [ButtonConfig], values: &FormValues) -> bool {
  let mut changed = false;
  for button in buttons.iter_mut() {
    if let Some(c) = &button.enabled_constraint {
      let disabled = !constraint::test(c, values);
      changed |= button.disabled != disabled;
      button.disabled = disabled;
    }
  }
  changed
}

async fn listen(inner: Arc<PageInner>, mut changes: BoxStream<FormValues>) {
  while let Some(values) = next_settled(&mut changes, inner.options.constraint_debounce).await {
    inner.refresh(&values);
  }
}

/// A mounted page. Dropping it stops all background work.
pub struct FormPage {
  inner: Arc<PageInner>,
  tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FormPage {
  pub fn config(&self) -> &FormPageConfig {
    &self.inner.config
  }

  pub fn context(&self) -> &PageContext {
    &self.inner.context
  }

  /// Buttons with their current `disabled` state.
  pub fn buttons(&self) -> Vec<ButtonConfig> {
    self.inner.buttons.borrow().clone()
  }

  pub fn subscribe_buttons(&self) -> watch::Receiver<Vec<ButtonConfig>> {
    self.inner.buttons.subscribe()
  }

  pub fn field_states(&self) -> FieldStates {
    self.inner.fields.borrow().clone()
  }

  pub fn subscribe_field_states(&self) -> watch::Receiver<FieldStates> {
    self.inner.fields.subscribe()
  }

  pub fn status(&self) -> PageStatus {
    self.inner.context.status()
  }

  pub fn subscribe_status(&self) -> BoxStream<PageStatus> {
    self.inner.context.subscribe_status()
  }

  /// Values to submit: every value except those of fields declaring
  /// `submitValue: false`.
  pub fn get_form_values(&self) -> FormValues {
    submit_values(&self.inner.config.fields, &self.inner.form.values())
  }

  pub fn set_form_values(&self, values: &FormValues, mark_pristine: bool) {
    self.inner.form.patch_values(values);
    if mark_pristine {
      self.inner.form.mark_pristine();
    }
  }

  pub fn is_dirty(&self) -> bool {
    self.inner.form.is_dirty()
  }

  pub fn mark_as_dirty(&self) {
    self.inner.form.mark_dirty();
  }

  pub fn mark_as_pristine(&self) {
    self.inner.form.mark_pristine();
  }

  /// Run the read request once outside the reload schedule.
  pub async fn reload(&self) -> PageResult<bool> {
    self.inner.loader.load_into(self.inner.form.as_ref()).await
  }

  pub async fn on_button_click(&self, button: &ButtonConfig) -> PageResult<ButtonOutcome> {
    info!(text = ?button.text, template = ?button.template, "button clicked");
    let pipeline = ButtonPipeline {
      config: &self.inner.config,
      context: &self.inner.context,
      form: self.inner.form.as_ref(),
      services: &self.inner.services,
      default_progress_message: &self.inner.options.default_progress_message,
    };
    pipeline.run(button).await
  }

  /// Click the button at `index` in its current state. A disabled button
  /// does nothing and reports `Cancelled`.
  pub async fn click(&self, index: usize) -> PageResult<ButtonOutcome> {
    let button = self
      .buttons()
      .into_iter()
      .nth(index)
      .ok_or_else(|| PageError::configuration(format!("no button at index {index}")))?;
    if button.disabled {
      debug!(index, "ignoring click on disabled button");
      return Ok(ButtonOutcome::Cancelled);
    }
    self.on_button_click(&button).await
  }

  /// Stop the reload loop and the value listener. Results of an in-flight
  /// load are discarded.
  pub fn destroy(&self) {
    let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    if tasks.is_empty() {
      return;
    }
    for task in tasks.drain(..) {
      task.abort();
    }
    debug!("page destroyed");
  }
}

impl Drop for FormPage {
  fn drop(&mut self) {
    self.destroy();
  }
}

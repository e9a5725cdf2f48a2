/* src/page/core/rust/src/config.rs */

use std::time::Duration;

use formwork_format::{format, to_boolean};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constraint::Constraint;

/// Current field name -> value pairs held by the form.
pub type FormValues = Map<String, Value>;

/// Declarative definition of one form page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPageConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  #[serde(default)]
  pub fields: Vec<FieldConfig>,
  #[serde(default)]
  pub buttons: Vec<ButtonConfig>,
  #[serde(default)]
  pub button_align: ButtonAlign,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub request: Option<RequestConfig>,
  #[serde(default)]
  pub auto_reload: AutoReload,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub hints: Vec<HintConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAlign {
  Start,
  Center,
  #[default]
  End,
}

/// `false`, `0` or a polling interval in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoReload {
  Flag(bool),
  Millis(u64),
}

impl Default for AutoReload {
  fn default() -> Self {
    Self::Flag(false)
  }
}

impl AutoReload {
  pub fn interval(self) -> Option<Duration> {
    match self {
      Self::Millis(ms) if ms > 0 => Some(Duration::from_millis(ms)),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintConfig {
  #[serde(rename = "type", default)]
  pub kind: HintType,
  pub text: String,
  #[serde(default)]
  pub dismissible: bool,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintType {
  #[default]
  Info,
  Warning,
  Tip,
}

/// A boolean that may also be written as a token expression, e.g.
/// `"{{ _routeConfig.data.editing | toboolean }}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
  Bool(bool),
  Token(String),
}

impl Default for Flag {
  fn default() -> Self {
    Self::Bool(false)
  }
}

impl Flag {
  pub fn is_unset(&self) -> bool {
    matches!(self, Self::Bool(false))
  }

  /// Static value; an unformatted token counts as `false`.
  pub fn as_bool(&self) -> bool {
    matches!(self, Self::Bool(true))
  }

  /// Format a token against `context` and coerce the result to a boolean.
  pub fn resolve(&self, context: &Value) -> Self {
    match self {
      Self::Bool(b) => Self::Bool(*b),
      Self::Token(token) => Self::Bool(to_boolean(&Value::String(format(token, context)))),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,
  #[serde(default, skip_serializing_if = "Flag::is_unset")]
  pub disabled: Flag,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub submit_value: Option<bool>,
  #[serde(default, skip_serializing_if = "Validators::is_empty")]
  pub validators: Validators,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub modifiers: Vec<Modifier>,
  /// Children of container fields.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fields: Vec<FieldConfig>,
  /// Widget data (label, store, hint, ...) carried through untouched.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl FieldConfig {
  pub fn submits_value(&self) -> bool {
    self.submit_value.unwrap_or(true)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validators {
  #[serde(default, skip_serializing_if = "Flag::is_unset")]
  pub required: Flag,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required_if: Option<Constraint>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optional_if: Option<Constraint>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pattern_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_length: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_length: Option<usize>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Validators {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// Runtime effect applied to a field while `constraint` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
  #[serde(rename = "type")]
  pub kind: ModifierKind,
  pub constraint: Constraint,
  /// Apply the opposite effect while the constraint does not hold.
  #[serde(default = "default_true")]
  pub opposite: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub type_config: Option<Value>,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierKind {
  Disabled,
  Enabled,
  Visible,
  Hidden,
  // Applied by the rendering widget
  Checked,
  Unchecked,
  Focused,
  Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonTemplate {
  Submit,
  Cancel,
  Back,
  #[default]
  Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonConfig {
  #[serde(default)]
  pub template: ButtonTemplate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  #[serde(default)]
  pub submit: bool,
  #[serde(default)]
  pub disabled: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub class: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execute: Option<Execute>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confirmation_dialog_config: Option<ConfirmationDialogConfig>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enabled_constraint: Option<Constraint>,
}

impl ButtonConfig {
  pub fn is_submit(&self) -> bool {
    self.template == ButtonTemplate::Submit || self.submit
  }
}

/// What a button does once confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Execute {
  /// Hand off to a click handler registered under this name.
  Click { click: String },
  Url { url: String },
  Request { request: ActionRequest },
  TaskDialog {
    #[serde(rename = "taskDialog")]
    task_dialog: TaskDialogConfig,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
  pub service: String,
  pub method: String,
  #[serde(default)]
  pub params: Map<String, Value>,
  #[serde(default)]
  pub task: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub progress_message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success_notification: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDialogConfig {
  /// Dialog configuration (title, `request {service, method, params}`, width, ...).
  #[serde(default)]
  pub config: Map<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationDialogConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Backend read/write contract of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
  pub service: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub get: Option<GetRequest>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub post: Option<PostRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
  pub method: String,
  #[serde(default)]
  pub params: Map<String, Value>,
  /// Token expression; the read is skipped when it formats to a false value.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub only_if: Option<String>,
  #[serde(default)]
  pub task: bool,
  /// Response key -> template formatted against the raw response.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transform: Option<Map<String, Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter: Option<ResponseFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFilter {
  pub props: Vec<String>,
  #[serde(default)]
  pub mode: FilterMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
  #[default]
  Pick,
  Omit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
  pub method: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub params: Option<Map<String, Value>>,
  /// Restrict the payload to keys declared in `params` that the form also holds.
  #[serde(default)]
  pub intersect_params: bool,
  #[serde(default)]
  pub task: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub progress_message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confirmation_dialog_config: Option<ConfirmationDialogConfig>,
}

/// Depth-first walk over the field tree, containers included.
pub fn flatten_fields(fields: &[FieldConfig]) -> Vec<&FieldConfig> {
  let mut out = Vec::new();
  for field in fields {
    out.push(field);
    out.extend(flatten_fields(&field.fields));
  }
  out
}

pub(crate) fn visit_fields_mut(fields: &mut [FieldConfig], f: &mut impl FnMut(&mut FieldConfig)) {
  for field in fields {
    f(field);
    visit_fields_mut(&mut field.fields, f);
  }
}

/* src/page/core/rust/src/sanitize.rs */

use formwork_format::{format, format_deep};
use serde_json::Value;
use tracing::debug;

use crate::config::{AutoReload, ButtonTemplate, FieldConfig, FormPageConfig, visit_fields_mut};
use crate::errors::{PageError, PageResult};

/// Identifier a new configuration object is submitted with; the backend
/// replaces it with a real UUID.
pub const NEW_CONF_OBJ_UUID: &str = "fa4b1c66-ef79-11e5-87a0-0002b3a176b4";

pub const CONF_OBJ_UUID_FIELD: &str = "confObjUuid";

const ICONS: &[(&str, &str)] = &[
  ("add", "mdi:plus-box"),
  ("apply", "mdi:check"),
  ("back", "mdi:arrow-left"),
  ("cancel", "mdi:close"),
  ("copy", "mdi:content-copy"),
  ("delete", "mdi:delete"),
  ("details", "mdi:file-document-outline"),
  ("edit", "mdi:pencil"),
  ("ethernet", "mdi:ethernet"),
  ("network", "mdi:lan"),
  ("refresh", "mdi:refresh"),
  ("save", "mdi:content-save"),
  ("search", "mdi:magnify"),
  ("settings", "mdi:cog"),
  ("wifi", "mdi:wifi"),
];

/// Resolve a symbolic icon name. Unknown names pass through.
pub fn resolve_icon(name: &str) -> &str {
  ICONS.iter().find(|(key, _)| *key == name).map_or(name, |(_, icon)| icon)
}

/// Normalize a raw page definition into a fully defaulted one.
///
/// Idempotent: sanitizing an already sanitized config changes nothing.
pub fn sanitize(mut config: FormPageConfig) -> PageResult<FormPageConfig> {
  config.auto_reload = match config.auto_reload {
    AutoReload::Flag(true) => {
      return Err(PageError::configuration("autoReload must be false or an interval in milliseconds"));
    }
    AutoReload::Millis(0) => AutoReload::Flag(false),
    other => other,
  };

  let submits = config.buttons.iter().filter(|b| b.is_submit()).count();
  if submits > 1 {
    return Err(PageError::configuration(format!(
      "at most one submit button is allowed, found {submits}"
    )));
  }

  visit_fields_mut(&mut config.fields, &mut setup_conf_obj_uuid);

  for button in &mut config.buttons {
    let text = match button.template {
      ButtonTemplate::Back => "Back",
      ButtonTemplate::Cancel => "Cancel",
      ButtonTemplate::Submit => {
        button.submit = true;
        "Save"
      }
      ButtonTemplate::Custom => continue,
    };
    button.text.get_or_insert_with(|| text.to_string());
  }

  if let Some(index) = config.buttons.iter().position(|b| b.is_submit()) {
    let button = config.buttons.remove(index);
    config.buttons.push(button);
  }

  if let Some(icon) = &config.icon {
    config.icon = Some(resolve_icon(icon).to_string());
  }

  debug!(fields = config.fields.len(), buttons = config.buttons.len(), "page config sanitized");
  Ok(config)
}

fn setup_conf_obj_uuid(field: &mut FieldConfig) {
  if field.kind != CONF_OBJ_UUID_FIELD {
    return;
  }
  field.name.get_or_insert_with(|| "uuid".to_string());
  field.value.get_or_insert_with(|| Value::String(NEW_CONF_OBJ_UUID.to_string()));
}

/// Resolve the token-bearing parts of the config once against the page
/// context: read/write request method and params, plus each field's
/// `disabled` and `validators.required` flags.
pub fn format_config(config: &mut FormPageConfig, context: &Value) {
  if let Some(request) = &mut config.request {
    if let Some(get) = &mut request.get {
      get.method = format(&get.method, context);
      get.params = format_map(&get.params, context);
    }
    if let Some(post) = &mut request.post {
      post.method = format(&post.method, context);
      if let Some(params) = &post.params {
        post.params = Some(format_map(params, context));
      }
    }
  }

  visit_fields_mut(&mut config.fields, &mut |field| {
    field.disabled = field.disabled.resolve(context);
    field.validators.required = field.validators.required.resolve(context);
  });
}

fn format_map(map: &serde_json::Map<String, Value>, context: &Value) -> serde_json::Map<String, Value> {
  map.iter().map(|(k, v)| (k.clone(), format_deep(v, context))).collect()
}

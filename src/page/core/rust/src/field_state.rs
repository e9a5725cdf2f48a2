/* src/page/core/rust/src/field_state.rs */

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{FieldConfig, FormValues, ModifierKind, flatten_fields};
use crate::constraint;
use crate::sanitize::CONF_OBJ_UUID_FIELD;

/// Effective runtime state of one named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldState {
  pub disabled: bool,
  pub required: bool,
  pub visible: bool,
}

pub type FieldStates = BTreeMap<String, FieldState>;

/// Combine static flags, modifiers and conditional validators for every
/// named field against the current value bag.
///
/// Modifiers apply in declaration order, so a later modifier on the same
/// property wins. Token flags that were never formatted count as `false`.
pub fn evaluate_field_states(fields: &[FieldConfig], values: &FormValues) -> FieldStates {
  flatten_fields(fields)
    .into_iter()
    .filter_map(|field| Some((field.name.clone()?, evaluate(field, values))))
    .collect()
}

fn evaluate(field: &FieldConfig, values: &FormValues) -> FieldState {
  let mut state = FieldState {
    disabled: field.disabled.as_bool(),
    required: field.validators.required.as_bool(),
    visible: !matches!(field.kind.as_str(), "hidden" | CONF_OBJ_UUID_FIELD),
  };

  for modifier in &field.modifiers {
    let holds = constraint::test(&modifier.constraint, values);
    if !holds && !modifier.opposite {
      continue;
    }
    match modifier.kind {
      ModifierKind::Disabled => state.disabled = holds,
      ModifierKind::Enabled => state.disabled = !holds,
      ModifierKind::Visible => state.visible = holds,
      ModifierKind::Hidden => state.visible = !holds,
      ModifierKind::Checked
      | ModifierKind::Unchecked
      | ModifierKind::Focused
      | ModifierKind::Value => {}
    }
  }

  if let Some(c) = &field.validators.required_if {
    state.required = constraint::test(c, values);
  }
  if let Some(c) = &field.validators.optional_if {
    state.required = !constraint::test(c, values);
  }

  state
}

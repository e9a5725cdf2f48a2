/* src/page/core/rust/src/form.rs */

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::config::{FieldConfig, FormValues, flatten_fields};
use crate::services::BoxStream;

/// The value bag of the rendering widget.
///
/// The widget writes on user input; the engine writes on load and on
/// explicit API calls. `value_changes` yields the full bag after writes. A
/// reader that falls behind may skip intermediate bags but always receives
/// the newest one.
pub trait FormHandle: Send + Sync {
  fn values(&self) -> FormValues;
  /// Merge `partial` into the bag.
  fn patch_values(&self, partial: &FormValues);
  fn is_dirty(&self) -> bool;
  fn mark_dirty(&self);
  fn mark_pristine(&self);
  fn value_changes(&self) -> BoxStream<FormValues>;
}

/// In-process `FormHandle`.
pub struct MemoryForm {
  state: Mutex<FormState>,
  changes: broadcast::Sender<FormValues>,
}

#[derive(Default)]
struct FormState {
  values: FormValues,
  dirty: bool,
}

impl MemoryForm {
  pub fn new(values: FormValues) -> Self {
    let (changes, _) = broadcast::channel(64);
    Self { state: Mutex::new(FormState { values, dirty: false }), changes }
  }

  /// A user edit: sets one value and marks the form dirty.
  pub fn set_value(&self, name: &str, value: Value) {
    let snapshot = {
      let mut state = self.lock();
      state.values.insert(name.to_string(), value);
      state.dirty = true;
      state.values.clone()
    };
    let _ = self.changes.send(snapshot);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, FormState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for MemoryForm {
  fn default() -> Self {
    Self::new(FormValues::new())
  }
}

impl FormHandle for MemoryForm {
  fn values(&self) -> FormValues {
    self.lock().values.clone()
  }

  fn patch_values(&self, partial: &FormValues) {
    let snapshot = {
      let mut state = self.lock();
      for (key, value) in partial {
        state.values.insert(key.clone(), value.clone());
      }
      state.values.clone()
    };
    let _ = self.changes.send(snapshot);
  }

  fn is_dirty(&self) -> bool {
    self.lock().dirty
  }

  fn mark_dirty(&self) {
    self.lock().dirty = true;
  }

  fn mark_pristine(&self) {
    self.lock().dirty = false;
  }

  fn value_changes(&self) -> BoxStream<FormValues> {
    Box::pin(BroadcastStream::new(self.changes.subscribe()).filter_map(|r| async move {
      match r {
        Ok(values) => Some(values),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
          warn!(skipped, "value listener lagged; skipping to newer values");
          None
        }
      }
    }))
  }
}

/// Drop every declared field with `submitValue: false`. Keys the field
/// tree does not declare pass through.
pub fn submit_values(fields: &[FieldConfig], raw: &FormValues) -> FormValues {
  let declared: HashMap<&str, bool> = flatten_fields(fields)
    .into_iter()
    .filter_map(|f| f.name.as_deref().map(|name| (name, f.submits_value())))
    .collect();
  raw
    .iter()
    .filter(|(key, _)| declared.get(key.as_str()).copied().unwrap_or(true))
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

/* src/page/core/rust/src/tests/mod.rs */

use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::FormValues;
use crate::context::RouteSnapshot;
use crate::form::MemoryForm;
use crate::page::{FormPage, PageSetup};
use crate::testing::{FakeRpc, Harness};

mod pipeline;

fn bag(v: Value) -> FormValues {
  serde_json::from_value(v).unwrap()
}

struct Mounted {
  page: FormPage,
  form: Arc<MemoryForm>,
  fakes: Harness,
}

/// Sanitize `config` for `route`, seed a `MemoryForm` with its defaults and
/// mount it against fresh fakes around `rpc`.
fn mount(config: Value, route: &RouteSnapshot, rpc: Arc<FakeRpc>) -> Mounted {
  let setup = PageSetup::from_value(config, route).unwrap();
  let form = Arc::new(MemoryForm::new(setup.initial_values()));
  let fakes = Harness::new(rpc);
  let page = setup.mount(form.clone(), fakes.services());
  Mounted { page, form, fakes }
}

fn creating() -> RouteSnapshot {
  RouteSnapshot::new().editing(false)
}

fn editing(uuid: &str) -> RouteSnapshot {
  RouteSnapshot::new().param("uuid", uuid).editing(true)
}

#[test]
fn fixtures_seed_defaults() {
  let setup = PageSetup::from_value(
    json!({"fields": [{"type": "textInput", "name": "a", "value": "{{ _routeParams.uuid }}"}, {"type": "divider"}]}),
    &editing("abc"),
  )
  .unwrap();
  assert_eq!(setup.initial_values(), bag(json!({"a": "abc"})));
}

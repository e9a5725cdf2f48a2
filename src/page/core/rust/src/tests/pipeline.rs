/* src/page/core/rust/src/tests/pipeline.rs */

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::action::ButtonOutcome;
use crate::form::FormHandle;
use crate::page::PageSetup;
use crate::services::{DialogKind, NotificationType};

fn write_page() -> Value {
  json!({
    "fields": [
      {"type": "textInput", "name": "name", "value": "eth0"},
      {"type": "passwordInput", "name": "confirm", "submitValue": false}
    ],
    "request": {
      "service": "Network",
      "post": {"method": "setIface", "params": {"uuid": "{{ _routeParams.uuid }}"}}
    },
    "buttons": [
      {"template": "submit", "execute": {"type": "url", "url": "/network/{{ name }}"}},
      {"template": "cancel", "execute": {"type": "url", "url": "/network"}}
    ]
  })
}

#[tokio::test]
async fn submit_writes_then_runs_follow_up() {
  let route = creating().param("uuid", "new").data("notificationTitle", "Saved {{ name }}");
  let m = mount(write_page(), &route, FakeRpc::new());
  m.form.set_value("confirm", json!("secret"));
  assert!(m.page.is_dirty());

  let outcome = m.page.click(1).await.unwrap();
  assert_eq!(outcome, ButtonOutcome::Completed);

  let calls = m.fakes.rpc.calls();
  assert_eq!(calls.len(), 1);
  assert_eq!(calls[0].service, "Network");
  assert_eq!(calls[0].method, "setIface");
  assert_eq!(Value::Object(calls[0].params.clone()), json!({"name": "eth0", "uuid": "new"}));
  assert!(!m.page.is_dirty());
  assert_eq!(m.fakes.progress.events(), vec!["start: Please wait ...", "stop"]);
  assert_eq!(m.fakes.notifier.shown(), vec![(NotificationType::Success, "Saved eth0".to_string())]);
  assert_eq!(m.fakes.navigator.urls(), vec!["/network/eth0"]);
}

#[tokio::test]
async fn sanitized_buttons_put_submit_last() {
  let m = mount(write_page(), &creating(), FakeRpc::new());
  let texts: Vec<_> = m.page.buttons().into_iter().map(|b| b.text.unwrap_or_default()).collect();
  assert_eq!(texts, vec!["Cancel", "Save"]);
}

#[tokio::test]
async fn write_failure_stops_pipeline() {
  let rpc = FakeRpc::new().fail("setIface", "RPC_ERROR", "device busy");
  let route = creating().data("notificationTitle", "Saved");
  let m = mount(write_page(), &route, rpc);
  m.form.set_value("name", json!("eth1"));

  let err = m.page.click(1).await.unwrap_err();
  assert_eq!(err.code(), "RPC_ERROR");
  assert!(m.page.is_dirty());
  assert_eq!(m.fakes.notifier.shown(), vec![(NotificationType::Error, "device busy".to_string())]);
  assert!(m.fakes.navigator.urls().is_empty());
  assert_eq!(m.fakes.progress.events(), vec!["start: Please wait ...", "stop"]);
}

#[tokio::test]
async fn declined_write_confirmation_sends_nothing() {
  let mut config = write_page();
  config["request"]["post"]["confirmationDialogConfig"] =
    json!({"title": "Apply", "message": "Apply {{ name }} on {{ _routeParams.uuid }}?"});
  let m = mount(config, &creating().param("uuid", "u1"), FakeRpc::new());
  m.fakes.dialogs.answer(json!(false));

  assert_eq!(m.page.click(1).await.unwrap(), ButtonOutcome::Cancelled);
  assert!(m.fakes.rpc.calls().is_empty());
  assert!(m.fakes.navigator.urls().is_empty());
  let opened = m.fakes.dialogs.opened();
  assert_eq!(opened[0].0, DialogKind::Confirmation);
  assert_eq!(opened[0].1["message"], json!("Apply eth0 on u1?"));
}

#[tokio::test]
async fn write_confirmation_sees_fields_outside_intersected_params() {
  let mut config = write_page();
  config["request"]["post"]["intersectParams"] = json!(true);
  config["request"]["post"]["confirmationDialogConfig"] = json!({"message": "Apply {{ name }}?"});
  let m = mount(config, &creating().param("uuid", "u1"), FakeRpc::new());
  m.form.set_value("uuid", json!("draft"));

  assert_eq!(m.page.click(1).await.unwrap(), ButtonOutcome::Completed);
  assert_eq!(m.fakes.dialogs.opened()[0].1["message"], json!("Apply eth0?"));
  // the payload itself is still restricted to the declared params
  let calls = m.fakes.rpc.calls();
  assert_eq!(Value::Object(calls[0].params.clone()), json!({"uuid": "u1"}));
}

#[tokio::test]
async fn button_confirmation_needs_explicit_true() {
  let config = json!({
    "fields": [{"type": "textInput", "name": "name", "value": "eth0"}],
    "buttons": [{
      "text": "Delete",
      "confirmationDialogConfig": {"message": "Delete {{ name }}?{{ _routeParams.uuid }}", "width": "50%"},
      "execute": {"type": "url", "url": "/gone"}
    }]
  });
  let m = mount(config, &creating().param("uuid", "hidden"), FakeRpc::new());

  m.fakes.dialogs.answer(json!("yes"));
  assert_eq!(m.page.click(0).await.unwrap(), ButtonOutcome::Cancelled);
  m.fakes.dialogs.answer(json!(true));
  assert_eq!(m.page.click(0).await.unwrap(), ButtonOutcome::Completed);

  assert_eq!(m.fakes.navigator.urls(), vec!["/gone"]);
  // formatted against the values only
  let opened = m.fakes.dialogs.opened();
  assert_eq!(opened[0].1["message"], json!("Delete eth0?"));
  assert_eq!(opened[0].1["width"], json!("50%"));
}

#[tokio::test]
async fn return_url_overrides_url_action() {
  let m = mount(write_page(), &creating().query("returnUrl", "/dashboard"), FakeRpc::new());
  m.page.click(0).await.unwrap();
  assert_eq!(m.fakes.navigator.urls(), vec!["/dashboard"]);
}

#[tokio::test]
async fn click_handler_receives_submit_values() {
  let seen = Arc::new(Mutex::new(None));
  let setup = PageSetup::from_value(
    json!({
      "fields": [
        {"type": "textInput", "name": "name", "value": "eth0"},
        {"type": "textInput", "name": "scratch", "value": "x", "submitValue": false}
      ],
      "buttons": [{"text": "Identify", "execute": {"type": "click", "click": "identify"}}]
    }),
    &creating(),
  )
  .unwrap();
  let form = Arc::new(MemoryForm::new(setup.initial_values()));
  let fakes = Harness::new(FakeRpc::new());
  let sink = seen.clone();
  let services = fakes.services().click_handler("identify", move |button, values| {
    *sink.lock().unwrap() = Some((button.text.clone(), values.clone()));
  });
  let page = setup.mount(form, services);

  assert_eq!(page.click(0).await.unwrap(), ButtonOutcome::Completed);
  let (text, values) = seen.lock().unwrap().clone().unwrap();
  assert_eq!(text.as_deref(), Some("Identify"));
  assert_eq!(values, bag(json!({"name": "eth0"})));
}

#[tokio::test]
async fn unknown_click_handler_is_ignored() {
  let config = json!({"buttons": [{"text": "X", "execute": {"type": "click", "click": "missing"}}]});
  let m = mount(config, &creating(), FakeRpc::new());
  assert_eq!(m.page.click(0).await.unwrap(), ButtonOutcome::Completed);
}

#[tokio::test]
async fn request_action_formats_and_follows_up() {
  let rpc = FakeRpc::new().respond("identify", json!({"blinks": 3}));
  let config = json!({
    "fields": [{"type": "textInput", "name": "devicename", "value": "eth0"}],
    "buttons": [{
      "text": "Identify",
      "execute": {"type": "request", "request": {
        "service": "Network",
        "method": "identify",
        "params": {"devicename": "{{ devicename }}", "uuid": "{{ _routeParams.uuid }}", "seconds": 10},
        "progressMessage": "Identifying ...",
        "successNotification": "{{ devicename }} blinked {{ _response.blinks }} times",
        "successUrl": "/network/{{ devicename }}"
      }}
    }]
  });
  let m = mount(config, &creating().param("uuid", "u2"), rpc);

  m.page.click(0).await.unwrap();
  let calls = m.fakes.rpc.calls();
  assert_eq!(Value::Object(calls[0].params.clone()), json!({"devicename": "eth0", "uuid": "u2", "seconds": 10}));
  assert_eq!(m.fakes.progress.events(), vec!["start: Identifying ...", "stop"]);
  assert_eq!(m.fakes.notifier.shown(), vec![(NotificationType::Success, "eth0 blinked 3 times".to_string())]);
  assert_eq!(m.fakes.navigator.urls(), vec!["/network/eth0"]);
}

#[tokio::test]
async fn request_action_without_progress_message_shows_none() {
  let config = json!({
    "buttons": [{"text": "Ping", "execute": {"type": "request", "request": {"service": "S", "method": "ping"}}}]
  });
  let m = mount(config, &creating(), FakeRpc::new());
  m.page.click(0).await.unwrap();
  assert!(m.fakes.progress.events().is_empty());
  assert_eq!(m.fakes.rpc.methods(), vec!["ping"]);
}

#[tokio::test]
async fn task_dialog_action() {
  let config = json!({
    "fields": [{"type": "textInput", "name": "devicename", "value": "eth0"}],
    "buttons": [{
      "text": "Apply",
      "execute": {"type": "taskDialog", "taskDialog": {
        "config": {
          "title": "Applying",
          "request": {"service": "Config", "method": "applyChanges", "params": {"modules": ["{{ devicename }}"]}}
        },
        "successUrl": "/network/{{ devicename }}"
      }}
    }]
  });
  let m = mount(config, &creating(), FakeRpc::new());

  m.fakes.dialogs.answer(json!(false));
  m.page.click(0).await.unwrap();
  assert!(m.fakes.navigator.urls().is_empty());

  m.page.click(0).await.unwrap();
  assert_eq!(m.fakes.navigator.urls(), vec!["/network/eth0"]);

  let (kind, opened) = m.fakes.dialogs.opened().remove(0);
  assert_eq!(kind, DialogKind::Task);
  assert_eq!(opened["width"], json!("75%"));
  assert_eq!(opened["request"]["params"], json!({"modules": ["eth0"]}));
}

#[tokio::test]
async fn submit_without_write_request_marks_pristine() {
  let config = json!({
    "fields": [{"type": "textInput", "name": "name"}],
    "buttons": [{"template": "submit", "execute": {"type": "click", "click": "done"}}]
  });
  let calls = Arc::new(Mutex::new(0));
  let counter = calls.clone();
  let setup = PageSetup::from_value(config, &creating()).unwrap();
  let form = Arc::new(MemoryForm::new(setup.initial_values()));
  let fakes = Harness::new(FakeRpc::new());
  let services = fakes.services().click_handler("done", move |_, _| *counter.lock().unwrap() += 1);
  let page = setup.mount(form.clone(), services);

  form.set_value("name", json!("x"));
  assert!(form.is_dirty());
  page.click(0).await.unwrap();
  assert!(!form.is_dirty());
  assert_eq!(*calls.lock().unwrap(), 1);
  assert!(fakes.rpc.calls().is_empty());
}

#[tokio::test]
async fn disabled_button_does_nothing() {
  let config = json!({
    "fields": [{"type": "textInput", "name": "name", "value": ""}],
    "buttons": [{
      "text": "Go",
      "enabledConstraint": {"operator": "n", "arg0": {"prop": "name"}},
      "execute": {"type": "url", "url": "/go"}
    }]
  });
  let m = mount(config, &creating(), FakeRpc::new());
  assert!(m.page.buttons()[0].disabled);
  assert_eq!(m.page.click(0).await.unwrap(), ButtonOutcome::Cancelled);
  assert!(m.fakes.navigator.urls().is_empty());
  assert!(m.page.click(5).await.is_err());
}

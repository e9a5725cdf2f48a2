/* src/page/format/rust/src/tests/mod.rs */

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;


fn page_context() -> Value {
  json!({
    "_routeParams": {"uuid": "4b2c7c38-3b0b-4a4e-9d2e-01d3b1f0a8f1"},
    "_routeQueryParams": {},
    "_routeConfig": {"data": {"editing": true, "title": "Edit"}},
    "_editing": true,
    "devicename": "eth0",
  })
}

// -- format --

#[test]
fn format_plain_string_is_unchanged() {
  assert_eq!(format("no tokens here", &page_context()), "no tokens here");
}

#[test]
fn format_substitutes_path() {
  assert_eq!(
    format("{{ _routeParams.uuid }}", &page_context()),
    "4b2c7c38-3b0b-4a4e-9d2e-01d3b1f0a8f1"
  );
}

#[test]
fn format_substitutes_every_occurrence() {
  assert_eq!(format("{{ devicename }}/{{devicename}}", &page_context()), "eth0/eth0");
}

#[test]
fn format_missing_path_is_empty() {
  assert_eq!(format("[{{ _routeParams.nope.deeper }}]", &page_context()), "[]");
  assert_eq!(format("[{{ nope }}]", &json!(null)), "[]");
}

#[test]
fn format_is_deterministic_for_absent_paths() {
  let a = format("x{{ a.b }}y{{ c }}z", &json!({}));
  let b = format("x{{ a.b }}y{{ c }}z", &json!({}));
  assert_eq!(a, "xyz");
  assert_eq!(a, b);
}

#[test]
fn format_malformed_marker_renders_empty() {
  assert_eq!(format("a{{ ) }}b", &page_context()), "ab");
  assert_eq!(format("a{{ x | bogus }}b", &page_context()), "ab");
}

#[test]
fn format_with_diagnostics_reports_problems() {
  let (out, diagnostics) = format_with_diagnostics("{{ devicename }}{{ 'x' | wat }}", &page_context());
  assert_eq!(out, "eth0");
  assert_eq!(diagnostics.len(), 1);
  assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownFilter);
}

#[test]
fn format_unclosed_marker_is_literal() {
  assert_eq!(format("{{ devicename", &page_context()), "{{ devicename");
}

#[test]
fn format_boolean_filter() {
  assert_eq!(format("{{ _routeConfig.data.editing | toboolean }}", &page_context()), "true");
  assert_eq!(format("{{ _routeConfig.data.missing | toboolean }}", &page_context()), "false");
}

// -- format_deep --

#[test]
fn format_deep_formats_string_leaves_only() {
  let params = json!({
    "uuid": "{{ _routeParams.uuid }}",
    "limit": 25,
    "enabled": true,
    "nested": {"names": ["{{ devicename }}", null]},
  });
  assert_eq!(
    format_deep(&params, &page_context()),
    json!({
      "uuid": "4b2c7c38-3b0b-4a4e-9d2e-01d3b1f0a8f1",
      "limit": 25,
      "enabled": true,
      "nested": {"names": ["eth0", null]},
    })
  );
}

#[test]
fn format_deep_leaves_keys_alone() {
  let value = json!({"{{ devicename }}": 1});
  assert_eq!(format_deep(&value, &page_context()), value);
}

// -- is_formatable --

#[test]
fn is_formatable_detects_markers() {
  assert!(is_formatable(&json!("{{ x }}")));
  assert!(is_formatable(&json!({"a": [1, "id={{ uuid }}"]})));
  assert!(!is_formatable(&json!("{ x }")));
  assert!(!is_formatable(&json!("{{ unclosed")));
  assert!(!is_formatable(&json!(42)));
  assert!(!is_formatable(&json!({"a": "plain"})));
}

// -- lookup --

#[test]
fn lookup_paths() {
  let ctx = page_context();
  assert_eq!(lookup(&ctx, "_routeConfig.data.editing"), Some(&json!(true)));
  assert_eq!(lookup(&ctx, "_routeConfig.data.nope"), None);
  assert_eq!(lookup(&json!({"rows": [{"n": 1}]}), "rows[0].n"), Some(&json!(1)));
}

#[test]
fn lookup_rooted_at_map() {
  let Value::Object(values) = json!({"dns": {"servers": ["1.1.1.1"]}, "mtu": 1500}) else {
    unreachable!()
  };
  assert_eq!(lookup_in(&values, "mtu"), Some(&json!(1500)));
  assert_eq!(lookup_in(&values, "dns.servers[0]"), Some(&json!("1.1.1.1")));
  assert_eq!(lookup_in(&values, "dns.missing"), None);
}

/* demos/interface-form/src/main.rs */

mod backend;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use formwork::{FormHandle, MemoryForm, PageServices, PageSetup, PageStatus, RouteSnapshot};
use serde_json::Value;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use backend::{AutoDialogs, LogNavigator, LogNotifier, LogProgress, NetworkBackend};

const PAGE: &str = include_str!("../page.json");

#[derive(Parser)]
#[command(name = "interface-form", about = "Drive the ethernet interface page against an in-process backend")]
struct Cli {
  /// Edit the interface with this uuid instead of creating one
  #[arg(long)]
  uuid: Option<String>,
  /// Page definition to load instead of the built-in one
  #[arg(long)]
  config: Option<PathBuf>,
  /// Field edits applied before saving, as name=value (value may be JSON)
  #[arg(long = "set", value_name = "NAME=VALUE")]
  edits: Vec<String>,
  /// Decline confirmation dialogs
  #[arg(long)]
  decline: bool,
  /// Simulated backend latency in milliseconds
  #[arg(long, default_value_t = 50)]
  latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();
  let raw = match &cli.config {
    Some(path) => std::fs::read_to_string(path)?,
    None => PAGE.to_string(),
  };

  let mut route = RouteSnapshot::new().data("notificationTitle", "Updated interface {{ devicename }}");
  route = match &cli.uuid {
    Some(uuid) => route.param("uuid", uuid.as_str()).editing(true),
    None => route.editing(false),
  };

  let setup = PageSetup::from_value(serde_json::from_str(&raw)?, &route)?;
  let form = Arc::new(MemoryForm::new(setup.initial_values()));
  let network = NetworkBackend::new(Duration::from_millis(cli.latency_ms));
  let services = PageServices::new(
    Arc::new(network.clone()),
    Arc::new(LogNavigator),
    Arc::new(AutoDialogs { confirm: !cli.decline }),
    Arc::new(LogNotifier),
    Arc::new(LogProgress),
  );
  let page = setup.mount(form.clone(), services);

  while page.status() != PageStatus::Ready {
    if let PageStatus::Error(e) = page.status() {
      return Err(e.into());
    }
    sleep(Duration::from_millis(5)).await;
  }

  for edit in &cli.edits {
    let (name, value) = edit.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got {edit:?}"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    form.set_value(name, value);
  }
  // let the constraint listener settle
  sleep(Duration::from_millis(20)).await;

  for (name, state) in page.field_states() {
    info!(field = %name, disabled = state.disabled, required = state.required, visible = state.visible, "field");
  }

  let submit = page.buttons().len().saturating_sub(1);
  let outcome = page.click(submit).await?;
  info!(?outcome, dirty = form.is_dirty(), "submit finished");

  for iface in network.interfaces() {
    info!(interface = %serde_json::Value::Object(iface), "stored");
  }
  page.destroy();
  Ok(())
}

/* src/page/core/rust/src/lib.rs */

//! Configuration-driven form pages.
//!
//! A [`FormPageConfig`] describes fields, a read/write request contract and
//! buttons. [`PageSetup`] sanitizes it against a route, [`PageSetup::mount`]
//! binds it to a [`FormHandle`] and the page's collaborators, and the
//! resulting [`FormPage`] loads data, keeps button and field state in sync
//! with the value bag and runs button clicks through the action pipeline.

pub mod action;
pub mod config;
pub mod constraint;
pub mod context;
mod debounce;
pub mod errors;
pub mod field_state;
pub mod form;
pub mod loader;
pub mod page;
pub mod response;
pub mod sanitize;
pub mod services;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

// Re-exports for ergonomic use
pub use action::ButtonOutcome;
pub use config::{
  AutoReload, ButtonConfig, ButtonTemplate, Execute, FieldConfig, Flag, FormPageConfig, FormValues, RequestConfig,
};
pub use constraint::{Arg, Constraint, Operator};
pub use context::{PageContext, PageStatus, RouteSnapshot};
pub use errors::{PageError, PageResult};
pub use field_state::{FieldState, FieldStates, evaluate_field_states};
pub use form::{FormHandle, MemoryForm, submit_values};
pub use loader::DataLoader;
pub use page::{EngineOptions, FormPage, PageSetup};
pub use sanitize::sanitize;
pub use services::{
  BoxFuture, BoxStream, DialogKind, DialogService, Navigator, NotificationType, Notifier, PageServices,
  ProgressIndicator, RpcCall, RpcService,
};

//! Long-running surface for scanroute.
//!
//! - [`service::serve`] runs the startup sweep, the drop-folder watch loop and
//!   the HTTP listener until Ctrl-C.
//! - [`http`] holds the single set of route handlers.
//! - [`worker`] owns batch processing on a dedicated thread behind a debounce
//!   actor.

pub mod error;
pub mod files;
pub mod http;
pub mod service;
pub mod watcher;
pub mod worker;

pub use error::{ApiError, ApiResult};
pub use http::{router, AppState};
pub use service::{serve, ServeError, ServeOptions};

//! # Doctest Server
//!
//! Editor-facing service for the annotation engine.
//!
//! Hosts talk JSON lines over stdio: `list_actions` maps a file's
//! directives to `Evaluate`/`Refresh` affordances, `invoke` evaluates one
//! directive in an isolated session and returns minimal text edits for the
//! host to apply. The host owns the buffer; this service never writes files.

mod lens;
mod router;
mod service;

pub use lens::actions_for;
pub use router::{error_code, CommandRouter};
pub use service::Service;

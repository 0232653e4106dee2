//! Dependent-field resolution engine.
//!
//! Couples a [`formwork_model::FormDefinition`] to a live editing session:
//! a dependency graph derived from field specs, an option cache with
//! issue-token stale discard, cascade-clearing of dependent values, a
//! reset state machine for host-supplied initial values, and a validated,
//! idempotent-guarded submit path.
//!
//! The synchronous core is [`controller::FormController`]; the async
//! driver around it is [`session::FormSession`].

pub mod cache;
pub mod controller;
pub mod effect;
pub mod error;
pub mod event;
pub mod graph;
pub mod options;
pub mod session;
mod submit;

pub use cache::{CommitOutcome, LoadState, OptionCache};
pub use controller::{FieldView, FormController, FormSnapshot};
pub use effect::Effect;
pub use error::EngineError;
pub use event::FormEvent;
pub use graph::DependencyGraph;
pub use options::{CyclePolicy, EngineOptions, ErrorVisibility};
pub use session::{FormHandle, FormHost, FormSession};

//! Compile tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! compilation semantics. The compiler reports through `CompileEvent`s;
//! `TracingSink` forwards them to the `tracing` crate.


use crate::error::ErrorKind;
use tracing::{debug, warn};

///
/// CompileTraceSink
///

pub trait CompileTraceSink: Send + Sync {
    fn on_event(&self, event: CompileEvent);
}

///
/// CompileEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompileEvent {
    /// Every field reference of the query bound to a descriptor.
    Resolved { entity: String, fields: usize },
    FilterCompiled {
        entity: String,
        leaves: usize,
        groups: usize,
    },
    SortCompiled { entity: String, terms: usize },
    Failed { entity: String, kind: ErrorKind },
}

///
/// TracingSink
///
/// Forwards compile events to `tracing` under the `icyql` target.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl CompileTraceSink for TracingSink {
    fn on_event(&self, event: CompileEvent) {
        match event {
            CompileEvent::Resolved { entity, fields } => {
                debug!(target: "icyql", %entity, fields, "query resolved");
            }
            CompileEvent::FilterCompiled {
                entity,
                leaves,
                groups,
            } => {
                debug!(target: "icyql", %entity, leaves, groups, "filter compiled");
            }
            CompileEvent::SortCompiled { entity, terms } => {
                debug!(target: "icyql", %entity, terms, "sort compiled");
            }
            CompileEvent::Failed { entity, kind } => {
                warn!(target: "icyql", %entity, kind = kind.as_str(), "query compilation failed");
            }
        }
    }
}

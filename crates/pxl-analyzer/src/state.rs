//! Read-only compilation context shared by every rule

use chrono::{DateTime, Utc};
use pxl_types::{FunctionRegistry, MetadataRegistry, RelationMap};

/// Registries and reference time for one compilation run.
///
/// Everything here is borrowed from the caller and never mutated, so
/// independent compilations can share the same registries.
#[derive(Debug, Clone, Copy)]
pub struct CompilerState<'a> {
    /// Table name to relation
    pub relations: &'a RelationMap,
    /// Function, aggregate and table-function signatures
    pub functions: &'a FunctionRegistry,
    /// Metadata keys
    pub metadata: &'a MetadataRegistry,
    /// Instant `now()` evaluates to
    pub time_now: DateTime<Utc>,
}

impl<'a> CompilerState<'a> {
    /// Create a state whose reference time is the current wall clock
    pub fn new(relations: &'a RelationMap, functions: &'a FunctionRegistry, metadata: &'a MetadataRegistry) -> Self {
        Self {
            relations,
            functions,
            metadata,
            time_now: Utc::now(),
        }
    }

    /// Pin the reference time
    pub fn with_time_now(mut self, time_now: DateTime<Utc>) -> Self {
        self.time_now = time_now;
        self
    }

    /// Reference time in nanoseconds since the Unix epoch.
    ///
    /// Saturates outside the range representable in an `i64`
    /// (roughly years 1677 to 2262).
    pub fn time_now_ns(&self) -> i64 {
        self.time_now
            .timestamp_nanos_opt()
            .unwrap_or(if self.time_now.timestamp() < 0 { i64::MIN } else { i64::MAX })
    }
}

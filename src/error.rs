// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Programmer-error messages.
//!
//! The ECS core has no fallible I/O and threads no `Result` through its
//! public API (see the crate-level error handling design). Every error this
//! crate can produce is a programmer error — API misuse that is surfaced
//! immediately via `panic!`, never caught or recovered from. `EcsError`
//! exists purely to give those panic messages a single, consistent,
//! `Display`-formatted shape instead of ad hoc `format!` calls scattered
//! across `world` and `query`.

use std::fmt;

/// A programmer-error condition, formatted for a panic message.
///
/// Never returned from a fallible operation; always handed straight to
/// `panic!("{}", ...)` at the call site that detected the misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// `get_component::<T>`/`has_component::<T>` was called with a dead or
    /// never-allocated [`crate::entity::Entity`].
    DeadEntity,
    /// `get_component::<T>` was called on an entity that does not carry a
    /// component of that type.
    MissingComponent { type_name: &'static str },
    /// More than [`crate::signature::MAX_COMPONENTS`] distinct component
    /// types were registered.
    TooManyComponentTypes { limit: usize },
    /// A [`crate::query::Query`] was constructed whose include and exclude
    /// signatures share at least one component type.
    OverlappingQueryFilter,
    /// A live `Query` observed a structural mutation on the `World` it
    /// borrows from (create/destroy entity, add/remove component).
    StaleQuery,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::DeadEntity => {
                write!(f, "operation called on a dead or invalid entity")
            }
            EcsError::MissingComponent { type_name } => {
                write!(f, "entity does not have a component of type {type_name}")
            }
            EcsError::TooManyComponentTypes { limit } => {
                write!(f, "exceeded MAX_COMPONENTS ({limit}): cannot register another distinct component type")
            }
            EcsError::OverlappingQueryFilter => {
                write!(f, "query filter requires and excludes the same component type")
            }
            EcsError::StaleQuery => write!(
                f,
                "world was structurally mutated (entity/component add, remove, create, or destroy) \
                 while this query was still alive"
            ),
        }
    }
}

impl std::error::Error for EcsError {}

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

//! Archetype ECS - an archetype-based Entity-Component-System storage and
//! query engine.
//!
//! A [`World`] owns every entity and partitions their component data into
//! [`archetype::Archetype`]s keyed by signature, each backed by one or more
//! fixed-capacity [`chunk::Chunk`]s laid out as structure-of-arrays. Compile-time
//! typed [`query::Query`]s filter archetypes by an include/exclude signature and
//! iterate their chunks directly, without touching archetype metadata per entity.
//!
//! This crate is single-threaded and in-process only: no persistence, no
//! networking, no scripting integration, no parent/child hierarchy, no change
//! detection, and no automatic parallel scheduling of systems. Concurrency
//! across systems is the caller's responsibility.

pub mod archetype;
pub mod chunk;
pub mod component;
pub mod entity;
pub mod error;
pub mod prelude;
pub mod query;
pub mod signature;
pub mod world;

pub use chunk::{CHUNK_SIZE_BYTES, MIN_ENTITIES_PER_CHUNK};
pub use component::{Bundle, Component};
pub use entity::Entity;
pub use error::EcsError;
pub use query::{FetchOwned, Query, QueryFilter, Without};
pub use signature::{Signature, MAX_COMPONENTS};
pub use world::World;

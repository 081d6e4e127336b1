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

//! `World`: the storage engine's single entry point. Owns every entity, the
//! set of archetypes entities are sorted into by signature, and the
//! migrations that move an entity between archetypes as its component set
//! changes.

use ahash::AHashMap;
use smallvec::SmallVec;
#[cfg(feature = "profiling")]
use tracing::trace;

use crate::archetype::Archetype;
use crate::component::{component_type_id, Bundle, Component, MAX_BUNDLE_COMPONENTS};
use crate::entity::{Entity, EntityDirectory, EntityLocation};
use crate::error::EcsError;
use crate::query::{Fetch, Query, QueryFilter};
use crate::signature::Signature;

/// Owns all entities and archetypes and is the only way to create, destroy,
/// or mutate either.
///
/// Mutation through `&mut World` is the common case and is checked entirely
/// by the borrow checker: a live `Query` borrows `&World`, so it's a compile
/// error to call `add_component`/`remove_component`/`destroy_entity` while
/// one is held. The one gap is a `Query` that has extracted raw pointers
/// and outlived its borrow by transmutation or similar; in debug builds a
/// generation counter bumped on every structural mutation catches that at
/// runtime instead of silently aliasing storage. See `Query::check_not_stale`.
pub struct World {
    entities: EntityDirectory,
    archetypes: Vec<Archetype>,
    archetype_index: AHashMap<u64, usize>,
    #[cfg(debug_assertions)]
    generation: u64,
}

impl World {
    pub fn new() -> Self {
        let mut world = World {
            entities: EntityDirectory::new(),
            archetypes: Vec::new(),
            archetype_index: AHashMap::new(),
            #[cfg(debug_assertions)]
            generation: 0,
        };
        world.get_or_create_archetype(Signature::EMPTY);
        world
    }

    fn get_or_create_archetype(&mut self, signature: Signature) -> usize {
        if let Some(&id) = self.archetype_index.get(&signature.bits()) {
            return id;
        }
        let id = self.archetypes.len();
        self.archetypes.push(Archetype::new(signature));
        self.archetype_index.insert(signature.bits(), id);
        id
    }

    #[cfg(debug_assertions)]
    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[cfg(debug_assertions)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(not(debug_assertions))]
    pub(crate) fn generation(&self) -> u64 {
        0
    }

    pub(crate) fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Number of currently live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Number of freed entity ids available for reuse.
    pub fn recycled_entity_count(&self) -> usize {
        self.entities.recycled_count()
    }

    /// Number of distinct archetypes currently in use, including the empty one.
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Create a new entity with the given bundle of components.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Entity {
        let type_ids = B::type_ids();
        let signature = B::signature();
        let archetype_id = self.get_or_create_archetype(signature);

        // Placeholder location: overwritten below once the row actually
        // lands, but `EntityDirectory::allocate` needs something to store.
        let placeholder = EntityLocation {
            archetype_id,
            chunk_index: 0,
            slot: 0,
        };
        let entity = self.entities.allocate(placeholder);

        let archetype = &mut self.archetypes[archetype_id];
        let (chunk_index, slot) = archetype.add_entity(entity);
        let chunk = archetype.chunk_mut(chunk_index);

        let ptrs: SmallVec<[*mut u8; MAX_BUNDLE_COMPONENTS]> = type_ids
            .iter()
            .map(|&tid| {
                chunk
                    .component_ptr(tid, slot)
                    .expect("bundle component missing from the archetype just created for it")
            })
            .collect();
        unsafe { bundle.write_components(&ptrs) };

        self.entities.set_location(
            entity,
            EntityLocation {
                archetype_id,
                chunk_index,
                slot,
            },
        );

        #[cfg(debug_assertions)]
        self.bump_generation();
        #[cfg(feature = "profiling")]
        trace!(entity = entity.id(), archetype = archetype_id, "create_entity");

        entity
    }

    /// Destroy `entity`. A no-op if it is already dead or was never valid.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.entities.is_alive(entity) {
            return;
        }
        let loc = self.entities.location(entity).unwrap();
        let archetype = &mut self.archetypes[loc.archetype_id];
        archetype.chunk_mut(loc.chunk_index).drop_row(loc.slot);
        if let Some(moved) = archetype.remove_entity(loc.chunk_index, loc.slot) {
            self.entities.set_location(moved, loc);
        }
        self.entities.free(entity);

        #[cfg(debug_assertions)]
        self.bump_generation();
        #[cfg(feature = "profiling")]
        trace!(entity = entity.id(), "destroy_entity");
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        match self.entities.location(entity) {
            Some(loc) => self.archetypes[loc.archetype_id]
                .signature()
                .contains(component_type_id::<T>()),
            None => false,
        }
    }

    /// Borrow `entity`'s component of type `T` mutably.
    ///
    /// # Panics
    /// Panics if `entity` is dead/invalid, or if it does not have a
    /// component of type `T`.
    pub fn get_component<T: Component>(&mut self, entity: Entity) -> &mut T {
        let loc = self
            .entities
            .location(entity)
            .unwrap_or_else(|| panic!("{}", EcsError::DeadEntity));
        let type_id = component_type_id::<T>();
        let ptr = self.archetypes[loc.archetype_id]
            .chunk(loc.chunk_index)
            .component_ptr(type_id, loc.slot)
            .unwrap_or_else(|| {
                panic!(
                    "{}",
                    EcsError::MissingComponent {
                        type_name: std::any::type_name::<T>()
                    }
                )
            }) as *mut T;
        unsafe { &mut *ptr }
    }

    /// Attach `value` to `entity`. If `entity` already has a component of
    /// type `T`, the existing value is overwritten (and dropped) in place
    /// rather than triggering an archetype migration.
    ///
    /// # Panics
    /// Panics if `entity` is dead or invalid.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        let loc = self
            .entities
            .location(entity)
            .unwrap_or_else(|| panic!("{}", EcsError::DeadEntity));
        let type_id = component_type_id::<T>();
        let old_signature = self.archetypes[loc.archetype_id].signature();

        if old_signature.contains(type_id) {
            let ptr = self.archetypes[loc.archetype_id]
                .chunk(loc.chunk_index)
                .component_ptr(type_id, loc.slot)
                .unwrap() as *mut T;
            // The slot already holds a live `T`; assigning through the
            // pointer drops the old value instead of leaking it the way a
            // raw `ptr::write` over live memory would.
            unsafe { *ptr = value };
            #[cfg(debug_assertions)]
            self.bump_generation();
            return unsafe { &mut *ptr };
        }

        let new_signature = old_signature.with(type_id);
        let new_loc = self.move_entity(entity, loc, new_signature, |archetype, chunk_index, slot| {
            let ptr = archetype
                .chunk_mut(chunk_index)
                .component_ptr(type_id, slot)
                .unwrap() as *mut T;
            unsafe { ptr.write(value) };
        });

        #[cfg(debug_assertions)]
        self.bump_generation();
        #[cfg(feature = "profiling")]
        trace!(entity = entity.id(), component = std::any::type_name::<T>(), "add_component");

        let ptr = self.archetypes[new_loc.archetype_id]
            .chunk(new_loc.chunk_index)
            .component_ptr(type_id, new_loc.slot)
            .unwrap() as *mut T;
        unsafe { &mut *ptr }
    }

    /// Detach `entity`'s component of type `T`, if it has one. A no-op
    /// (silently) if `entity` is dead/invalid or does not carry `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        let Some(loc) = self.entities.location(entity) else {
            return;
        };
        let type_id = component_type_id::<T>();
        let old_signature = self.archetypes[loc.archetype_id].signature();
        if !old_signature.contains(type_id) {
            return;
        }

        let new_signature = {
            let mut sig = old_signature;
            sig.remove(type_id);
            sig
        };
        self.move_entity(entity, loc, new_signature, |_, _, _| {});

        #[cfg(debug_assertions)]
        self.bump_generation();
        #[cfg(feature = "profiling")]
        trace!(entity = entity.id(), component = std::any::type_name::<T>(), "remove_component");
    }

    /// Move `entity` from its current archetype/chunk/slot to the archetype
    /// for `new_signature`, copying every intersecting column, dropping any
    /// column present in the old signature but absent from the new one, then
    /// running `init_new` to initialize whatever the new signature adds that
    /// the old one didn't have. Updates the directory for both `entity` and
    /// whichever entity ends up swapped into its old slot.
    fn move_entity(
        &mut self,
        entity: Entity,
        old_loc: EntityLocation,
        new_signature: Signature,
        init_new: impl FnOnce(&mut Archetype, usize, usize),
    ) -> EntityLocation {
        let new_archetype_id = self.get_or_create_archetype(new_signature);
        debug_assert_ne!(old_loc.archetype_id, new_archetype_id);

        let (old_archetype, new_archetype) = borrow_two_mut(
            &mut self.archetypes,
            old_loc.archetype_id,
            new_archetype_id,
        );

        let (new_chunk_index, new_slot) = new_archetype.add_entity(entity);
        old_archetype
            .chunk(old_loc.chunk_index)
            .copy_row_to(old_loc.slot, new_archetype.chunk_mut(new_chunk_index), new_slot);

        let old_signature = old_archetype.signature();
        for type_id in old_signature.iter() {
            if !new_signature.contains(type_id) {
                old_archetype
                    .chunk_mut(old_loc.chunk_index)
                    .drop_component_at(type_id, old_loc.slot);
            }
        }

        init_new(new_archetype, new_chunk_index, new_slot);

        if let Some(moved) = old_archetype.remove_entity(old_loc.chunk_index, old_loc.slot) {
            self.entities.set_location(moved, old_loc);
        }

        let new_loc = EntityLocation {
            archetype_id: new_archetype_id,
            chunk_index: new_chunk_index,
            slot: new_slot,
        };
        self.entities.set_location(entity, new_loc);
        new_loc
    }

    /// Build a query over every entity whose archetype satisfies `F`'s
    /// include/exclude signature.
    ///
    /// Takes `&self`, not `&mut self`, even for filters that fetch `&mut T`:
    /// mutation happens through raw pointers reconstructed inside `Fetch`
    /// impls, the same escape hatch real archetype ECS crates use to let a
    /// query mutate components while the rest of the world stays read-only
    /// for its lifetime. See the module-level docs on [`World`] for the
    /// safety discipline this relies on.
    pub fn query<'w, F>(&'w self) -> Query<'w, F>
    where
        F: QueryFilter + Fetch<'w>,
    {
        Query::new(self)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutably borrow two distinct elements of `slice` at once.
fn borrow_two_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }
    impl Component for Velocity {}

    #[test]
    fn create_and_destroy_entity_roundtrip() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 1.0, y: 2.0 },));
        assert!(world.is_alive(e));
        assert_eq!(world.get_component::<Position>(e).x, 1.0);

        world.destroy_entity(e);
        assert!(!world.is_alive(e));
    }

    #[test]
    fn destroying_dead_entity_is_a_no_op() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.destroy_entity(e);
        world.destroy_entity(e); // must not panic
        assert!(!world.is_alive(e));
    }

    #[test]
    fn add_component_migrates_to_a_new_archetype() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.add_component(e, Velocity { dx: 1.0, dy: 1.0 });

        assert!(world.has_component::<Position>(e));
        assert!(world.has_component::<Velocity>(e));
        assert_eq!(world.archetype_count(), 3); // empty, Position, Position+Velocity
    }

    #[test]
    fn add_component_overwrites_existing_value_in_place() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 1.0, y: 1.0 },));
        let archetype_count_before = world.archetype_count();
        world.add_component(e, Position { x: 9.0, y: 9.0 });

        assert_eq!(world.get_component::<Position>(e).x, 9.0);
        assert_eq!(world.archetype_count(), archetype_count_before);
    }

    #[test]
    fn remove_component_migrates_and_drops_the_removed_value() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.add_component(e, Velocity { dx: 1.0, dy: 1.0 });
        world.remove_component::<Velocity>(e);

        assert!(world.has_component::<Position>(e));
        assert!(!world.has_component::<Velocity>(e));
    }

    #[test]
    fn remove_component_absent_is_a_no_op() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.remove_component::<Velocity>(e); // never had one
        assert!(world.is_alive(e));
    }

    #[test]
    #[should_panic(expected = "does not have a component")]
    fn get_component_panics_if_entity_lacks_it() {
        let mut world = World::new();
        let e = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.get_component::<Velocity>(e);
    }

    #[test]
    fn destroy_entity_swaps_the_tail_entity_into_the_freed_slot() {
        let mut world = World::new();
        let a = world.create_entity((Position { x: 1.0, y: 1.0 },));
        let b = world.create_entity((Position { x: 2.0, y: 2.0 },));
        let c = world.create_entity((Position { x: 3.0, y: 3.0 },));

        world.destroy_entity(a);

        assert!(world.is_alive(b));
        assert!(world.is_alive(c));
        assert_eq!(world.get_component::<Position>(b).x, 2.0);
        assert_eq!(world.get_component::<Position>(c).x, 3.0);
    }

    #[test]
    fn recycled_entity_id_gets_a_fresh_generation() {
        let mut world = World::new();
        let a = world.create_entity((Position { x: 0.0, y: 0.0 },));
        world.destroy_entity(a);
        let b = world.create_entity((Position { x: 1.0, y: 1.0 },));

        assert_eq!(a.id(), b.id());
        assert_ne!(a.generation(), b.generation());
        assert!(!world.is_alive(a));
        assert!(world.is_alive(b));
    }
}

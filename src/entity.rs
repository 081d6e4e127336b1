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

//! Entity identity and the free-list directory that allocates and recycles it.

/// A stable, generation-checked handle to an entity.
///
/// `id == 0` is reserved and never handed out by [`EntityDirectory`]; it is
/// the value returned by `Entity::INVALID`, useful as a default/placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
    generation: u32,
}

impl Entity {
    pub const INVALID: Entity = Entity {
        id: 0,
        generation: 0,
    };

    pub fn id(self) -> u32 {
        self.id
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::INVALID
    }
}

/// Where an entity's components currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype_id: usize,
    pub chunk_index: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
    location: EntityLocation,
}

/// Allocates and recycles [`Entity`] ids with generation counting.
///
/// Grounded directly in the original engine's `Coordinator`: entity id 0 is
/// never issued (`Entity::INVALID_ID`), freed ids are pushed onto a reuse
/// stack and their generation is bumped both when freed and again when
/// reused, and entities that were never allocated report as not alive.
pub struct EntityDirectory {
    slots: Vec<Slot>,
    free_ids: Vec<u32>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        // Slot 0 is permanently reserved so a default/invalid Entity can
        // never collide with a live one.
        Self {
            slots: vec![Slot {
                generation: 0,
                alive: false,
                location: EntityLocation {
                    archetype_id: 0,
                    chunk_index: 0,
                    slot: 0,
                },
            }],
            free_ids: Vec::new(),
        }
    }

    /// Allocate a new entity handle, reusing a freed id when one is
    /// available.
    pub fn allocate(&mut self, location: EntityLocation) -> Entity {
        if let Some(id) = self.free_ids.pop() {
            let slot = &mut self.slots[id as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            slot.location = location;
            return Entity {
                id,
                generation: slot.generation,
            };
        }

        let id = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            alive: true,
            location,
        });
        Entity { id, generation: 0 }
    }

    /// Returns true if `entity` refers to a currently live allocation at the
    /// exact generation that was handed out.
    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.id != 0
            && (entity.id as usize) < self.slots.len()
            && self.slots[entity.id as usize].alive
            && self.slots[entity.id as usize].generation == entity.generation
    }

    /// Free `entity`'s id for reuse. No-op if the entity is already dead or
    /// invalid (the caller's responsibility to check before acting on the
    /// assumption it freed anything).
    pub fn free(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            return;
        }
        let slot = &mut self.slots[entity.id as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        self.free_ids.push(entity.id);
    }

    pub fn location(&self, entity: Entity) -> Option<EntityLocation> {
        if !self.is_alive(entity) {
            return None;
        }
        Some(self.slots[entity.id as usize].location)
    }

    pub fn set_location(&mut self, entity: Entity, location: EntityLocation) {
        debug_assert!(self.is_alive(entity));
        self.slots[entity.id as usize].location = location;
    }

    /// Number of currently live entities.
    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|s| s.alive).count()
    }

    pub fn recycled_count(&self) -> usize {
        self.free_ids.len()
    }
}

impl Default for EntityDirectory {
    fn default() -> Self {
        Self::new()
    }
}

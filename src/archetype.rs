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

//! Archetype: an ordered run of same-signature chunks.

use crate::chunk::Chunk;
use crate::entity::Entity;
use crate::signature::Signature;

/// All entities sharing one exact component signature, stored across one
/// or more fixed-capacity [`Chunk`]s.
pub struct Archetype {
    signature: Signature,
    chunks: Vec<Chunk>,
}

impl Archetype {
    pub fn new(signature: Signature) -> Self {
        Archetype {
            signature,
            chunks: vec![Chunk::new(signature)],
        }
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(Chunk::is_empty)
    }

    /// Append `entity`, allocating a new chunk if the last one is full.
    /// Returns the chunk index and slot the entity landed in.
    pub fn add_entity(&mut self, entity: Entity) -> (usize, usize) {
        if !self.chunks.last().is_some_and(Chunk::has_space) {
            self.chunks.push(Chunk::new(self.signature));
        }
        let chunk_index = self.chunks.len() - 1;
        let slot = self.chunks[chunk_index].add_entity(entity);
        (chunk_index, slot)
    }

    pub fn chunk(&self, chunk_index: usize) -> &Chunk {
        &self.chunks[chunk_index]
    }

    pub fn chunk_mut(&mut self, chunk_index: usize) -> &mut Chunk {
        &mut self.chunks[chunk_index]
    }

    /// Remove the entity at `(chunk_index, slot)`. Returns the entity that
    /// ended up occupying that slot afterward, if any (the caller must fix
    /// up that entity's recorded location).
    pub fn remove_entity(&mut self, chunk_index: usize, slot: usize) -> Option<Entity> {
        self.chunks[chunk_index].swap_remove(slot)
    }
}

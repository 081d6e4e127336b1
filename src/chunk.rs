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

//! Chunk: a fixed-capacity slab of entity-interleaved component storage.
//!
//! Every chunk in an archetype shares the archetype's signature and layout.
//! Component values for a slot live in one contiguous per-entity region of
//! a single byte buffer (`buffer[slot*stride + offset(type)..][..size(type)]`),
//! the "entity-interleaved" layout described for `Chunk` in the data model:
//! it is what lets a chunk whose components are all bitwise-movable be
//! relocated and swap-removed with a single `memcpy` per entity instead of
//! one per column.

use smallvec::SmallVec;

use crate::component::component_meta;
use crate::entity::Entity;
use crate::signature::{Signature, MAX_COMPONENTS};

/// Chunk byte budget; enlarged per-chunk if the signature's per-entity
/// stride would otherwise fit fewer than [`MIN_ENTITIES_PER_CHUNK`] entities.
pub const CHUNK_SIZE_BYTES: usize = 16 * 1024;

/// Minimum number of entity slots guaranteed in a chunk regardless of how
/// wide its signature's per-entity stride is.
pub const MIN_ENTITIES_PER_CHUNK: usize = 64;

struct ColumnLayout {
    type_id: u32,
    offset: usize,
    size: usize,
    drop_thunk: Option<unsafe fn(*mut u8)>,
}

/// A fixed-capacity, append/swap-remove slab for one archetype signature.
pub struct Chunk {
    columns: SmallVec<[ColumnLayout; 8]>,
    type_index: [i8; MAX_COMPONENTS],
    stride: usize,
    all_trivial: bool,
    capacity: usize,
    count: usize,
    data: Vec<u8>,
    entities: Vec<Entity>,
}

impl Chunk {
    pub fn new(signature: Signature) -> Self {
        let mut columns = SmallVec::new();
        let mut type_index = [-1i8; MAX_COMPONENTS];
        let mut stride = 0usize;
        let mut all_trivial = true;

        for tid in signature.iter() {
            let meta = component_meta(tid);
            type_index[tid as usize] = columns.len() as i8;
            columns.push(ColumnLayout {
                type_id: tid,
                offset: stride,
                size: meta.size,
                drop_thunk: meta.drop_thunk,
            });
            if meta.drop_thunk.is_some() {
                all_trivial = false;
            }
            stride += meta.size;
        }

        let capacity = if stride == 0 {
            // Tag-only archetype: nothing to size a stride against, so the
            // byte budget itself becomes the slot count.
            CHUNK_SIZE_BYTES
        } else {
            let min_bytes = stride * MIN_ENTITIES_PER_CHUNK;
            let capacity_bytes = CHUNK_SIZE_BYTES.max(min_bytes);
            capacity_bytes / stride
        };

        Chunk {
            columns,
            type_index,
            stride,
            all_trivial,
            capacity,
            count: 0,
            data: vec![0u8; capacity * stride],
            entities: Vec::with_capacity(capacity),
        }
    }

    pub fn has_space(&self) -> bool {
        self.count < self.capacity
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_at(&self, slot: usize) -> Entity {
        self.entities[slot]
    }

    /// Append `entity` to the first free slot. Caller must have verified
    /// `has_space()`.
    pub fn add_entity(&mut self, entity: Entity) -> usize {
        debug_assert!(self.has_space());
        let slot = self.count;
        self.entities.push(entity);
        self.count += 1;
        slot
    }

    fn column_index(&self, type_id: u32) -> Option<usize> {
        let idx = *self.type_index.get(type_id as usize)?;
        if idx < 0 {
            None
        } else {
            Some(idx as usize)
        }
    }

    /// Offset and size of `type_id`'s column within one entity's slice, if
    /// this chunk's signature includes it.
    pub fn column_layout(&self, type_id: u32) -> Option<(usize, usize)> {
        let idx = self.column_index(type_id)?;
        let col = &self.columns[idx];
        Some((col.offset, col.size))
    }

    /// Raw pointer to `type_id`'s value at `slot`. `None` if this chunk's
    /// signature does not contain `type_id`.
    ///
    /// Returns a `*mut u8` even though `self` is only borrowed immutably:
    /// callers reconstruct `&T`/`&mut T` from it under the same aliasing
    /// discipline `Query` already relies on elsewhere (single-threaded,
    /// no two live fetches of the same component type).
    pub fn component_ptr(&self, type_id: u32, slot: usize) -> Option<*mut u8> {
        let (offset, _) = self.column_layout(type_id)?;
        let byte_offset = slot * self.stride + offset;
        Some(unsafe { self.data.as_ptr().add(byte_offset) as *mut u8 })
    }

    /// Run the registered destructor for `type_id`'s value at `slot`, if any.
    /// Used when a slot's value is discarded rather than moved (e.g. the
    /// component dropped by `remove_component`, or an entity destroyed
    /// outright).
    pub fn drop_component_at(&mut self, type_id: u32, slot: usize) {
        let Some(idx) = self.column_index(type_id) else {
            return;
        };
        let col = &self.columns[idx];
        if let Some(thunk) = col.drop_thunk {
            let ptr = unsafe { self.data.as_mut_ptr().add(slot * self.stride + col.offset) };
            unsafe { thunk(ptr) };
        }
    }

    /// Run every column's destructor over `slot`'s full set of values.
    pub fn drop_row(&mut self, slot: usize) {
        for i in 0..self.columns.len() {
            let col = &self.columns[i];
            if let Some(thunk) = col.drop_thunk {
                let ptr = unsafe { self.data.as_mut_ptr().add(slot * self.stride + col.offset) };
                unsafe { thunk(ptr) };
            }
        }
    }

    /// Copy every intersecting column from `self[idx_src]` into
    /// `dst[idx_dst]`. Columns present in `dst` but not `self` are left
    /// untouched (the caller initializes them); columns present in `self`
    /// but not `dst` are simply not copied (the caller is responsible for
    /// dropping them if they're being discarded rather than migrated).
    ///
    /// Uses the whole-row `memcpy` fast path when every column in `self`
    /// needs no custom drop/copy handling and `dst` shares the identical
    /// layout (same signature); falls back to per-column copies otherwise.
    pub fn copy_row_to(&self, idx_src: usize, dst: &mut Chunk, idx_dst: usize) {
        if self.all_trivial && self.stride == dst.stride && self.type_index == dst.type_index {
            unsafe {
                let src_ptr = self.data.as_ptr().add(idx_src * self.stride);
                let dst_ptr = dst.data.as_mut_ptr().add(idx_dst * dst.stride);
                std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, self.stride);
            }
            return;
        }

        for col in &self.columns {
            let Some(dst_idx) = dst.column_index(col.type_id) else {
                continue;
            };
            let dst_col = &dst.columns[dst_idx];
            debug_assert_eq!(col.size, dst_col.size);
            unsafe {
                let src_ptr = self
                    .data
                    .as_ptr()
                    .add(idx_src * self.stride + col.offset);
                let dst_ptr = dst
                    .data
                    .as_mut_ptr()
                    .add(idx_dst * dst.stride + dst_col.offset);
                std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, col.size);
            }
        }
    }

    /// Remove the entity at `slot` by swapping the last occupied slot into
    /// its place (no destructors run here; callers that are discarding the
    /// slot's values, rather than migrating them elsewhere, must call
    /// [`Chunk::drop_row`] first). Returns the entity that ended up at
    /// `slot`, if any entity was moved.
    pub fn swap_remove(&mut self, slot: usize) -> Option<Entity> {
        debug_assert!(slot < self.count);
        let last = self.count - 1;
        if slot != last && self.stride > 0 {
            unsafe {
                let base = self.data.as_mut_ptr();
                let src = base.add(last * self.stride);
                let dst = base.add(slot * self.stride);
                std::ptr::copy_nonoverlapping(src, dst, self.stride);
            }
        }
        self.entities.swap_remove(slot);
        self.count -= 1;
        if slot < self.entities.len() {
            Some(self.entities[slot])
        } else {
            None
        }
    }
}

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

//! Compile-time typed queries over matching archetypes.
//!
//! A query's include/exclude signature is derived once, at the type level,
//! from the tuple of filters it's instantiated with; iteration then visits
//! only the chunks of archetypes whose signature satisfies it, walking each
//! chunk's columns with a base pointer advanced by the chunk's per-entity
//! stride rather than recomputing `slot * stride` on every step.

use std::marker::PhantomData;

use crate::chunk::Chunk;
use crate::component::{component_type_id, Component};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::signature::Signature;
use crate::world::World;

/// Type-level description of which components a query requires present and
/// which it requires absent.
pub trait QueryFilter {
    fn include_signature() -> Signature;

    fn exclude_signature() -> Signature {
        Signature::EMPTY
    }
}

impl<T: Component> QueryFilter for &T {
    fn include_signature() -> Signature {
        Signature::EMPTY.with(component_type_id::<T>())
    }
}

impl<T: Component> QueryFilter for &mut T {
    fn include_signature() -> Signature {
        Signature::EMPTY.with(component_type_id::<T>())
    }
}

/// Filter requiring the absence of component `T`. Contributes no data to
/// the query's fetched item.
pub struct Without<T>(PhantomData<T>);

impl<T: Component> QueryFilter for Without<T> {
    fn include_signature() -> Signature {
        Signature::EMPTY
    }

    fn exclude_signature() -> Signature {
        Signature::EMPTY.with(component_type_id::<T>())
    }
}

macro_rules! impl_query_filter_tuple {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        impl<$($T: QueryFilter),*> QueryFilter for ($($T,)*) {
            fn include_signature() -> Signature {
                let mut sig = Signature::EMPTY;
                $(sig = sig.union($T::include_signature());)*
                sig
            }

            fn exclude_signature() -> Signature {
                let mut sig = Signature::EMPTY;
                $(sig = sig.union($T::exclude_signature());)*
                sig
            }
        }
    };
}

impl_query_filter_tuple!(A);
impl_query_filter_tuple!(A, B);
impl_query_filter_tuple!(A, B, C);
impl_query_filter_tuple!(A, B, C, D);
impl_query_filter_tuple!(A, B, C, D, E);
impl_query_filter_tuple!(A, B, C, D, E, F);
impl_query_filter_tuple!(A, B, C, D, E, F, G);
impl_query_filter_tuple!(A, B, C, D, E, F, G, H);

/// Produces the actual per-entity data a query yields, given a chunk whose
/// archetype already satisfied the include/exclude signature.
///
/// # Safety
/// Implementors must only ever read/write the column(s) named by their
/// `include_signature`, and `advance` must move `State` forward by exactly
/// one chunk row.
pub unsafe trait Fetch<'w>: QueryFilter {
    type Item;
    type State: Copy;

    fn prepare(chunk: &'w Chunk) -> Self::State;
    unsafe fn fetch(state: Self::State) -> Self::Item;
    unsafe fn advance(state: Self::State, stride: usize) -> Self::State;
}

unsafe impl<'w, T: Component> Fetch<'w> for &'w T {
    type Item = &'w T;
    type State = *const T;

    fn prepare(chunk: &'w Chunk) -> Self::State {
        chunk
            .component_ptr(component_type_id::<T>(), 0)
            .expect("matched archetype is missing a column the query requires") as *const T
    }

    unsafe fn fetch(state: Self::State) -> Self::Item {
        unsafe { &*state }
    }

    unsafe fn advance(state: Self::State, stride: usize) -> Self::State {
        unsafe { (state as *const u8).add(stride) as *const T }
    }
}

unsafe impl<'w, T: Component> Fetch<'w> for &'w mut T {
    type Item = &'w mut T;
    type State = *mut T;

    fn prepare(chunk: &'w Chunk) -> Self::State {
        chunk
            .component_ptr(component_type_id::<T>(), 0)
            .expect("matched archetype is missing a column the query requires") as *mut T
    }

    unsafe fn fetch(state: Self::State) -> Self::Item {
        unsafe { &mut *state }
    }

    unsafe fn advance(state: Self::State, stride: usize) -> Self::State {
        unsafe { (state as *mut u8).add(stride) as *mut T }
    }
}

unsafe impl<'w, T: Component> Fetch<'w> for Without<T> {
    type Item = ();
    type State = ();

    fn prepare(_chunk: &'w Chunk) -> Self::State {}
    unsafe fn fetch(_state: Self::State) -> Self::Item {}
    unsafe fn advance(_state: Self::State, _stride: usize) -> Self::State {}
}

macro_rules! impl_fetch_tuple {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        unsafe impl<'w, $($T: Fetch<'w>),*> Fetch<'w> for ($($T,)*) {
            type Item = ($($T::Item,)*);
            type State = ($($T::State,)*);

            fn prepare(chunk: &'w Chunk) -> Self::State {
                ($($T::prepare(chunk),)*)
            }

            unsafe fn fetch(state: Self::State) -> Self::Item {
                let ($($T,)*) = state;
                unsafe { ($($T::fetch($T),)*) }
            }

            unsafe fn advance(state: Self::State, stride: usize) -> Self::State {
                let ($($T,)*) = state;
                unsafe { ($($T::advance($T, stride),)*) }
            }
        }
    };
}

impl_fetch_tuple!(A);
impl_fetch_tuple!(A, B);
impl_fetch_tuple!(A, B, C);
impl_fetch_tuple!(A, B, C, D);
impl_fetch_tuple!(A, B, C, D, E);
impl_fetch_tuple!(A, B, C, D, E, F);
impl_fetch_tuple!(A, B, C, D, E, F, G);
impl_fetch_tuple!(A, B, C, D, E, F, G, H);

/// Extends [`Fetch`] with the ability to copy its yielded item out of
/// storage into an owned value, for [`Query::collect`].
///
/// Kept separate from `Fetch` because `Fetch` is implemented for every
/// `Component`, not just the `Clone` ones; only `collect` needs the bound.
pub trait FetchOwned<'w>: Fetch<'w> {
    type Owned;

    fn to_owned(item: <Self as Fetch<'w>>::Item) -> Self::Owned;
}

impl<'w, T: Component + Clone> FetchOwned<'w> for &'w T {
    type Owned = T;

    fn to_owned(item: Self::Item) -> T {
        item.clone()
    }
}

impl<'w, T: Component + Clone> FetchOwned<'w> for &'w mut T {
    type Owned = T;

    fn to_owned(item: Self::Item) -> T {
        item.clone()
    }
}

impl<'w, T: Component> FetchOwned<'w> for Without<T> {
    type Owned = ();

    fn to_owned(_item: Self::Item) {}
}

macro_rules! impl_fetch_owned_tuple {
    ($($T:ident),*) => {
        #[allow(non_snake_case)]
        impl<'w, $($T: FetchOwned<'w>),*> FetchOwned<'w> for ($($T,)*) {
            type Owned = ($($T::Owned,)*);

            fn to_owned(item: <Self as Fetch<'w>>::Item) -> Self::Owned {
                let ($($T,)*) = item;
                ($($T::to_owned($T),)*)
            }
        }
    };
}

impl_fetch_owned_tuple!(A);
impl_fetch_owned_tuple!(A, B);
impl_fetch_owned_tuple!(A, B, C);
impl_fetch_owned_tuple!(A, B, C, D);
impl_fetch_owned_tuple!(A, B, C, D, E);
impl_fetch_owned_tuple!(A, B, C, D, E, F);
impl_fetch_owned_tuple!(A, B, C, D, E, F, G);
impl_fetch_owned_tuple!(A, B, C, D, E, F, G, H);

/// A compile-time typed view over every entity whose archetype's signature
/// includes `F`'s required components and excludes its excluded ones.
pub struct Query<'w, F: QueryFilter + Fetch<'w>> {
    world: &'w World,
    include: Signature,
    exclude: Signature,
    #[cfg(debug_assertions)]
    generation: u64,
    _marker: PhantomData<F>,
}

impl<'w, F: QueryFilter + Fetch<'w>> Query<'w, F> {
    pub(crate) fn new(world: &'w World) -> Self {
        let include = F::include_signature();
        let exclude = F::exclude_signature();
        assert!(
            !include.intersects(exclude),
            "{}",
            EcsError::OverlappingQueryFilter
        );
        Query {
            world,
            include,
            exclude,
            #[cfg(debug_assertions)]
            generation: world.generation(),
            _marker: PhantomData,
        }
    }

    #[cfg(debug_assertions)]
    fn check_not_stale(&self) {
        assert_eq!(
            self.generation,
            self.world.generation(),
            "{}",
            EcsError::StaleQuery
        );
    }

    fn matches(&self, signature: Signature) -> bool {
        signature.is_superset_of(self.include) && !signature.intersects(self.exclude)
    }

    /// Visit every matching entity, advancing a cached base pointer per
    /// fetched column by one chunk-row's stride each step rather than
    /// recomputing the offset from scratch.
    pub fn for_each(&self, mut f: impl FnMut(Entity, F::Item)) {
        #[cfg(debug_assertions)]
        self.check_not_stale();

        for archetype in self.world.archetypes() {
            if !self.matches(archetype.signature()) {
                continue;
            }
            for chunk in archetype.chunks() {
                if chunk.is_empty() {
                    continue;
                }
                let stride = chunk.stride();
                let mut state = F::prepare(chunk);
                for slot in 0..chunk.len() {
                    let entity = chunk.entity_at(slot);
                    let item = unsafe { F::fetch(state) };
                    f(entity, item);
                    state = unsafe { F::advance(state, stride) };
                }
            }
        }
    }

    pub fn iter(&self) -> QueryIter<'w, F> {
        #[cfg(debug_assertions)]
        self.check_not_stale();

        QueryIter {
            world: self.world,
            include: self.include,
            exclude: self.exclude,
            archetype_idx: 0,
            chunk_idx: 0,
            slot: 0,
            state: None,
        }
    }

    pub fn len(&self) -> usize {
        self.world
            .archetypes()
            .iter()
            .filter(|a| self.matches(a.signature()))
            .map(|a| a.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every matched entity's fetched components out of storage into an
    /// owned, caller-held `Vec`. Requires every inclusion type to be `Clone`.
    ///
    /// The result outlives `self` and the `World` it borrowed from; unlike
    /// `for_each`/`iter` it does not keep the query's borrow alive once it
    /// returns.
    pub fn collect(&self) -> Vec<F::Owned>
    where
        F: FetchOwned<'w>,
    {
        #[cfg(debug_assertions)]
        self.check_not_stale();

        let mut out = Vec::with_capacity(self.len());
        for archetype in self.world.archetypes() {
            if !self.matches(archetype.signature()) {
                continue;
            }
            for chunk in archetype.chunks() {
                if chunk.is_empty() {
                    continue;
                }
                let stride = chunk.stride();
                let mut state = F::prepare(chunk);
                for _ in 0..chunk.len() {
                    let item = unsafe { F::fetch(state) };
                    out.push(F::to_owned(item));
                    state = unsafe { F::advance(state, stride) };
                }
            }
        }
        out
    }
}

/// Lazy iterator over a [`Query`]'s matching entities, walking archetypes,
/// then chunks within an archetype, then slots within a chunk.
pub struct QueryIter<'w, F: Fetch<'w>> {
    world: &'w World,
    include: Signature,
    exclude: Signature,
    archetype_idx: usize,
    chunk_idx: usize,
    slot: usize,
    state: Option<F::State>,
}

impl<'w, F: Fetch<'w>> Iterator for QueryIter<'w, F> {
    type Item = (Entity, F::Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let archetypes = self.world.archetypes();
            let Some(archetype) = archetypes.get(self.archetype_idx) else {
                return None;
            };

            let signature = archetype.signature();
            if !signature.is_superset_of(self.include) || signature.intersects(self.exclude) {
                self.archetype_idx += 1;
                self.chunk_idx = 0;
                self.slot = 0;
                self.state = None;
                continue;
            }

            let chunks = archetype.chunks();
            let Some(chunk) = chunks.get(self.chunk_idx) else {
                self.archetype_idx += 1;
                self.chunk_idx = 0;
                self.slot = 0;
                self.state = None;
                continue;
            };

            if self.slot >= chunk.len() {
                self.chunk_idx += 1;
                self.slot = 0;
                self.state = None;
                continue;
            }

            let state = *self.state.get_or_insert_with(|| F::prepare(chunk));
            let entity = chunk.entity_at(self.slot);
            let item = unsafe { F::fetch(state) };
            self.state = Some(unsafe { F::advance(state, chunk.stride()) });
            self.slot += 1;
            return Some((entity, item));
        }
    }
}

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

//! Component marker trait, the global type registry, and entity Bundles.
//!
//! Components are data attached to entities. Bundles group multiple
//! components together for a single `create_entity` call.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use smallvec::{smallvec, SmallVec};

use crate::error::EcsError;
use crate::signature::{Signature, MAX_COMPONENTS};

/// Maximum number of components a single `Bundle` tuple may carry.
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Marker trait for components.
///
/// Components must be `'static` (no borrowed data) and `Send + Sync` so a
/// `World` can be shared across thread boundaries by its owner, even though
/// the storage engine itself runs single-threaded. Opt in per type with
/// `impl Component for MyType {}`; there is no blanket implementation, so a
/// plain `u32` or `String` isn't accidentally usable as a component.
pub trait Component: 'static + Send + Sync {}

/// Per-type metadata cached by the registry: byte size and an optional
/// destructor thunk invoked whenever a slot holding this type is discarded
/// (swap-removed, or migrated away without a destination column) rather than
/// moved to a new location.
#[derive(Clone, Copy)]
pub struct ComponentMeta {
    pub size: usize,
    pub drop_thunk: Option<unsafe fn(*mut u8)>,
}

struct TypeRegistry {
    ids: Mutex<HashMap<TypeId, u32>>,
    metas: Mutex<Vec<ComponentMeta>>,
}

/// The one process-wide registry, lazily built on first use. Unlike the
/// function-local static this replaces, this `static` lives outside any
/// generic function, so there really is exactly one instance of it — which
/// is what makes keying its map by `TypeId` (rather than by "which
/// monomorphization am I") necessary and correct.
static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

fn registry() -> &'static TypeRegistry {
    REGISTRY.get_or_init(|| TypeRegistry {
        ids: Mutex::new(HashMap::new()),
        metas: Mutex::new(Vec::new()),
    })
}

impl TypeRegistry {
    fn register(
        &self,
        type_id: TypeId,
        size: usize,
        drop_thunk: Option<unsafe fn(*mut u8)>,
    ) -> u32 {
        let mut ids = self.ids.lock().unwrap();
        if let Some(&id) = ids.get(&type_id) {
            return id;
        }
        let mut metas = self.metas.lock().unwrap();
        assert!(
            metas.len() < MAX_COMPONENTS,
            "{}",
            EcsError::TooManyComponentTypes { limit: MAX_COMPONENTS }
        );
        let id = metas.len() as u32;
        metas.push(ComponentMeta { size, drop_thunk });
        ids.insert(type_id, id);
        id
    }

    fn meta(&self, id: u32) -> ComponentMeta {
        self.metas.lock().unwrap()[id as usize]
    }
}

/// Returns the stable type id for `T`, registering it on first use.
///
/// Keyed by `TypeId::of::<T>()`, the corpus's own pattern for recovering a
/// type identity inside a generic function (`saptak7777-Archetype-ECS`'s
/// `Bundle::type_ids` and `Archetype::register_component`, `yohandev-ezgame`'s
/// `TypeMeta::of`/`Archetype::cmp` all key off `TypeId` rather than a
/// function-local static, precisely because a `static` declared inside a
/// generic function body does not depend on the function's type parameters
/// and so is shared — one instance, not one per monomorphization — across
/// every `T` that ever calls it). The first `TypeId` seen for a given type
/// assigns a fresh small integer id, in registration order, capped at
/// [`MAX_COMPONENTS`]; every later call for the same `T` returns that id.
pub fn component_type_id<T: Component>() -> u32 {
    registry().register(
        TypeId::of::<T>(),
        std::mem::size_of::<T>(),
        if std::mem::needs_drop::<T>() {
            Some(|ptr: *mut u8| unsafe { std::ptr::drop_in_place(ptr as *mut T) })
        } else {
            None
        },
    )
}

pub(crate) fn component_meta(type_id: u32) -> ComponentMeta {
    registry().meta(type_id)
}

/// A bundle of components spawned together on one entity.
pub trait Bundle: Send + Sync + 'static {
    /// Type ids of every component in the bundle, in declaration order.
    fn type_ids() -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]>
    where
        Self: Sized;

    /// Signature formed by this bundle's component types.
    fn signature() -> Signature
    where
        Self: Sized,
    {
        let mut sig = Signature::EMPTY;
        for tid in Self::type_ids() {
            sig.insert(tid);
        }
        sig
    }

    /// Write this bundle's components into freshly allocated, uninitialized
    /// storage slots.
    ///
    /// # Safety
    /// `ptrs[i]` must point to valid, correctly aligned, uninitialized
    /// storage for the `i`-th component type returned by `type_ids`.
    unsafe fn write_components(self, ptrs: &[*mut u8])
    where
        Self: Sized;
}

// Bundle is only implemented for tuples, never blanket-implemented for
// `T: Component`, so that `(Position,)` and a bare `Position` aren't both
// candidates for the same call site.
macro_rules! impl_bundle {
    ($($T:ident),*) => {
        impl<$($T: Component),*> Bundle for ($($T,)*) {
            fn type_ids() -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]> {
                smallvec![$(component_type_id::<$T>()),*]
            }

            #[allow(non_snake_case)]
            unsafe fn write_components(self, ptrs: &[*mut u8]) {
                let ($($T,)*) = self;
                let mut i = 0;
                $(
                    std::ptr::write(ptrs[i] as *mut $T, $T);
                    i += 1;
                )*
                let _ = i;
            }
        }
    };
}

impl Bundle for () {
    fn type_ids() -> SmallVec<[u32; MAX_BUNDLE_COMPONENTS]> {
        SmallVec::new()
    }

    unsafe fn write_components(self, _ptrs: &[*mut u8]) {}
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

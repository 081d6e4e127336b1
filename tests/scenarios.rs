//! End-to-end scenarios from the storage engine's contract: entity lifecycle,
//! signature-migration value preservation, swap-remove correctness, and
//! query include/exclude filtering.

use archetype_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Velocity {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frozen;
impl Component for Frozen {}

// Scenario A -- basic lifecycle.
#[test]
fn scenario_a_basic_lifecycle() {
    let mut world = World::new();
    let e1 = world.create_entity((
        Position { x: 1.0, y: 2.0, z: 3.0 },
        Velocity { x: 4.0, y: 5.0, z: 6.0 },
    ));

    assert!(world.has_component::<Position>(e1));
    assert!(world.has_component::<Velocity>(e1));
    assert_eq!(*world.get_component::<Position>(e1), Position { x: 1.0, y: 2.0, z: 3.0 });

    world.destroy_entity(e1);

    let e1_reused = world.create_entity((Position { x: 0.0, y: 0.0, z: 0.0 },));
    assert_eq!(e1_reused.id(), e1.id());
    assert_ne!(e1_reused.generation(), e1.generation());
    assert!(!world.is_alive(e1));
    assert!(world.is_alive(e1_reused));
}

// Scenario B -- migration preserves values.
#[test]
fn scenario_b_migration_preserves_values() {
    let mut world = World::new();
    let e = world.create_entity((Position { x: 7.0, y: 8.0, z: 9.0 },));

    world.add_component(e, Velocity { x: 10.0, y: 11.0, z: 12.0 });
    assert_eq!(*world.get_component::<Position>(e), Position { x: 7.0, y: 8.0, z: 9.0 });
    assert_eq!(*world.get_component::<Velocity>(e), Velocity { x: 10.0, y: 11.0, z: 12.0 });

    world.remove_component::<Position>(e);
    assert!(!world.has_component::<Position>(e));
    assert_eq!(*world.get_component::<Velocity>(e), Velocity { x: 10.0, y: 11.0, z: 12.0 });
}

// Scenario C -- swap-remove correctness.
#[test]
fn scenario_c_swap_remove_correctness() {
    let mut world = World::new();
    let e1 = world.create_entity((Position { x: 1.0, y: 0.0, z: 0.0 },));
    let e2 = world.create_entity((Position { x: 2.0, y: 0.0, z: 0.0 },));
    let e3 = world.create_entity((Position { x: 3.0, y: 0.0, z: 0.0 },));

    world.destroy_entity(e2);

    assert!(world.is_alive(e1));
    assert!(!world.is_alive(e2));
    assert!(world.is_alive(e3));
    assert_eq!(*world.get_component::<Position>(e3), Position { x: 3.0, y: 0.0, z: 0.0 });

    let mut seen: Vec<f32> = world.query::<&Position>().collect().into_iter().map(|p| p.x).collect();
    seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(seen, vec![1.0, 3.0]);
}

// Scenario D -- query include+exclude.
#[test]
fn scenario_d_query_include_exclude() {
    let mut world = World::new();

    for i in 0..100 {
        world.create_entity((
            Position { x: i as f32, y: 0.0, z: 0.0 },
            Velocity { x: 0.0, y: 0.0, z: 0.0 },
        ));
    }
    for i in 0..50 {
        world.create_entity((Position { x: i as f32, y: 0.0, z: 0.0 },));
    }
    for i in 0..25 {
        world.create_entity((
            Position { x: i as f32, y: 0.0, z: 0.0 },
            Velocity { x: 0.0, y: 0.0, z: 0.0 },
            Frozen,
        ));
    }

    let moving = world.query::<(&Position, &Velocity, Without<Frozen>)>();
    assert_eq!(moving.len(), 100);
    let mut count = 0;
    moving.for_each(|_, _| count += 1);
    assert_eq!(count, 100);

    assert_eq!(world.query::<&Position>().len(), 175);
}

// Scenario E -- query iteration mutates components.
#[test]
fn scenario_e_query_iteration_mutates_components() {
    let mut world = World::new();
    for i in 0..1000 {
        world.create_entity((
            Position { x: i as f32, y: 0.0, z: 0.0 },
            Velocity { x: 1.0, y: 0.0, z: 0.0 },
        ));
    }

    world
        .query::<(&mut Position, &Velocity)>()
        .for_each(|_, (p, v)| p.x += v.x);

    let mut xs: Vec<f32> = world.query::<&Position>().collect().into_iter().map(|p| p.x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (i, x) in xs.into_iter().enumerate() {
        assert_eq!(x, i as f32 + 1.0);
    }

    // Re-running returns the updated values, not a stale snapshot.
    let again: f32 = world
        .query::<&Position>()
        .collect()
        .into_iter()
        .map(|p| p.x)
        .fold(f32::MIN, f32::max);
    assert_eq!(again, 1000.0);
}

// Scenario F -- chunk-boundary migration.
#[test]
fn scenario_f_chunk_boundary_migration() {
    let mut world = World::new();
    let mut entities = Vec::new();

    // `Position` is 12 bytes, so a 16 KiB chunk holds 16384/12 = 1365
    // entities; push comfortably past that so the archetype spills into a
    // second chunk.
    let chunk_capacity = 1365;
    let fill_count = chunk_capacity + 50;
    for i in 0..fill_count {
        entities.push(world.create_entity((Position { x: i as f32, y: 0.0, z: 0.0 },)));
    }

    let last_of_first_chunk = entities[chunk_capacity - 1];
    world.add_component(last_of_first_chunk, Velocity { x: 9.0, y: 9.0, z: 9.0 });

    assert!(world.has_component::<Velocity>(last_of_first_chunk));
    assert!(world.has_component::<Position>(last_of_first_chunk));

    let mut sampled = 0;
    for (idx, &e) in entities.iter().enumerate() {
        if idx % 5 != 0 {
            continue;
        }
        if e == last_of_first_chunk {
            continue;
        }
        assert!(world.is_alive(e));
        assert_eq!(world.get_component::<Position>(e).x, idx as f32);
        sampled += 1;
    }
    assert!(sampled > 0);
}

// The MAX_COMPONENTS boundary (64 distinct types succeed, a 65th asserts) is
// exercised in its own test binary (`max_components.rs`): the type registry
// is a single process-wide static, so a test asserting the exact cap must
// not share a process with tests that register their own component types.

#[test]
fn create_entity_with_zero_components_is_in_the_empty_archetype() {
    let mut world = World::new();
    let e = world.create_entity(());
    assert!(world.is_alive(e));
    assert!(!world.has_component::<Position>(e));
    assert!(!world.has_component::<Velocity>(e));
}

#[test]
fn destroy_of_invalid_or_already_freed_entity_is_a_no_op() {
    let mut world = World::new();
    assert!(!world.is_alive(Entity::INVALID));
    world.destroy_entity(Entity::INVALID); // must not panic

    let e = world.create_entity((Position { x: 0.0, y: 0.0, z: 0.0 },));
    world.destroy_entity(e);
    world.destroy_entity(e); // already freed, must not panic
}

#[test]
fn chunk_capacity_respects_the_sixty_four_entity_floor() {
    #[derive(Debug, Clone, Copy)]
    #[allow(dead_code)]
    struct Heavy([u8; 2048]);
    impl Component for Heavy {}

    let mut world = World::new();
    for _ in 0..64 {
        world.create_entity((Heavy([0; 2048]),));
    }
    assert_eq!(world.query::<&Heavy>().len(), 64);
}

#[test]
#[should_panic(expected = "does not have a component")]
fn get_component_on_missing_type_panics() {
    let mut world = World::new();
    let e = world.create_entity((Position { x: 0.0, y: 0.0, z: 0.0 },));
    world.get_component::<Velocity>(e);
}

#[test]
#[should_panic(expected = "requires and excludes")]
fn query_with_overlapping_include_exclude_panics() {
    let world = World::new();
    world.query::<(&Position, Without<Position>)>();
}

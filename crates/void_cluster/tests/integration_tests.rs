//! Integration tests for void_cluster crate
//!
//! Drives the buffer protocol end to end: records in, step, pairs and
//! islands out, records back.

use approx::assert_relative_eq;
use void_cluster::codec::{required_len, text};
use void_cluster::*;

fn ids(list: &[i64]) -> Vec<ObjectId> {
    list.iter().map(|&id| ObjectId(id)).collect()
}

#[test]
fn test_buffer_round_trip_through_step() {
    let mut world = PhysicsWorld::default();
    let objects = ids(&[10, 20, 30]);

    let records = [
        ObjectRecord::sphere(0.5).with_linear_velocity(1.0, 0.0, 0.0),
        ObjectRecord::cuboid(1.0, 2.0, 3.0)
            .with_position(5.0, 0.0, 0.0)
            .with_angular_velocity(0.0, 1.0, 0.0),
        ObjectRecord::sphere(2.0)
            .with_scale(1.5)
            .with_position(-5.0, 0.0, 0.0)
            .with_restitution(0.3),
    ];

    let mut input = vec![0.0; required_len(objects.len())];
    codec::encode_records(&records, &mut input).expect("Failed to encode");
    world.set_object_data(&objects, &input).expect("Failed to load objects");

    let mut before = vec![0.0; required_len(objects.len())];
    world.get_object_data(&objects, &mut before).expect("Failed to read objects");
    assert_eq!(before, input);

    world.step(&objects, 0.5, 60).expect("Failed to step");

    let mut after = vec![0.0; required_len(objects.len())];
    world.get_object_data(&objects, &mut after).expect("Failed to read objects");
    let decoded = codec::decode_records(&after, objects.len()).expect("Failed to decode");

    for (original, stepped) in records.iter().zip(&decoded) {
        assert_eq!(stepped.radius, original.radius);
        assert_eq!(stepped.scale, original.scale);
        assert_eq!(stepped.restitution, original.restitution);
        assert_eq!(stepped.shape_params, original.shape_params);
    }

    // The moving sphere moved, the spinning box rotated in place
    assert!(decoded[0].position[0] > 0.4);
    assert_ne!(decoded[1].orientation, records[1].orientation);
    assert_relative_eq!(decoded[1].position[0], 5.0, epsilon = 1e-5);
}

#[test]
fn test_short_buffer_is_contract_violation() {
    let mut world = PhysicsWorld::default();
    let objects = ids(&[1, 2]);
    for id in &objects {
        world.upsert_object(*id, &ObjectRecord::sphere(1.0));
    }

    let mut buf = vec![-1.0; RECORD_LEN * objects.len() - 1];
    let err = world.get_object_data(&objects, &mut buf).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(buf.iter().all(|v| *v == -1.0));

    let err = world.set_object_data(&ids(&[3, 4]), &buf).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(!world.contains(ObjectId(3)));
}

#[test]
fn test_serialize_missing_object_aborts() {
    let mut world = PhysicsWorld::default();
    world.upsert_object(ObjectId(1), &ObjectRecord::sphere(1.0));

    let mut buf = vec![0.0; required_len(2)];
    let err = world.get_object_data(&ids(&[1, 2]), &mut buf).unwrap_err();
    assert!(matches!(err, PhysicsError::ObjectNotFound(ObjectId(2))));
    assert!(buf.iter().all(|v| *v == 0.0));
}

#[test]
fn test_remove_absent_object() {
    let mut world = PhysicsWorld::default();
    world.upsert_object(ObjectId(1), &ObjectRecord::sphere(1.0));

    assert_eq!(world.remove_objects(&ids(&[99])), 0);
    assert_eq!(world.remove_objects(&ids(&[1, 99])), 1);
    assert_eq!(world.object_count(), 0);
}

#[test]
fn test_sphere_stack_islands() {
    let mut world = PhysicsWorld::default();

    // Two stacks of touching spheres far apart, plus a loner
    for (id, x, z) in [(1, 0.0, 0.0), (2, 0.0, 1.8), (3, 0.0, 3.6), (7, 50.0, 0.0), (8, 50.0, 1.8), (9, -50.0, 0.0)] {
        world.upsert_object(ObjectId(id), &ObjectRecord::sphere(1.0).with_position(x, 0.0, z));
    }

    let stepped = ids(&[1, 2, 3, 7, 8, 9]);
    let summary = world.step(&stepped, 0.1, 10).expect("Failed to step");
    assert_eq!(summary.pair_count, 3);

    let islands = world.islands();
    assert_eq!(islands.len(), 2);
    assert_eq!(islands[0].members(), &ids(&[1, 2, 3])[..]);
    assert_eq!(islands[1].members(), &ids(&[7, 8])[..]);

    let config = PhysicsConfig::default().with_island_policy(IslandPolicy::IncludeIsolated);
    assert_eq!(config.island_policy, IslandPolicy::IncludeIsolated);
    assert_eq!(world.islands_with(config.island_policy).len(), 3);
}

#[test]
fn test_sphere_rests_on_plane_with_gravity() {
    let config = PhysicsConfig::default()
        .with_collision_mode(CollisionMode::Resolve)
        .with_gravity(0.0, 0.0, -9.81);
    let mut world = PhysicsWorld::new(config);

    world.upsert_object(ObjectId(0), &ObjectRecord::plane(0.0, 0.0, 1.0));
    world.upsert_object(ObjectId(1), &ObjectRecord::sphere(0.5).with_position(0.0, 0.0, 0.6));

    for _ in 0..30 {
        world.step(&ids(&[0, 1]), 1.0 / 30.0, 4).expect("Failed to step");
    }

    let sphere = world.get_object(ObjectId(1)).expect("Sphere vanished");
    assert!(sphere.position[2] > 0.3, "sphere fell through the plane");
    assert!(sphere.position[2] < 0.7);
    assert_eq!(world.pairs(), vec![PairCacheEntry::from((0, 1))]);
    assert!(world
        .contacts()
        .iter()
        .all(|c| PairCacheEntry::new(c.id_a, c.id_b) == PairCacheEntry::from((0, 1))));

    // The plane never moves
    assert_eq!(world.get_object(ObjectId(0)).expect("Plane vanished").linear_velocity, [0.0; 3]);
}

#[test]
fn test_independent_worlds() {
    let mut a = PhysicsWorld::default();
    let mut b = PhysicsWorld::default();
    for world in [&mut a, &mut b] {
        world.upsert_object(ObjectId(1), &ObjectRecord::sphere(1.0));
        world.upsert_object(ObjectId(2), &ObjectRecord::sphere(1.0).with_position(0.0, 0.0, 1.5));
    }

    let handle = std::thread::spawn(move || {
        b.step(&ids(&[1, 2]), 0.1, 10).expect("Failed to step");
        b.pair_count()
    });
    a.step(&ids(&[1]), 0.1, 10).expect("Failed to step");

    assert_eq!(handle.join().expect("Worker panicked"), 1);
    assert_eq!(a.pair_count(), 0);
}

#[test]
fn test_config_from_json() {
    let config = PhysicsConfig::from_json(
        r#"{ "collision_mode": "Resolve", "island_policy": "IncludeIsolated", "gravity": [0.0, -9.81, 0.0] }"#,
    )
    .expect("Failed to parse config");

    let world = PhysicsWorld::new(config);
    assert_eq!(world.config().collision_mode, CollisionMode::Resolve);
    assert_eq!(world.config().island_policy, IslandPolicy::IncludeIsolated);
    assert_eq!(world.gravity(), [0.0, -9.81, 0.0]);

    let json = world.config().to_json().expect("Failed to serialize config");
    let reloaded = PhysicsConfig::from_json(&json).expect("Failed to reload config");
    assert_eq!(reloaded.island_policy, IslandPolicy::IncludeIsolated);
}

#[test]
fn test_text_encoding() {
    assert_eq!(
        text::decode_vec("[1.000000 2.000000 3.000000]").expect("Failed to decode"),
        vec![1.0, 2.0, 3.0]
    );
    assert_eq!(
        text::decode_nested("[[1.0][2.0 3.0]]").expect("Failed to decode"),
        vec![vec![1.0], vec![2.0, 3.0]]
    );

    // Object positions out, parsed back in
    let mut world = PhysicsWorld::default();
    world.upsert_object(ObjectId(1), &ObjectRecord::sphere(1.0).with_position(1.0, 2.0, 3.0));
    let record = world.get_object(ObjectId(1)).expect("Missing object");
    let encoded = encode_nested(&[record.position.to_vec(), record.orientation.to_vec()]);
    assert_eq!(encoded, "[[1.000000 2.000000 3.000000][0.000000 0.000000 0.000000 1.000000]]");
    assert_eq!(
        decode_nested(&encoded).expect("Failed to decode"),
        vec![record.position.to_vec(), record.orientation.to_vec()]
    );
}

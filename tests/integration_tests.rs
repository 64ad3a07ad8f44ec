//! Integration tests for ragdoll-sandbox
//! These drive the simulation controller through its public API only

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ragdoll_sandbox::entity::Assembly;
use ragdoll_sandbox::scene::VisualNode;
use ragdoll_sandbox::tools::explosion_impulse;
use ragdoll_sandbox::{
    BendyRagdoll, Camera, EntityId, Interaction, PressOrientation, ProceduralRagdoll, ProjectileKind, PropCatalog,
    RagdollBuilder, RagdollError, RemovalReason, RigidBody, SceneGraph, SimulationController, SimulationEvent,
    SimulationSettings,
};

const EPSILON: f32 = 1e-4;

// Mock scene that tracks what is displayed
#[derive(Default)]
struct CountingScene {
    displayed: BTreeSet<EntityId>,
    inserts: usize,
    removes: usize,
}

impl SceneGraph for CountingScene {
    fn insert(&mut self, id: EntityId, _node: &VisualNode) {
        self.inserts += 1;
        self.displayed.insert(id);
    }

    fn remove(&mut self, id: EntityId) -> bool {
        self.removes += 1;
        self.displayed.remove(&id)
    }

    fn contains(&self, id: EntityId) -> bool {
        self.displayed.contains(&id)
    }
}

// Three collider-less parts stacked on the Y axis
struct TargetDummy;

impl RagdollBuilder for TargetDummy {
    fn build(&self) -> Result<Assembly, RagdollError> {
        let mut assembly = Assembly::new(VisualNode::new("target"));
        for (name, y) in [("pelvis", 1.0), ("upperBody", 1.5), ("head", 2.2)] {
            assembly.push_body(name, RigidBody::new(1.0).with_position(Vector3::new(0.0, y, 0.0)));
        }
        Ok(assembly)
    }
}

fn sandbox() -> SimulationController {
    let mut sim = SimulationController::new(SimulationSettings::default());
    sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
    sim
}

fn live_body_total<S: SceneGraph>(sim: &SimulationController<S>) -> usize {
    sim.entities().map(|e| e.get_bodies().len()).sum()
}

fn upper_body(sim: &SimulationController) -> Vector3<f32> {
    sim.dummy().unwrap().body_position(sim.world(), "upperBody").unwrap()
}

#[test]
fn test_body_count_matches_live_entities() {
    let mut sim = SimulationController::with_collaborators(
        SimulationSettings::default(),
        CountingScene::default(),
        PropCatalog::with_builtin_props(),
    );
    sim.load_dummy(&BendyRagdoll::humanoid()).unwrap();
    sim.change_world_gravity(-9.81);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for _ in 0..300 {
        match rng.random_range(0..10) {
            0 => {
                let direction = Vector3::new(rng.random_range(-1.0..1.0), 0.2, -1.0);
                sim.handle_throw_projectile(direction);
            }
            1 => {
                let target = sim.dummy().unwrap().body_position(sim.world(), "pelvis").unwrap();
                sim.handle_pin(target);
            }
            2 => sim.toggle(Interaction::ALL[rng.random_range(0..Interaction::ALL.len())]),
            3 => sim.handle_clear_all_pins(),
            4 => sim.handle_reload_scene(),
            5 => sim.move_press(rng.random_range(0.0..1.0)),
            6 => sim.change_press_type(PressOrientation::Horizontal),
            7 => sim.handle_punch_dummy(Vector3::new(0.0, 1.3, 0.0)),
            _ => {
                sim.tick();
            }
        }
        assert_eq!(sim.world().body_count(), live_body_total(&sim));
        assert_eq!(sim.scene().displayed.len(), sim.entities().count());
        for entity in sim.entities() {
            assert!(sim.scene().contains(entity.id()));
        }
    }
    assert_eq!(sim.scene().inserts - sim.scene().removes, sim.entities().count());
}

#[test]
fn test_reload_restores_spawn_pose_exactly() {
    let mut sim = sandbox();
    sim.change_world_gravity(-9.81);
    sim.handle_drag_dummy(3.0, 2.0);
    sim.handle_punch_dummy(upper_body(&sim));
    for _ in 0..90 {
        sim.tick();
    }
    sim.handle_reload_scene();

    let dummy = sim.dummy().unwrap();
    for (name, handle) in dummy.bodies().iter() {
        let body = sim.world().body(*handle).unwrap();
        let snapshot = dummy.snapshot(name).unwrap();
        assert_eq!(body.position, snapshot.position, "{}", name);
        assert_eq!(body.orientation, snapshot.orientation, "{}", name);
        assert_eq!(body.velocity, Vector3::zeros());
        assert_eq!(body.angular_velocity, Vector3::zeros());
    }
}

#[test]
fn test_press_jaws_depend_only_on_value() {
    let mut sim = sandbox();
    sim.toggle(Interaction::Press);
    let gap = sim.settings().press_gap;
    let press = sim.press().unwrap();
    let first_snapshot = press.snapshot("firstPress").unwrap().position;
    let second_snapshot = press.snapshot("secondPress").unwrap().position;

    for value in [0.3, 0.8, 0.3, 0.3] {
        sim.move_press(value);
        let press = sim.press().unwrap();
        let first = press.body_position(sim.world(), "firstPress").unwrap();
        let second = press.body_position(sim.world(), "secondPress").unwrap();
        assert!((first - (first_snapshot + Vector3::y() * value * gap / 2.0)).norm() < EPSILON);
        assert!((second - (second_snapshot - Vector3::y() * value * gap / 2.0)).norm() < EPSILON);
    }

    sim.move_press(0.0);
    let press = sim.press().unwrap();
    assert_eq!(press.body_position(sim.world(), "firstPress"), Some(first_snapshot));
    assert_eq!(press.body_position(sim.world(), "secondPress"), Some(second_snapshot));
}

#[test]
fn test_impaling_projectile_sticks_exactly_once() {
    let mut sim = SimulationController::new(SimulationSettings::default());
    sim.load_dummy(&TargetDummy).unwrap();
    sim.update_throw_projectile_settings(ProjectileKind::Spear, 1.0, 0.0);
    // The spear points along its length; dropping it straight down from
    // half its length above the torso puts the tip on the torso
    sim.set_camera(Camera::new(Point3::new(0.0, 1.5 + 0.8 + 0.1, 0.0), Point3::new(0.0, 1.5, -1.0)));
    let constraints = sim.world().constraint_count();
    let id = sim.handle_throw_projectile(-Vector3::y()).unwrap();

    for _ in 0..20 {
        sim.tick();
    }
    assert_eq!(sim.projectile_count(), 0);
    assert_eq!(sim.stuck_projectile_ids(), vec![id]);
    assert_eq!(sim.world().constraint_count(), constraints + 1);
    let impaled: Vec<_> = sim
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimulationEvent::ProjectileImpaled { .. }))
        .collect();
    assert_eq!(
        impaled,
        vec![SimulationEvent::ProjectileImpaled {
            entity: id,
            kind: ProjectileKind::Spear,
            part: "upperBody".into()
        }]
    );
}

#[test]
fn test_explosion_falls_off_with_distance() {
    let mut sim = SimulationController::new(SimulationSettings::default());
    sim.load_dummy(&TargetDummy).unwrap();
    sim.update_throw_projectile_settings(ProjectileKind::Grenade, 1.0, 0.0);
    sim.set_camera(Camera::new(Point3::new(0.0, 1.6, 0.5), Point3::new(0.0, 1.6, 0.0)));
    sim.handle_throw_projectile(-Vector3::z()).unwrap();
    sim.tick();
    assert_eq!(sim.projectile_count(), 0);

    let events = sim.drain_events();
    let (center, force) = events
        .iter()
        .find_map(|e| match e {
            SimulationEvent::ProjectileExploded { center, force, .. } => Some((*center, *force)),
            _ => None,
        })
        .expect("grenade should have exploded");
    assert_eq!(force, 2.0);
    assert!(events.iter().any(|e| matches!(
        e,
        SimulationEvent::ProjectileRemoved {
            reason: RemovalReason::Exploded,
            ..
        }
    )));

    let dummy = sim.dummy().unwrap();
    let mut speeds = Vec::new();
    for name in ["upperBody", "pelvis", "head"] {
        let body = sim.world().body(dummy.body(name).unwrap()).unwrap();
        let distance = (body.position - center).norm();
        let expected = (1.0 - distance / 5.0) * force;
        assert!((body.velocity.norm() - expected).abs() < EPSILON, "{}", name);
        speeds.push((distance, body.velocity.norm()));
    }
    speeds.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert!(speeds.windows(2).all(|w| w[0].1 > w[1].1));
}

#[test]
fn test_explosion_impulse_is_linear_and_bounded() {
    let center = Vector3::zeros();
    let at = |d: f32| explosion_impulse(&Vector3::new(d, 0.0, 0.0), &center, 5.0, 10.0).map(|v| v.norm());
    assert!((at(1.0).unwrap() - 8.0).abs() < EPSILON);
    assert!((at(2.5).unwrap() - 5.0).abs() < EPSILON);
    assert!((at(1.0).unwrap() - at(2.0).unwrap() - (at(3.0).unwrap() - at(4.0).unwrap())).abs() < EPSILON);
    assert_eq!(at(5.0), None);
    assert_eq!(at(7.0), None);
}

#[test]
fn test_toggling_twice_returns_to_none() {
    let mut sim = sandbox();
    let bodies = sim.world().body_count();
    let constraints = sim.world().constraint_count();
    let displayed = sim.scene().len();
    for interaction in Interaction::ALL {
        sim.toggle(interaction);
        assert_eq!(sim.context(), interaction);
        sim.toggle(interaction);
        assert_eq!(sim.context(), Interaction::None);
        sim.handle_clear_all_pins();
        assert_eq!(sim.world().body_count(), bodies, "{}", interaction);
        assert_eq!(sim.world().constraint_count(), constraints, "{}", interaction);
        assert_eq!(sim.scene().len(), displayed, "{}", interaction);
    }
}

#[test]
fn test_cull_keeps_most_recent_projectiles() {
    let mut sim = sandbox();
    let limit = sim.settings().object_limit;
    let mut thrown = Vec::new();
    for i in 0..limit + 3 {
        let x = i as f32 * 1.5 - 15.0;
        sim.set_camera(Camera::new(Point3::new(x, 6.0, 6.0), Point3::new(x, 6.0, 0.0)));
        thrown.extend(sim.handle_throw_projectile(Vector3::y()));
    }
    assert_eq!(thrown.len(), limit + 3);
    sim.tick();
    assert_eq!(sim.projectile_ids(), thrown[3..].to_vec());
    let culled: Vec<_> = sim
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SimulationEvent::ProjectileRemoved {
                entity,
                reason: RemovalReason::Culled,
            } => Some(entity),
            _ => None,
        })
        .collect();
    assert_eq!(culled, thrown[..3].to_vec());
}

#[test]
fn test_freeze_toggle_adds_and_removes_locks() {
    let mut sim = SimulationController::new(SimulationSettings::default());
    sim.load_dummy(&BendyRagdoll::humanoid()).unwrap();
    let constraints = sim.world().constraint_count();
    sim.toggle(Interaction::Freeze);
    assert!(sim.is_frozen());
    assert_eq!(sim.world().constraint_count(), constraints + 9);
    sim.toggle(Interaction::Freeze);
    assert!(!sim.is_frozen());
    assert_eq!(sim.world().constraint_count(), constraints);
}

#[test]
fn test_settings_document_configures_controller() {
    let settings = SimulationSettings::from_json(r#"{ "gravity": [0.0, -4.0, 0.0], "projectileType": "arrow" }"#).unwrap();
    let mut sim = SimulationController::new(settings);
    assert_eq!(sim.world().gravity().y, -4.0);
    let id = sim.handle_throw_projectile(-Vector3::z()).unwrap();
    assert_eq!(
        sim.drain_events(),
        vec![SimulationEvent::ProjectileThrown {
            entity: id,
            kind: ProjectileKind::Arrow
        }]
    );
}

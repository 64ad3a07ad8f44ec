//! Thrown projectiles: spawning, population cap, bounds and classification.

use super::*;
use crate::physics::BodyHandle;
use crate::ragdoll::UPPER_BODY;
use crate::tools::{apply_explosion_impulse, create_projectile, projectile_tip, ProjectileClass, Throw};

const IMPALE: &str = "impale";

#[derive(Debug)]
pub(super) struct Projectile {
    pub(super) entity: PhysicalEntity,
    kind: ProjectileKind,
}

impl Projectile {
    fn body(&self) -> Option<BodyHandle> {
        self.entity.body(self.kind.name())
    }
}

/// What a free projectile's tip ran into this tick.
enum Hit {
    Impaled { part: String, target: BodyHandle },
    Exploded { center: Vector3<f32> },
}

impl<S: SceneGraph, A: AssetProvider> SimulationController<S, A> {
    /// Throw the configured projectile from just below the camera along
    /// `direction`. Returns the new entity's id.
    pub fn handle_throw_projectile(&mut self, direction: Vector3<f32>) -> Option<EntityId> {
        let kind = self.settings.projectile_type;
        let throw = Throw {
            kind,
            origin: self.camera.position - Vector3::y() * self.settings.tools.throw_drop,
            direction,
            speed: self.settings.projectile_speed,
            mass: self.settings.projectile_mass,
        };
        let prop = self.assets.prop(kind.name());
        let Some(assembly) = create_projectile(&throw, prop) else {
            debug!("{} not thrown: degenerate direction or mass", kind.name());
            return None;
        };
        let entity = self.spawn(assembly);
        let id = entity.id();
        self.projectiles.push_back(Projectile { entity, kind });
        self.events.push(SimulationEvent::ProjectileThrown { entity: id, kind });
        if kind == ProjectileKind::Bullet {
            self.events.push(SimulationEvent::Cue(AudioCue::Gunshot));
        }
        Some(id)
    }

    pub(super) fn remove_projectile(&mut self, projectile: Projectile, reason: RemovalReason) {
        let entity = projectile.entity.id();
        self.despawn(projectile.entity);
        self.events.push(SimulationEvent::ProjectileRemoved { entity, reason });
    }

    pub(super) fn clear_projectiles(&mut self, reason: RemovalReason) {
        while let Some(projectile) = self.projectiles.pop_front() {
            self.remove_projectile(projectile, reason);
        }
        while let Some(projectile) = self.stuck_projectiles.pop_front() {
            self.remove_projectile(projectile, reason);
        }
    }

    /// Drop the oldest free and stuck projectiles beyond the object limit.
    pub(super) fn cull_projectiles(&mut self) {
        let limit = self.settings.object_limit;
        while self.projectiles.len() > limit {
            let Some(oldest) = self.projectiles.pop_front() else { break };
            debug!("culling projectile {:?}", oldest.entity.id());
            self.remove_projectile(oldest, RemovalReason::Culled);
        }
        while self.stuck_projectiles.len() > limit {
            let Some(oldest) = self.stuck_projectiles.pop_front() else { break };
            debug!("culling stuck projectile {:?}", oldest.entity.id());
            self.remove_projectile(oldest, RemovalReason::Culled);
        }
    }

    /// Reset a dummy that left the world box and destroy projectiles that did.
    /// Stuck projectiles go as a group once the oldest one is out.
    pub(super) fn enforce_bounds(&mut self) {
        let bounds = self.settings.world_bounds;
        let outside = move |p: &Vector3<f32>| p.iter().zip(bounds.iter()).any(|(c, b)| c.abs() > *b);

        if let Some(dummy) = &self.dummy {
            if dummy.body_position(&self.world, UPPER_BODY).is_some_and(|p| outside(&p)) {
                info!("dummy left the world bounds, resetting");
                dummy.reset_bodies_to_initial_positions(&mut self.world);
                self.events.push(SimulationEvent::DummyReset { out_of_bounds: true });
            }
        }

        let escaped: Vec<usize> = self
            .projectiles
            .iter()
            .enumerate()
            .filter(|(_, p)| self.projectile_position(p).is_some_and(|pos| outside(&pos)))
            .map(|(i, _)| i)
            .collect();
        for i in escaped.into_iter().rev() {
            if let Some(projectile) = self.projectiles.remove(i) {
                info!("projectile {:?} left the world bounds", projectile.entity.id());
                self.remove_projectile(projectile, RemovalReason::OutOfBounds);
            }
        }

        let first_out = self
            .stuck_projectiles
            .front()
            .and_then(|p| self.projectile_position(p))
            .is_some_and(|pos| outside(&pos));
        if first_out {
            info!("stuck projectiles left the world bounds, removing {}", self.stuck_projectiles.len());
            while let Some(projectile) = self.stuck_projectiles.pop_front() {
                self.remove_projectile(projectile, RemovalReason::OutOfBounds);
            }
        }
    }

    fn projectile_position(&self, projectile: &Projectile) -> Option<Vector3<f32>> {
        self.world.body(projectile.body()?).map(|b| b.position)
    }

    /// Stick impaling projectiles into the dummy and detonate explosive ones
    /// that reached something. Inert projectiles are left alone.
    pub(super) fn classify_projectiles(&mut self) {
        let mut i = 0;
        while i < self.projectiles.len() {
            let Some(hit) = self.detect_hit(&self.projectiles[i]) else {
                i += 1;
                continue;
            };
            let Some(projectile) = self.projectiles.remove(i) else { break };
            match hit {
                Hit::Impaled { part, target } => self.impale(projectile, part, target),
                Hit::Exploded { center } => self.explode(projectile, center),
            }
        }
    }

    fn detect_hit(&self, projectile: &Projectile) -> Option<Hit> {
        let handle = projectile.body()?;
        let body = self.world.body(handle)?;
        let tip = projectile_tip(body, projectile.kind);
        let tools = &self.settings.tools;
        match projectile.kind.class() {
            ProjectileClass::Impale => {
                let dummy = self.dummy.as_ref()?;
                let (part, target) = dummy.closest_body_to(&self.world, &tip, tools.stick_threshold)?;
                Some(Hit::Impaled {
                    part: part.to_owned(),
                    target,
                })
            }
            ProjectileClass::Explosive => {
                let (_, distance) = self.world.nearest_body(&tip, |h, _| h != handle)?;
                (distance < tools.explosion_proximity).then_some(Hit::Exploded { center: tip })
            }
            ProjectileClass::Inert => None,
        }
    }

    /// Lock the projectile to `target` and move it to the stuck list.
    fn impale(&mut self, mut projectile: Projectile, part: String, target: BodyHandle) {
        if let Some(lock) = projectile.body().and_then(|handle| self.world.add_lock(target, handle)) {
            projectile.entity.add_constraints([(IMPALE, lock)]);
        }
        let entity = projectile.entity.id();
        debug!("projectile {:?} stuck in {}", entity, part);
        self.events.push(SimulationEvent::ProjectileImpaled {
            entity,
            kind: projectile.kind,
            part,
        });
        self.events.push(SimulationEvent::Cue(AudioCue::Hurt));
        self.stuck_projectiles.push_back(projectile);
    }

    fn explode(&mut self, projectile: Projectile, center: Vector3<f32>) {
        let entity = projectile.entity.id();
        let kind = projectile.kind;
        let force = self.settings.tools.explosion_force * (self.settings.gravity.y.abs() + 1.0);
        self.remove_projectile(projectile, RemovalReason::Exploded);
        let pushed = apply_explosion_impulse(&mut self.world, &center, self.settings.tools.explosion_radius, force);
        debug!("{} exploded, pushing {} bodies", kind.name(), pushed);
        self.events.push(SimulationEvent::ProjectileExploded {
            entity,
            kind,
            center,
            force,
        });
        self.events.push(SimulationEvent::Cue(AudioCue::Explosion));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ragdoll::ProceduralRagdoll;
    use nalgebra::Point3;

    fn controller(settings: SimulationSettings) -> SimulationController {
        let mut sim = SimulationController::new(settings);
        sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
        sim
    }

    fn removals(events: &[SimulationEvent], reason: RemovalReason) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::ProjectileRemoved { reason: r, .. } if *r == reason))
            .count()
    }

    #[test]
    fn test_throw_spawns_below_camera() {
        let mut sim = controller(SimulationSettings::default());
        let id = sim.handle_throw_projectile(-Vector3::z()).unwrap();
        assert_eq!(sim.projectile_ids(), vec![id]);
        let projectile = &sim.projectiles[0];
        let body = sim.world().body(projectile.body().unwrap()).unwrap();
        let expected = sim.camera().position.coords - Vector3::y() * 0.1;
        assert!((body.position - expected).norm() < 1e-5);
        assert!((body.velocity - Vector3::new(0.0, 0.0, -5.0)).norm() < 1e-5);
        assert_eq!(
            sim.drain_events(),
            vec![SimulationEvent::ProjectileThrown {
                entity: id,
                kind: ProjectileKind::Banana
            }]
        );
    }

    #[test]
    fn test_bullet_cues_gunshot() {
        let mut sim = controller(SimulationSettings::default());
        sim.update_throw_projectile_settings(ProjectileKind::Bullet, 0.1, 50.0);
        sim.handle_throw_projectile(-Vector3::z());
        assert!(sim.drain_events().contains(&SimulationEvent::Cue(AudioCue::Gunshot)));
    }

    #[test]
    fn test_cull_keeps_most_recent() {
        let mut settings = SimulationSettings::default();
        settings.set_object_limit(3);
        let mut sim = controller(settings);
        let mut ids = Vec::new();
        for i in 0..6 {
            let x = i as f32 * 2.0;
            sim.set_camera(Camera::new(Point3::new(x, 5.0, 4.0), Point3::new(x, 5.0, 0.0)));
            ids.extend(sim.handle_throw_projectile(Vector3::y()));
        }
        sim.tick();
        assert_eq!(sim.projectile_ids(), ids[3..].to_vec());
        assert_eq!(removals(&sim.drain_events(), RemovalReason::Culled), 3);
    }

    #[test]
    fn test_impaling_projectile_sticks_once() {
        let mut sim = controller(SimulationSettings::default());
        sim.update_throw_projectile_settings(ProjectileKind::Spear, 1.0, 0.0);
        let torso = sim.dummy().unwrap().body_position(sim.world(), UPPER_BODY).unwrap();
        // Straight down: the spear's tip sits half its length below the origin
        let half = sim.assets.prop("spear").dimensions.y / 2.0;
        let camera_pos = torso + Vector3::y() * (half + 0.1);
        sim.set_camera(Camera::new(camera_pos.into(), (torso - Vector3::z()).into()));
        let constraints = sim.world().constraint_count();
        sim.handle_throw_projectile(-Vector3::y()).unwrap();
        sim.classify_projectiles();
        assert_eq!(sim.projectile_count(), 0);
        assert_eq!(sim.stuck_projectile_count(), 1);
        assert_eq!(sim.world().constraint_count(), constraints + 1);
        sim.tick();
        let impaled = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimulationEvent::ProjectileImpaled { .. }))
            .count();
        assert_eq!(impaled, 1);
        assert_eq!(sim.stuck_projectile_count(), 1);
    }

    #[test]
    fn test_explosive_next_to_dummy_detonates() {
        let mut settings = SimulationSettings::default();
        settings.set_gravity_y(-1.0);
        let mut sim = controller(settings);
        sim.update_throw_projectile_settings(ProjectileKind::Grenade, 1.0, 0.0);
        let torso = sim.dummy().unwrap().body_position(sim.world(), UPPER_BODY).unwrap();
        sim.set_camera(Camera::new((torso + Vector3::new(0.0, 0.1, 0.5)).into(), torso.into()));
        let id = sim.handle_throw_projectile(-Vector3::z()).unwrap();
        sim.classify_projectiles();
        assert_eq!(sim.projectile_count(), 0);
        let events = sim.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            SimulationEvent::ProjectileExploded { entity, force, .. } if *entity == id && *force == 4.0
        )));
        assert_eq!(removals(&events, RemovalReason::Exploded), 1);
        let moved = sim
            .dummy()
            .unwrap()
            .get_bodies()
            .into_iter()
            .filter(|h| sim.world().body(*h).unwrap().velocity.norm() > 0.1)
            .count();
        assert!(moved > 0);
    }

    #[test]
    fn test_inert_projectile_is_never_classified() {
        let mut sim = controller(SimulationSettings::default());
        let torso = sim.dummy().unwrap().body_position(sim.world(), UPPER_BODY).unwrap();
        sim.set_camera(Camera::new((torso + Vector3::new(0.0, 0.1, 0.3)).into(), torso.into()));
        sim.update_throw_projectile_settings(ProjectileKind::Chair, 1.0, 0.0);
        sim.handle_throw_projectile(-Vector3::z());
        sim.tick();
        assert_eq!(sim.projectile_count(), 1);
        assert_eq!(sim.stuck_projectile_count(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut settings = SimulationSettings::default();
        settings.world_bounds = Vector3::repeat(5.0);
        let mut sim = controller(settings);
        sim.update_throw_projectile_settings(ProjectileKind::Banana, 1.0, 0.0);
        sim.set_camera(Camera::new(Point3::new(0.0, 1.0, 20.0), Point3::new(0.0, 1.0, 0.0)));
        sim.handle_throw_projectile(-Vector3::z());
        let dummy = sim.dummy.as_ref().unwrap();
        dummy.move_body(&mut sim.world, &[], Vector3::new(0.0, 0.0, 10.0));
        sim.tick();
        assert_eq!(sim.projectile_count(), 0);
        let events = sim.drain_events();
        assert_eq!(removals(&events, RemovalReason::OutOfBounds), 1);
        assert!(events.contains(&SimulationEvent::DummyReset { out_of_bounds: true }));
        let dummy = sim.dummy().unwrap();
        assert_eq!(
            dummy.body_position(sim.world(), UPPER_BODY),
            Some(dummy.snapshot(UPPER_BODY).unwrap().position)
        );
    }

    #[test]
    fn test_reload_clears_every_projectile() {
        let mut sim = controller(SimulationSettings::default());
        for _ in 0..3 {
            sim.handle_throw_projectile(-Vector3::z());
        }
        sim.handle_reload_scene();
        assert_eq!(sim.projectile_count(), 0);
        let events = sim.drain_events();
        assert_eq!(removals(&events, RemovalReason::Cleared), 3);
        assert!(events.contains(&SimulationEvent::DummyReset { out_of_bounds: false }));
        assert_eq!(sim.world().body_count(), 12);
    }
}

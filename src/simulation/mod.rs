//! The simulation controller: owns the world, every live entity, the active
//! click context and the fixed-step loop.
//!
//! All input arrives through methods on [`SimulationController`]. A tick runs
//! in a fixed order: step the world, cull projectiles, enforce bounds,
//! classify projectiles, sync visuals, then per-frame tool work. Things worth
//! telling the app layer about are queued as [`SimulationEvent`]s and handed
//! out by [`SimulationController::drain_events`].

mod context;
mod handlers;
mod projectiles;
mod spawners;

use std::collections::VecDeque;

use embedded_graphics_core::pixelcolor::{Rgb565, WebColors};
use log::{debug, info};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::assets::{AssetProvider, PropCatalog};
use crate::camera::Camera;
use crate::entity::{Assembly, EntityId, PhysicalEntity, Pose};
use crate::error::RagdollError;
use crate::events::{AudioCue, RemovalReason, SimulationEvent};
use crate::interaction::Interaction;
use crate::physics::{Collider, RigidBody, World, MAX_CONTACTS};
use crate::ragdoll::{RagdollBuilder, PELVIS};
use crate::scene::{NodeShape, RecordingScene, SceneGraph, VisualNode};
use crate::settings::SimulationSettings;
use crate::tools::{FreezeSet, MeleeKind, PressOrientation, ProjectileKind, TimedEffect, FIRE};

use projectiles::Projectile;

pub const GROUND: &str = "ground";

const GROUND_HALF_EXTENTS: Vector3<f32> = Vector3::new(50.0, 0.5, 50.0);

#[derive(Debug)]
struct Press {
    entity: PhysicalEntity,
    orientation: PressOrientation,
    gap: f32,
}

#[derive(Debug)]
struct Rack {
    entity: PhysicalEntity,
    /// Upper-body pose when the rack spawned.
    pivot: Pose,
}

#[derive(Debug)]
struct Melee {
    entity: PhysicalEntity,
    kind: MeleeKind,
}

pub struct SimulationController<S: SceneGraph = RecordingScene, A: AssetProvider = PropCatalog> {
    world: World,
    settings: SimulationSettings,
    scene: S,
    assets: A,
    camera: Camera,
    rng: ChaCha8Rng,
    context: Interaction,
    next_id: u64,
    ground: PhysicalEntity,
    dummy: Option<PhysicalEntity>,
    pins: Vec<PhysicalEntity>,
    projectiles: VecDeque<Projectile>,
    stuck_projectiles: VecDeque<Projectile>,
    press: Option<Press>,
    rack: Option<Rack>,
    guillotine: Option<PhysicalEntity>,
    melee: Option<Melee>,
    fire: Option<PhysicalEntity>,
    frozen: Option<FreezeSet>,
    effect: Option<TimedEffect>,
    events: Vec<SimulationEvent>,
    accumulator: f32,
}

impl SimulationController {
    /// A controller with an in-memory scene and the built-in props.
    pub fn new(settings: SimulationSettings) -> Self {
        Self::with_collaborators(settings, RecordingScene::new(), PropCatalog::with_builtin_props())
    }
}

fn ground_assembly() -> Assembly {
    let position = Vector3::new(0.0, -GROUND_HALF_EXTENTS.y, 0.0);
    let mut node = VisualNode::new("groundGroup");
    let id = node.add_child(
        VisualNode::ROOT,
        GROUND,
        NodeShape::Cuboid {
            half_extents: GROUND_HALF_EXTENTS,
        },
    );
    node.set_local_position(id, position);
    node.set_color(id, Rgb565::CSS_DARK_GRAY);
    Assembly::new(node).with_body(
        GROUND,
        RigidBody::new_static().with_position(position).with_collider(Collider::Cuboid {
            half_extents: GROUND_HALF_EXTENTS,
        }),
    )
}

impl<S: SceneGraph, A: AssetProvider> SimulationController<S, A> {
    /// A controller showing entities through `scene` and loading props from
    /// `assets`. The world starts with only the ground; call
    /// [`load_dummy`](Self::load_dummy) to add the dummy.
    pub fn with_collaborators(settings: SimulationSettings, mut scene: S, assets: A) -> Self {
        let mut world = World::new();
        world.set_gravity(settings.gravity);
        world.solver_iterations = settings.solver_iterations;
        let mut rng = ChaCha8Rng::seed_from_u64(settings.rng_seed);

        let mut ground = PhysicalEntity::spawn(EntityId(0), ground_assembly(), &mut world);
        if settings.debug {
            ground.create_debug_visuals(&world, &mut rng);
        }
        scene.insert(ground.id(), &ground.node);

        Self {
            world,
            settings,
            scene,
            assets,
            camera: Camera::default(),
            rng,
            context: Interaction::None,
            next_id: 1,
            ground,
            dummy: None,
            pins: Vec::new(),
            projectiles: VecDeque::new(),
            stuck_projectiles: VecDeque::new(),
            press: None,
            rack: None,
            guillotine: None,
            melee: None,
            fire: None,
            frozen: None,
            effect: None,
            events: Vec::new(),
            accumulator: 0.0,
        }
    }

    /// Build the dummy and spawn it, replacing any existing one.
    ///
    /// Everything attached to the old dummy goes with it: pins, stuck
    /// projectiles, the freeze, the rack and any running effect.
    pub fn load_dummy<B: RagdollBuilder>(&mut self, builder: &B) -> Result<(), RagdollError> {
        let assembly = builder.build()?;
        if let Some(old) = self.dummy.take() {
            self.cancel_effect();
            self.exit(self.context);
            self.set_context(Interaction::None);
            self.handle_clear_all_pins();
            self.handle_unfreeze_dummy();
            self.remove_draw_and_quarter();
            while let Some(stuck) = self.stuck_projectiles.pop_front() {
                self.remove_projectile(stuck, RemovalReason::Cleared);
            }
            self.despawn(old);
        }
        let dummy = self.spawn(assembly);
        info!("dummy loaded with {} bodies", dummy.get_bodies().len());
        self.dummy = Some(dummy);
        Ok(())
    }

    // -- Entity bookkeeping --

    fn spawn(&mut self, assembly: Assembly) -> PhysicalEntity {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let mut entity = PhysicalEntity::spawn(id, assembly, &mut self.world);
        if self.settings.debug {
            entity.create_debug_visuals(&self.world, &mut self.rng);
        }
        self.scene.insert(id, &entity.node);
        debug!("spawned {} as {:?}", entity.node.name(), id);
        entity
    }

    fn despawn(&mut self, entity: PhysicalEntity) {
        self.scene.remove(entity.id());
        debug!("despawned {} ({:?})", entity.node.name(), entity.id());
        entity.despawn(&mut self.world);
    }

    // -- Accessors --

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn context(&self) -> Interaction {
        self.context
    }

    pub fn camera_controls_enabled(&self) -> bool {
        self.context.camera_controls_enabled()
    }

    pub fn dummy(&self) -> Option<&PhysicalEntity> {
        self.dummy.as_ref()
    }

    pub fn ground(&self) -> &PhysicalEntity {
        &self.ground
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn stuck_projectile_count(&self) -> usize {
        self.stuck_projectiles.len()
    }

    /// Ids of the free projectiles, oldest first.
    pub fn projectile_ids(&self) -> Vec<EntityId> {
        self.projectiles.iter().map(|p| p.entity.id()).collect()
    }

    pub fn stuck_projectile_ids(&self) -> Vec<EntityId> {
        self.stuck_projectiles.iter().map(|p| p.entity.id()).collect()
    }

    pub fn press(&self) -> Option<&PhysicalEntity> {
        self.press.as_ref().map(|p| &p.entity)
    }

    pub fn rack(&self) -> Option<&PhysicalEntity> {
        self.rack.as_ref().map(|r| &r.entity)
    }

    pub fn guillotine(&self) -> Option<&PhysicalEntity> {
        self.guillotine.as_ref()
    }

    pub fn melee_weapon(&self) -> Option<&PhysicalEntity> {
        self.melee.as_ref().map(|m| &m.entity)
    }

    pub fn fire(&self) -> Option<&PhysicalEntity> {
        self.fire.as_ref()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn effect(&self) -> Option<&TimedEffect> {
        self.effect.as_ref()
    }

    /// Every live entity, ground first.
    pub fn entities(&self) -> impl Iterator<Item = &PhysicalEntity> {
        std::iter::once(&self.ground)
            .chain(self.dummy.iter())
            .chain(self.pins.iter())
            .chain(self.projectiles.iter().map(|p| &p.entity))
            .chain(self.stuck_projectiles.iter().map(|p| &p.entity))
            .chain(self.press.iter().map(|p| &p.entity))
            .chain(self.rack.iter().map(|r| &r.entity))
            .chain(self.guillotine.iter())
            .chain(self.melee.iter().map(|m| &m.entity))
            .chain(self.fire.iter())
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    // -- Loop --

    /// Run whole ticks for `frame_time` seconds of real time. Leftover time
    /// carries into the next call; backlog beyond `max_steps_per_frame` ticks
    /// is dropped. Returns the number of ticks run.
    pub fn advance(&mut self, frame_time: f32) -> u32 {
        let dt = self.settings.world_time_step;
        self.accumulator += frame_time.max(0.0);
        let mut steps = 0;
        while self.accumulator >= dt {
            if steps == self.settings.max_steps_per_frame {
                debug!("dropping {:.3}s of simulation backlog", self.accumulator);
                self.accumulator = 0.0;
                break;
            }
            self.tick();
            self.accumulator -= dt;
            steps += 1;
        }
        steps
    }

    /// One fixed step.
    pub fn tick(&mut self) {
        let dt = self.settings.world_time_step;
        self.world.step_fixed::<MAX_CONTACTS>(dt, self.settings.substeps);
        self.cull_projectiles();
        self.enforce_bounds();
        self.classify_projectiles();
        self.sync_entities();
        self.run_frame_tools(dt);
    }

    fn sync_entities(&mut self) {
        let world = &self.world;
        let scene = &mut self.scene;
        let mut sync = |entity: &mut PhysicalEntity| {
            entity.sync(world);
            scene.sync(entity.id(), &entity.node);
        };
        sync(&mut self.ground);
        self.dummy.iter_mut().for_each(&mut sync);
        self.pins.iter_mut().for_each(&mut sync);
        self.projectiles.iter_mut().for_each(|p| sync(&mut p.entity));
        self.stuck_projectiles.iter_mut().for_each(|p| sync(&mut p.entity));
        self.press.iter_mut().for_each(|p| sync(&mut p.entity));
        self.rack.iter_mut().for_each(|r| sync(&mut r.entity));
        self.guillotine.iter_mut().for_each(&mut sync);
        self.melee.iter_mut().for_each(|m| sync(&mut m.entity));
        self.fire.iter_mut().for_each(&mut sync);
    }

    fn run_frame_tools(&mut self, dt: f32) {
        if let Some(melee) = &self.melee {
            crate::tools::move_pivot(&mut self.world, &melee.entity, &self.camera, &self.settings.tools);
        }

        self.advance_effect(dt);

        let (Some(fire), Some(dummy)) = (&self.fire, &self.dummy) else {
            return;
        };
        let (Some(flame), Some(pelvis)) = (
            fire.body_position(&self.world, FIRE),
            dummy.body_position(&self.world, PELVIS),
        ) else {
            return;
        };
        if (flame - pelvis).norm() < self.settings.tools.fire_proximity {
            self.events.push(SimulationEvent::Burning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ragdoll::ProceduralRagdoll;

    fn controller() -> SimulationController {
        let mut sim = SimulationController::new(SimulationSettings::default());
        sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
        sim
    }

    #[test]
    fn test_new_spawns_only_ground() {
        let sim = SimulationController::new(SimulationSettings::default());
        assert_eq!(sim.world().body_count(), 1);
        assert_eq!(sim.scene().len(), 1);
        assert!(sim.dummy().is_none());
        assert_eq!(sim.context(), Interaction::None);
    }

    #[test]
    fn test_ground_top_is_at_zero() {
        let sim = SimulationController::new(SimulationSettings::default());
        let ground = sim.world().body(sim.ground().body(GROUND).unwrap()).unwrap();
        assert_eq!(ground.position.y + GROUND_HALF_EXTENTS.y, 0.0);
        assert!(!ground.is_dynamic());
    }

    #[test]
    fn test_load_dummy_replaces_previous() {
        let mut sim = controller();
        let first = sim.dummy().unwrap().id();
        sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
        assert_ne!(sim.dummy().unwrap().id(), first);
        assert_eq!(sim.world().body_count(), 1 + 11);
        assert_eq!(sim.scene().len(), 2);
    }

    #[test]
    fn test_failed_load_keeps_current_dummy() {
        let mut sim = controller();
        let mut broken = ProceduralRagdoll::default();
        broken.masses.head = 0.0;
        assert!(matches!(sim.load_dummy(&broken), Err(RagdollError::InvalidMass(_))));
        assert!(sim.dummy().is_some());
        assert_eq!(sim.world().body_count(), 12);
    }

    #[test]
    fn test_advance_runs_whole_ticks_and_caps_backlog() {
        let mut sim = controller();
        let dt = sim.settings().world_time_step;
        assert_eq!(sim.advance(dt * 0.5), 0);
        assert_eq!(sim.advance(dt * 0.6), 1);
        assert_eq!(sim.advance(dt * 50.0), sim.settings().max_steps_per_frame);
        assert_eq!(sim.advance(0.0), 0, "backlog is dropped, not carried");
    }

    #[test]
    fn test_tick_syncs_every_entity() {
        let mut sim = controller();
        sim.tick();
        assert_eq!(sim.scene().sync_count(), 2);
    }

    #[test]
    fn test_debug_visuals_when_enabled() {
        let mut settings = SimulationSettings::default();
        settings.set_debug(true);
        let mut sim = SimulationController::new(settings);
        sim.load_dummy(&ProceduralRagdoll::default()).unwrap();
        assert!(sim.ground().debug_visuals().is_some());
        assert_eq!(sim.dummy().unwrap().debug_visuals().unwrap().len(), 12);
    }
}

//! Input handlers that act on the dummy, world-wide settings changes and the
//! timed effects.

use rand::Rng;

use super::*;
use crate::ragdoll::UPPER_BODY;
use crate::tools::{create_pin, drag, punch, EffectAction};

impl<S: SceneGraph, A: AssetProvider> SimulationController<S, A> {
    // -- World and settings --

    /// Replace the vertical gravity component.
    pub fn change_world_gravity(&mut self, y: f32) {
        self.settings.set_gravity_y(y);
        self.world.set_gravity(self.settings.gravity);
    }

    pub fn update_throw_projectile_settings(&mut self, kind: ProjectileKind, mass: f32, speed: f32) {
        self.settings.set_projectile(kind, mass, speed);
    }

    /// Change the melee weapon type. A weapon already in hand is swapped for
    /// the new one; with no weapon in hand only the setting changes, so this
    /// never enables the weapon on its own.
    pub fn update_melee_settings(&mut self, kind: MeleeKind) {
        self.settings.set_melee_type(kind);
        if self.melee.is_some() {
            self.enable_melee_weapon();
        }
    }

    /// Clear every projectile and put the dummy back in its spawn pose. A
    /// frozen dummy is unfrozen for the reset and frozen again afterwards.
    pub fn handle_reload_scene(&mut self) {
        self.clear_projectiles(RemovalReason::Cleared);
        if self.dummy.is_none() {
            return;
        }
        let was_frozen = self.frozen.is_some();
        self.handle_unfreeze_dummy();
        if let Some(dummy) = &self.dummy {
            dummy.reset_bodies_to_initial_positions(&mut self.world);
        }
        if was_frozen {
            self.handle_freeze_dummy();
        }
        info!("scene reloaded");
        self.events.push(SimulationEvent::DummyReset { out_of_bounds: false });
    }

    // -- Dummy --

    /// Pin the dummy body nearest `point`, if one is within reach.
    pub fn handle_pin(&mut self, point: Vector3<f32>) {
        let Some(assembly) = self
            .dummy
            .as_ref()
            .and_then(|d| create_pin(&self.world, d, point, &self.settings.tools))
        else {
            debug!("nothing to pin near {:?}", point);
            return;
        };
        let pin = self.spawn(assembly);
        self.pins.push(pin);
    }

    pub fn handle_clear_all_pins(&mut self) {
        for pin in std::mem::take(&mut self.pins) {
            self.despawn(pin);
        }
    }

    /// Push the whole dummy by a pointer delta in the camera's screen plane.
    ///
    /// Unlike the click handlers this takes no world-space point: `dx` and
    /// `dy` are screen-space pointer deltas, mapped onto the camera's right
    /// and up vectors.
    pub fn handle_drag_dummy(&mut self, dx: f32, dy: f32) {
        let Some(dummy) = &self.dummy else { return };
        let force = self.settings.gravity_scaled(self.settings.drag_force);
        drag(&mut self.world, dummy, &self.camera, force, dx, dy);
    }

    /// Punch the dummy body nearest `point` along the view direction.
    pub fn handle_punch_dummy(&mut self, point: Vector3<f32>) {
        let Some(dummy) = &self.dummy else { return };
        let Some((part, _)) = dummy.closest_body_to(&self.world, &point, self.settings.tools.pin_threshold) else {
            return;
        };
        let part = part.to_owned();
        let strength = self.settings.gravity_scaled(self.settings.punch_strength);
        punch(&mut self.world, dummy, &self.camera, strength, &[part.as_str()]);
        self.events.push(SimulationEvent::Punched { part });
        self.events.push(SimulationEvent::Cue(AudioCue::Punch));
    }

    // -- Timed effects --

    /// Shove the whole dummy along the view direction after a short delay.
    pub fn handle_fus_ro_dah(&mut self) {
        if self.dummy.is_none() {
            return;
        }
        self.effect = Some(TimedEffect::fus_ro_dah(
            self.camera.get_direction(),
            self.settings.fus_ro_dah_force,
            self.settings.tools.fus_ro_dah_delay,
        ));
        self.events.push(SimulationEvent::Cue(AudioCue::FusRoDah));
    }

    /// Reset the dummy, pin its upper body in place and start the gusts.
    pub fn handle_golden_wind(&mut self) {
        let Some(dummy) = &self.dummy else { return };
        dummy.reset_bodies_to_initial_positions(&mut self.world);
        let Some(torso) = dummy.body_position(&self.world, UPPER_BODY) else {
            return;
        };
        self.handle_clear_all_pins();
        let offset = self.settings.tools.golden_wind.pin_offset;
        self.handle_pin(torso - Vector3::z() * offset);
        self.effect = Some(TimedEffect::golden_wind(self.camera.get_direction(), &self.settings.tools.golden_wind));
        self.events.push(SimulationEvent::Cue(AudioCue::GoldenWind));
    }

    pub(super) fn cancel_effect(&mut self) {
        if let Some(mut effect) = self.effect.take() {
            effect.cancel();
        }
    }

    /// Advance the running effect and apply whatever became due. A finished
    /// effect takes its context back to `None`.
    pub(super) fn advance_effect(&mut self, dt: f32) {
        let Some(effect) = self.effect.as_mut() else { return };
        let actions = effect.advance(dt);
        let finished = effect.is_finished();
        for action in actions {
            self.apply_effect_action(action);
        }
        if finished {
            self.effect = None;
            if matches!(self.context, Interaction::FusRoDah | Interaction::GoldenWind) {
                self.set_context(Interaction::None);
            }
        }
    }

    fn apply_effect_action(&mut self, action: EffectAction) {
        let Some(dummy) = &self.dummy else { return };
        match action {
            EffectAction::ImpulseAll(impulse) => {
                dummy.apply_impulse(&mut self.world, &[], impulse);
                let parts = dummy.get_bodies().len();
                self.events.push(SimulationEvent::WindGust { parts });
            }
            EffectAction::ImpulseRandomPart(impulse) => {
                let bodies = dummy.get_bodies();
                if bodies.is_empty() {
                    return;
                }
                let handle = bodies[self.rng.random_range(0..bodies.len())];
                if let Some(body) = self.world.body_mut(handle) {
                    body.apply_impulse(impulse);
                }
                self.events.push(SimulationEvent::WindGust { parts: 1 });
            }
            EffectAction::ImpulsePart { part, impulse } => {
                dummy.apply_impulse(&mut self.world, &[part], impulse);
                self.events.push(SimulationEvent::WindGust { parts: 1 });
            }
            EffectAction::ClearPins => self.handle_clear_all_pins(),
        }
    }
}

//! Click-context state machine.

use super::*;

impl<S: SceneGraph, A: AssetProvider> SimulationController<S, A> {
    /// Switch the click context without spawning or tearing anything down.
    pub fn set_current_click_context(&mut self, context: Interaction) {
        self.set_context(context);
    }

    /// Toggle `interaction`.
    ///
    /// If it is already active, leave it (tearing down what it owns) and go
    /// back to [`Interaction::None`]. Otherwise leave the current context and
    /// enter `interaction`, spawning what it owns. Any running timed effect is
    /// cancelled first. Pins and stuck projectiles survive every switch;
    /// toggling the pin context off clears the pins.
    pub fn toggle(&mut self, interaction: Interaction) {
        self.cancel_effect();
        let current = self.context;
        self.exit(current);
        if current == interaction {
            if interaction == Interaction::Pin {
                self.handle_clear_all_pins();
            }
            self.set_context(Interaction::None);
        } else {
            self.set_context(interaction);
            self.enter(interaction);
        }
    }

    pub(super) fn set_context(&mut self, to: Interaction) {
        let from = self.context;
        if from == to {
            return;
        }
        debug!("click context {} -> {}", from, to);
        self.context = to;
        self.events.push(SimulationEvent::ContextChanged { from, to });
    }

    fn enter(&mut self, interaction: Interaction) {
        match interaction {
            Interaction::Melee => self.enable_melee_weapon(),
            Interaction::Press => self.spawn_press(self.settings.press_orientation),
            Interaction::DrawAndQuarter => self.spawn_draw_and_quarter(self.settings.tools.rack_angle, 0.0),
            Interaction::Guillotine => self.spawn_guillotine(),
            Interaction::Freeze => self.handle_freeze_dummy(),
            Interaction::Fire => self.create_fire(),
            Interaction::FusRoDah => self.handle_fus_ro_dah(),
            Interaction::GoldenWind => self.handle_golden_wind(),
            Interaction::None
            | Interaction::Pin
            | Interaction::Drag
            | Interaction::Punch
            | Interaction::Projectile => {}
        }
    }

    pub(super) fn exit(&mut self, interaction: Interaction) {
        match interaction {
            Interaction::Melee => self.disable_melee_weapon(),
            Interaction::Press => self.remove_press(),
            Interaction::DrawAndQuarter => self.remove_draw_and_quarter(),
            Interaction::Guillotine => self.remove_guillotine(),
            Interaction::Freeze => self.handle_unfreeze_dummy(),
            Interaction::Fire => self.remove_fire(),
            Interaction::FusRoDah | Interaction::GoldenWind => self.cancel_effect(),
            Interaction::None
            | Interaction::Pin
            | Interaction::Drag
            | Interaction::Punch
            | Interaction::Projectile => {}
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
    fn test_toggle_twice_returns_to_none_and_tears_down() {
        let mut sim = controller();
        let baseline = sim.world().body_count();
        for interaction in Interaction::ALL {
            sim.toggle(interaction);
            sim.toggle(interaction);
            assert_eq!(sim.context(), Interaction::None, "{}", interaction);
            assert!(sim.press().is_none() && sim.rack().is_none() && sim.guillotine().is_none());
            assert!(sim.melee_weapon().is_none() && sim.fire().is_none() && !sim.is_frozen());
            assert!(sim.effect().is_none());
            // Golden wind leaves its pin behind until the pin context is toggled off
            sim.handle_clear_all_pins();
            assert_eq!(sim.world().body_count(), baseline, "{}", interaction);
        }
    }

    #[test]
    fn test_switching_contexts_swaps_owned_entities() {
        let mut sim = controller();
        sim.toggle(Interaction::Press);
        assert!(sim.press().is_some());
        sim.toggle(Interaction::Fire);
        assert_eq!(sim.context(), Interaction::Fire);
        assert!(sim.press().is_none());
        assert!(sim.fire().is_some());
    }

    #[test]
    fn test_pins_survive_context_switches() {
        let mut sim = controller();
        let torso = sim.dummy().unwrap().body_position(sim.world(), "upperBody").unwrap();
        sim.toggle(Interaction::Pin);
        sim.handle_pin(torso);
        sim.toggle(Interaction::Melee);
        sim.toggle(Interaction::Melee);
        assert_eq!(sim.pin_count(), 1);
        sim.toggle(Interaction::Pin);
        sim.toggle(Interaction::Pin);
        assert_eq!(sim.pin_count(), 0);
    }

    #[test]
    fn test_camera_controls_only_off_while_dragging() {
        let mut sim = controller();
        sim.toggle(Interaction::Drag);
        assert!(!sim.camera_controls_enabled());
        sim.toggle(Interaction::Punch);
        assert!(sim.camera_controls_enabled());
    }

    #[test]
    fn test_context_changes_are_reported() {
        let mut sim = controller();
        sim.drain_events();
        sim.set_current_click_context(Interaction::Projectile);
        sim.set_current_click_context(Interaction::Projectile);
        assert_eq!(
            sim.drain_events(),
            vec![SimulationEvent::ContextChanged {
                from: Interaction::None,
                to: Interaction::Projectile
            }]
        );
    }
}

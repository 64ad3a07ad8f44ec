//! Spawning, moving and removing the context-owned tools.

use super::*;
use crate::ragdoll::UPPER_BODY;
use crate::tools::{
    create_draw_and_quarter, create_guillotine, create_melee_weapon, create_press, freeze_dummy,
    move_draw_and_quarter, move_guillotine_blade, move_press, seat_dummy, swing, unfreeze_dummy,
};

impl<S: SceneGraph, A: AssetProvider> SimulationController<S, A> {
    // -- Press --

    /// Spawn the press around the dummy, replacing any existing one. The
    /// vertical press closes on the pelvis, the horizontal one on the upper
    /// body; without a dummy it closes on the origin.
    pub fn spawn_press(&mut self, orientation: PressOrientation) {
        self.remove_press();
        let part = match orientation {
            PressOrientation::Vertical => PELVIS,
            PressOrientation::Horizontal => UPPER_BODY,
        };
        let target = self
            .dummy
            .as_ref()
            .and_then(|d| d.body_position(&self.world, part))
            .unwrap_or_else(Vector3::zeros);
        let gap = self.settings.press_gap;
        let assembly = create_press(target, gap, orientation, self.settings.dark_mode, &self.settings.tools);
        let entity = self.spawn(assembly);
        self.settings.set_press_orientation(orientation);
        self.press = Some(Press {
            entity,
            orientation,
            gap,
        });
    }

    pub fn remove_press(&mut self) {
        if let Some(press) = self.press.take() {
            self.despawn(press.entity);
        }
    }

    /// Respawn the press with `orientation`.
    pub fn change_press_type(&mut self, orientation: PressOrientation) {
        self.remove_press();
        self.spawn_press(orientation);
    }

    /// Close the jaws to `value` of the spawn gap.
    pub fn move_press(&mut self, value: f32) {
        if let Some(press) = &self.press {
            move_press(&mut self.world, &press.entity, press.gap, value, press.orientation);
        }
    }

    // -- Draw and quarter --

    /// Lock the dummy's hands and feet to four anchors around its upper body.
    /// `angle` is in degrees, `percentage` in `[0, 1]`.
    pub fn spawn_draw_and_quarter(&mut self, angle: f32, percentage: f32) {
        self.remove_draw_and_quarter();
        let Some(dummy) = &self.dummy else {
            debug!("draw and quarter skipped: no dummy");
            return;
        };
        let Some(pivot) = dummy.body_pose(&self.world, UPPER_BODY) else {
            return;
        };
        let assembly =
            create_draw_and_quarter(&mut self.world, dummy, &pivot, angle, percentage, &self.settings.tools);
        let entity = self.spawn(assembly);
        self.rack = Some(Rack { entity, pivot });
        if percentage > 0.0 {
            self.events.push(SimulationEvent::Stretched);
        }
    }

    pub fn remove_draw_and_quarter(&mut self) {
        if let Some(rack) = self.rack.take() {
            self.despawn(rack.entity);
        }
    }

    pub fn move_draw_and_quarter(&mut self, angle: f32, percentage: f32) {
        let Some(rack) = &self.rack else { return };
        move_draw_and_quarter(
            &mut self.world,
            &rack.entity,
            &rack.pivot,
            angle,
            percentage,
            &self.settings.tools,
        );
        if percentage > 0.0 {
            self.events.push(SimulationEvent::Stretched);
        }
    }

    // -- Guillotine --

    /// Switch to guillotine gravity, spawn the guillotine and lay the dummy
    /// under the blade. Does nothing if a guillotine already stands.
    pub fn spawn_guillotine(&mut self) {
        if self.guillotine.is_some() {
            return;
        }
        self.change_world_gravity(self.settings.guillotine_gravity);
        let guillotine = self.spawn(create_guillotine(&self.settings.tools));
        if let Some(dummy) = &self.dummy {
            seat_dummy(&mut self.world, dummy, &guillotine);
        }
        self.guillotine = Some(guillotine);
    }

    pub fn remove_guillotine(&mut self) {
        if let Some(guillotine) = self.guillotine.take() {
            self.despawn(guillotine);
        }
    }

    pub fn move_guillotine_blade(&mut self, percentage: f32) {
        if let Some(guillotine) = &self.guillotine {
            move_guillotine_blade(&mut self.world, guillotine, percentage, &self.settings.tools);
        }
    }

    // -- Melee --

    /// Spawn the configured melee weapon in front of the camera, replacing
    /// any existing one.
    pub fn enable_melee_weapon(&mut self) {
        self.disable_melee_weapon();
        let kind = self.settings.melee_type;
        let prop = self.assets.prop(kind.name());
        let Some(assembly) =
            create_melee_weapon(&self.camera, kind, prop, self.settings.melee_mass, &self.settings.tools)
        else {
            debug!("melee weapon {} not created", kind.name());
            return;
        };
        let entity = self.spawn(assembly);
        self.melee = Some(Melee { entity, kind });
    }

    pub fn disable_melee_weapon(&mut self) {
        if let Some(melee) = self.melee.take() {
            self.despawn(melee.entity);
        }
    }

    pub fn swing_melee_weapon(&mut self) {
        if let Some(melee) = &self.melee {
            swing(&mut self.world, &melee.entity, melee.kind, &self.settings.tools);
        }
    }

    // -- Fire --

    /// Light a fire under the dummy. Does nothing if one is burning.
    pub fn create_fire(&mut self) {
        if self.fire.is_some() {
            return;
        }
        let Some(assembly) = self
            .dummy
            .as_ref()
            .and_then(|d| crate::tools::create_fire(&self.world, d, &self.settings.tools))
        else {
            debug!("fire skipped: no dummy");
            return;
        };
        let fire = self.spawn(assembly);
        self.fire = Some(fire);
    }

    pub fn remove_fire(&mut self) {
        if let Some(fire) = self.fire.take() {
            self.despawn(fire);
        }
    }

    // -- Freeze --

    /// Lock the dummy's limbs to its upper body. Does nothing if already
    /// frozen.
    pub fn handle_freeze_dummy(&mut self) {
        if self.frozen.is_some() {
            return;
        }
        if let Some(dummy) = &self.dummy {
            self.frozen = Some(freeze_dummy(&mut self.world, dummy));
        }
    }

    pub fn handle_unfreeze_dummy(&mut self) {
        if let Some(mut set) = self.frozen.take() {
            unfreeze_dummy(&mut self.world, &mut set);
        }
    }
}

//! Simulation and tool configuration.
//!
//! [`SimulationSettings`] is owned by the simulation controller and changed
//! only through its named setters. Every field has a default, so a settings
//! document only needs the keys it overrides.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tools::{MeleeKind, PressOrientation, ProjectileKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationSettings {
    /// Fixed step in seconds.
    pub world_time_step: f32,
    pub substeps: u32,
    pub solver_iterations: u32,
    pub gravity: Vector3<f32>,
    /// Half-size of the box outside which things are reset or destroyed.
    pub world_bounds: Vector3<f32>,
    /// Cap on free projectiles, and separately on stuck projectiles.
    pub object_limit: usize,
    pub fus_ro_dah_force: f32,
    pub drag_force: f32,
    pub projectile_type: ProjectileKind,
    pub projectile_speed: f32,
    pub projectile_mass: f32,
    pub press_gap: f32,
    pub press_orientation: PressOrientation,
    pub punch_strength: f32,
    pub melee_type: MeleeKind,
    pub melee_mass: f32,
    /// Gravity applied when the guillotine spawns.
    pub guillotine_gravity: f32,
    /// Upper bound on ticks run by one `advance` call.
    pub max_steps_per_frame: u32,
    pub rng_seed: u64,
    pub dark_mode: bool,
    pub debug: bool,
    pub tools: ToolSettings,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            world_time_step: 1.0 / 60.0,
            substeps: 4,
            solver_iterations: 10,
            gravity: Vector3::zeros(),
            world_bounds: Vector3::new(100.0, 100.0, 100.0),
            object_limit: 20,
            fus_ro_dah_force: 2.0,
            drag_force: 1.0,
            projectile_type: ProjectileKind::Banana,
            projectile_speed: 5.0,
            projectile_mass: 1.0,
            press_gap: 2.5,
            press_orientation: PressOrientation::Vertical,
            punch_strength: 2.0,
            melee_type: MeleeKind::Sword,
            melee_mass: 5.0,
            guillotine_gravity: -5.0,
            max_steps_per_frame: 5,
            rng_seed: 0x5eed,
            dark_mode: false,
            debug: false,
            tools: ToolSettings::default(),
        }
    }
}

impl SimulationSettings {
    /// Parse a settings document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_time_step > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "worldTimeStep",
                reason: format!("must be positive, got {}", self.world_time_step),
            });
        }
        if self.substeps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "substeps",
                reason: "must be at least 1".into(),
            });
        }
        if self.world_bounds.iter().any(|b| !(*b > 0.0)) {
            return Err(ConfigError::InvalidValue {
                field: "worldBounds",
                reason: format!("every component must be positive, got {:?}", self.world_bounds),
            });
        }
        if !(self.projectile_mass > 0.0) || !(self.melee_mass > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "projectileMass",
                reason: "projectile and melee masses must be positive".into(),
            });
        }
        if self.press_gap < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pressGap",
                reason: format!("must not be negative, got {}", self.press_gap),
            });
        }
        Ok(())
    }

    // -- Named setters --

    /// Replace only the vertical gravity component.
    pub fn set_gravity_y(&mut self, y: f32) {
        self.gravity.y = y;
    }

    pub fn set_projectile(&mut self, kind: ProjectileKind, mass: f32, speed: f32) {
        self.projectile_type = kind;
        if mass > 0.0 {
            self.projectile_mass = mass;
        }
        self.projectile_speed = speed;
    }

    pub fn set_melee_type(&mut self, kind: MeleeKind) {
        self.melee_type = kind;
    }

    pub fn set_press_orientation(&mut self, orientation: PressOrientation) {
        self.press_orientation = orientation;
    }

    pub fn set_press_gap(&mut self, gap: f32) {
        self.press_gap = gap.max(0.0);
    }

    pub fn set_object_limit(&mut self, limit: usize) {
        self.object_limit = limit;
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.dark_mode = dark_mode;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Strength of a drag or punch: the configured value plus the current
    /// gravity magnitude, so heavier worlds need no retuning.
    pub(crate) fn gravity_scaled(&self, base: f32) -> f32 {
        self.gravity.y.abs() + base
    }
}

/// Designer-tuned constants of the individual tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub pin_threshold: f32,
    pub pin_radius: f32,
    pub stick_threshold: f32,
    pub explosion_proximity: f32,
    pub explosion_force: f32,
    pub explosion_radius: f32,
    /// Camera-relative drop of the throw origin.
    pub throw_drop: f32,
    pub press_vertical_half_extents: Vector3<f32>,
    pub press_horizontal_half_extents: Vector3<f32>,
    pub rack_min_stretch: f32,
    pub rack_max_stretch: f32,
    /// Anchor bearing in degrees used when the rack is entered from a toggle.
    pub rack_angle: f32,
    pub guillotine_position: Vector3<f32>,
    pub guillotine_base_half_extents: Vector3<f32>,
    pub guillotine_blade_half_extents: Vector3<f32>,
    /// Height of the blade's resting position above the base center.
    pub guillotine_blade_height: f32,
    pub guillotine_drop_height: f32,
    pub melee_offset: Vector3<f32>,
    pub melee_swing_velocity: Vector3<f32>,
    /// Where the hinge sits between the pivot and the weapon center.
    pub melee_hinge_fraction: f32,
    pub fire_height: f32,
    pub fire_proximity: f32,
    pub fus_ro_dah_delay: f32,
    pub golden_wind: GoldenWindSettings,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            pin_threshold: 0.5,
            pin_radius: 0.05,
            stick_threshold: 0.1,
            explosion_proximity: 1.0,
            explosion_force: 2.0,
            explosion_radius: 5.0,
            throw_drop: 0.1,
            press_vertical_half_extents: Vector3::new(2.0, 0.35, 1.0),
            press_horizontal_half_extents: Vector3::new(0.5, 1.0, 2.0),
            rack_min_stretch: 1.0,
            rack_max_stretch: 2.0,
            rack_angle: 45.0,
            guillotine_position: Vector3::new(0.0, 0.6, 0.0),
            guillotine_base_half_extents: Vector3::new(0.5, 0.6, 2.0),
            guillotine_blade_half_extents: Vector3::new(0.5, 0.1, 0.05),
            guillotine_blade_height: 2.2,
            guillotine_drop_height: 1.5,
            melee_offset: Vector3::new(0.25, -0.25, -1.5),
            melee_swing_velocity: Vector3::new(-100.0, -100.0, -100.0),
            melee_hinge_fraction: 0.1,
            fire_height: 1.5,
            fire_proximity: 1.0,
            fus_ro_dah_delay: 1.0,
            golden_wind: GoldenWindSettings::default(),
        }
    }
}

impl ToolSettings {
    pub fn press_half_extents(&self, orientation: PressOrientation) -> Vector3<f32> {
        match orientation {
            PressOrientation::Vertical => self.press_vertical_half_extents,
            PressOrientation::Horizontal => self.press_horizontal_half_extents,
        }
    }

    /// Rack stretch for a `[0, 1]` slider value.
    pub fn rack_stretch(&self, percentage: f32) -> f32 {
        let pct = percentage.clamp(0.0, 1.0);
        self.rack_min_stretch + (self.rack_max_stretch - self.rack_min_stretch) * pct
    }
}

/// Phase timings of the golden-wind effect, in seconds from its start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoldenWindSettings {
    pub gusts_start: f32,
    pub fast_gusts_start: f32,
    pub finale: f32,
    pub slow_interval: f32,
    pub fast_interval: f32,
    pub gust_impulse: f32,
    pub finale_impulse: f32,
    /// Offset along -Z of the pin placed on the upper body before it starts.
    pub pin_offset: f32,
}

impl Default for GoldenWindSettings {
    fn default() -> Self {
        Self {
            gusts_start: 12.0,
            fast_gusts_start: 27.0,
            finale: 41.0,
            slow_interval: 0.050,
            fast_interval: 0.025,
            gust_impulse: 10.0,
            finale_impulse: 100.0,
            pin_offset: 0.2,
        }
    }
}

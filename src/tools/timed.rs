//! Multi-step effects advanced once per tick.
//!
//! A [`TimedEffect`] never touches the world itself. [`TimedEffect::advance`]
//! returns the actions that became due, and the caller applies them. Dropping
//! or cancelling the effect stops it before its next action.

use nalgebra::Vector3;

use crate::settings::GoldenWindSettings;

/// Something a timed effect wants done to the dummy.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectAction {
    /// Impulse on every dummy part.
    ImpulseAll(Vector3<f32>),
    /// Impulse on one dummy part chosen by the caller at random.
    ImpulseRandomPart(Vector3<f32>),
    ImpulsePart { part: &'static str, impulse: Vector3<f32> },
    ClearPins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first action.
    Waiting,
    /// Emitting repeated gusts.
    Gusting,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    FusRoDah { delay: f32, impulse: Vector3<f32> },
    GoldenWind(GoldenWindSettings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    kind: Kind,
    direction: Vector3<f32>,
    phase: Phase,
    elapsed: f32,
    next_gust: f32,
}

impl TimedEffect {
    /// One push of `force` along `direction` after `delay` seconds.
    pub fn fus_ro_dah(direction: Vector3<f32>, force: f32, delay: f32) -> Self {
        Self {
            kind: Kind::FusRoDah {
                delay,
                impulse: direction * force,
            },
            direction,
            phase: Phase::Waiting,
            elapsed: 0.0,
            next_gust: 0.0,
        }
    }

    /// Gusts on random parts, slow then fast, then a final shove on the upper
    /// body once the pins are gone. `direction` is fixed at start.
    pub fn golden_wind(direction: Vector3<f32>, settings: &GoldenWindSettings) -> Self {
        Self {
            kind: Kind::GoldenWind(settings.clone()),
            direction,
            phase: Phase::Waiting,
            elapsed: 0.0,
            next_gust: settings.gusts_start,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Finished;
    }

    /// Advance by `dt` seconds and return the actions now due, in order.
    pub fn advance(&mut self, dt: f32) -> Vec<EffectAction> {
        let mut actions = Vec::new();
        if self.is_finished() {
            return actions;
        }
        self.elapsed += dt.max(0.0);

        match &self.kind {
            Kind::FusRoDah { delay, impulse } => {
                if self.elapsed >= *delay {
                    actions.push(EffectAction::ImpulseAll(*impulse));
                    self.phase = Phase::Finished;
                }
            }
            Kind::GoldenWind(timing) => {
                if self.phase == Phase::Waiting && self.elapsed >= timing.gusts_start {
                    self.phase = Phase::Gusting;
                }
                if self.phase == Phase::Gusting {
                    let gust = self.direction * timing.gust_impulse;
                    while self.next_gust < timing.finale && self.next_gust <= self.elapsed {
                        actions.push(EffectAction::ImpulseRandomPart(gust));
                        self.next_gust += if self.next_gust < timing.fast_gusts_start {
                            timing.slow_interval
                        } else {
                            timing.fast_interval
                        };
                    }
                    if self.elapsed >= timing.finale {
                        actions.push(EffectAction::ClearPins);
                        actions.push(EffectAction::ImpulsePart {
                            part: "upperBody",
                            impulse: self.direction * timing.finale_impulse,
                        });
                        self.phase = Phase::Finished;
                    }
                }
            }
        }
        actions
    }
}

//! The single active click context.

use core::fmt;

use serde::{Deserialize, Serialize};

/// What a click in the viewport does. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interaction {
    #[default]
    None,
    Pin,
    Drag,
    Punch,
    Projectile,
    Melee,
    Press,
    DrawAndQuarter,
    Guillotine,
    Freeze,
    Fire,
    FusRoDah,
    GoldenWind,
}

impl Interaction {
    pub const ALL: [Interaction; 13] = [
        Interaction::None,
        Interaction::Pin,
        Interaction::Drag,
        Interaction::Punch,
        Interaction::Projectile,
        Interaction::Melee,
        Interaction::Press,
        Interaction::DrawAndQuarter,
        Interaction::Guillotine,
        Interaction::Freeze,
        Interaction::Fire,
        Interaction::FusRoDah,
        Interaction::GoldenWind,
    ];

    /// Orbit controls stay on except while dragging the dummy.
    pub fn camera_controls_enabled(self) -> bool {
        self != Interaction::Drag
    }

    /// Contexts that spawn an entity or start an effect when entered and
    /// tear it down when left.
    pub fn owns_entity(self) -> bool {
        matches!(
            self,
            Interaction::Melee
                | Interaction::Press
                | Interaction::DrawAndQuarter
                | Interaction::Guillotine
                | Interaction::Freeze
                | Interaction::Fire
                | Interaction::FusRoDah
                | Interaction::GoldenWind
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Interaction::None => "none",
            Interaction::Pin => "pin",
            Interaction::Drag => "drag",
            Interaction::Punch => "punch",
            Interaction::Projectile => "projectile",
            Interaction::Melee => "melee",
            Interaction::Press => "press",
            Interaction::DrawAndQuarter => "drawAndQuarter",
            Interaction::Guillotine => "guillotine",
            Interaction::Freeze => "freeze",
            Interaction::Fire => "fire",
            Interaction::FusRoDah => "fusRoDah",
            Interaction::GoldenWind => "goldenWind",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_drag_disables_camera_controls() {
        for context in Interaction::ALL {
            assert_eq!(context.camera_controls_enabled(), context != Interaction::Drag, "{context}");
        }
    }

    #[test]
    fn test_click_only_contexts_own_nothing() {
        for context in [Interaction::None, Interaction::Pin, Interaction::Drag, Interaction::Punch, Interaction::Projectile] {
            assert!(!context.owns_entity(), "{context}");
        }
        assert!(Interaction::Press.owns_entity());
    }

    #[test]
    fn test_names_match_serde() {
        for context in Interaction::ALL {
            let json = serde_json::to_string(&context).unwrap();
            assert_eq!(json, format!("\"{}\"", context.name()));
        }
    }
}

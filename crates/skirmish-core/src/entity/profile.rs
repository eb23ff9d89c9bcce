//! Per-kind movement and reach profiles.
//!
//! A profile holds the two numbers the realtime scheduler needs for every
//! kind: how far an entity may wander in one tick and how close an attacker
//! of that kind has to get before a fight is queued.

use serde::{Deserialize, Serialize};

use super::EntityKind;

/// Movement and reach for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindProfile {
    /// Largest per-axis shift drawn each mover tick, in either direction.
    pub step: i32,
    /// Attack reach: a fight is queued when the squared separation is at most
    /// `kill_distance²`.
    pub kill_distance: u32,
}

impl KindProfile {
    /// Creates a profile.
    #[must_use]
    pub const fn new(step: i32, kill_distance: u32) -> Self {
        Self {
            step,
            kill_distance,
        }
    }
}

/// Profiles for every kind.
///
/// Defaults: Orks roam 20 and reach 10, Squirrels roam 5 and reach 5,
/// Druids roam 10 and reach 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindProfiles {
    /// Ork profile.
    pub ork: KindProfile,
    /// Squirrel profile.
    pub squirrel: KindProfile,
    /// Druid profile.
    pub druid: KindProfile,
}

impl KindProfiles {
    /// Returns the profile for `kind`.
    #[must_use]
    pub const fn get(&self, kind: EntityKind) -> KindProfile {
        match kind {
            EntityKind::Ork => self.ork,
            EntityKind::Squirrel => self.squirrel,
            EntityKind::Druid => self.druid,
        }
    }
}

impl Default for KindProfiles {
    fn default() -> Self {
        Self {
            ork: KindProfile::new(20, 10),
            squirrel: KindProfile::new(5, 5),
            druid: KindProfile::new(10, 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_kind_table() {
        let profiles = KindProfiles::default();
        assert_eq!(profiles.get(EntityKind::Ork), KindProfile::new(20, 10));
        assert_eq!(profiles.get(EntityKind::Squirrel), KindProfile::new(5, 5));
        assert_eq!(profiles.get(EntityKind::Druid), KindProfile::new(10, 10));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let profiles: KindProfiles =
            serde_json::from_str(r#"{"ork": {"step": 3, "kill_distance": 4}}"#).unwrap();
        assert_eq!(profiles.ork, KindProfile::new(3, 4));
        assert_eq!(profiles.druid, KindProfile::new(10, 10));
    }
}

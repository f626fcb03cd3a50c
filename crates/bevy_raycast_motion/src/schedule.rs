//! Schedule labels for raycast motion systems.
//!
//! All motion systems run in [`FixedUpdate`] within one of the three
//! [`MotionSet`] phases. Gameplay code writes [`CharacterIntent`] before
//! [`MotionSet::Platforms`] and reads the results after
//! [`MotionSet::Writeback`].
//!
//! [`CharacterIntent`]: crate::plugin::CharacterIntent

use bevy::prelude::*;

/// System sets for one fixed motion step.
///
/// The phases are chained in order:
///
/// ```text
/// Platforms → Characters → Writeback
/// ```
///
/// Platforms move first so a character standing on one has already been
/// carried when its own intent is resolved.
///
/// # Usage
///
/// ```ignore
/// app.add_systems(FixedUpdate, apply_gravity.before(MotionSet::Platforms));
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MotionSet {
  /// Waypoint paths, passenger pushes and carries.
  Platforms,
  /// Character registration and intent resolution.
  Characters,
  /// Body centers and collision flags copied back to entities.
  Writeback,
}

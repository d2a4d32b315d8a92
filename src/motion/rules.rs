// PixelPal — Interaction Priority Rules
//
// The one-shot interaction the orchestrator reacts to is resolved from the
// flag set by a single ordered rule list instead of being baked into control
// flow. Exactly one interaction is actionable per tick.

use super::flags::{MotionFlags, MotionKind};

/// A one-shot interaction the orchestrator answers with a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Shake,
    DoubleTap,
    Tap,
    SuddenAcceleration,
    /// Half tilt without a full tilt/flip — treated as a "shock" nudge.
    HalfTiltShock,
}

/// Priority-ordered rules, evaluated top to bottom.
const RULES: &[(Interaction, fn(&MotionFlags) -> bool)] = &[
    (Interaction::Shake, |f| f.get(MotionKind::Shaking)),
    (Interaction::DoubleTap, |f| f.get(MotionKind::DoubleTapped)),
    (Interaction::Tap, |f| f.get(MotionKind::Tapped)),
    (Interaction::SuddenAcceleration, |f| {
        f.get(MotionKind::SuddenAcceleration)
    }),
    (Interaction::HalfTiltShock, |f| {
        (f.get(MotionKind::HalfTiltedLeft) || f.get(MotionKind::HalfTiltedRight))
            && !f.fully_oriented()
    }),
];

/// Resolve the highest-priority interaction currently flagged, if any.
pub fn interaction_for(flags: &MotionFlags) -> Option<Interaction> {
    RULES
        .iter()
        .find(|(_, applies)| applies(flags))
        .map(|(interaction, _)| *interaction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_outranks_everything() {
        let mut flags = MotionFlags::new();
        flags.set(MotionKind::Shaking, true);
        flags.set(MotionKind::DoubleTapped, true);
        flags.set(MotionKind::Tapped, true);
        flags.set(MotionKind::SuddenAcceleration, true);
        assert_eq!(interaction_for(&flags), Some(Interaction::Shake));
    }

    #[test]
    fn double_tap_outranks_tap() {
        let mut flags = MotionFlags::new();
        flags.set(MotionKind::Tapped, true);
        flags.set(MotionKind::DoubleTapped, true);
        assert_eq!(interaction_for(&flags), Some(Interaction::DoubleTap));
    }

    #[test]
    fn half_tilt_is_shock_only_without_full_tilt() {
        let mut flags = MotionFlags::new();
        flags.set(MotionKind::HalfTiltedLeft, true);
        assert_eq!(interaction_for(&flags), Some(Interaction::HalfTiltShock));

        flags.set(MotionKind::UpsideDown, true);
        assert_eq!(interaction_for(&flags), None);
    }

    #[test]
    fn empty_flags_resolve_to_none() {
        assert_eq!(interaction_for(&MotionFlags::new()), None);
    }
}

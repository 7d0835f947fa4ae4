//! Scroll behaviour driven by transcript changes.

use crate::turn::Turn;

/// How the view should move to the newest turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump without animation.
    Instant,
    Smooth,
}

/// Snap instantly when the typing placeholder appears or while the
/// transcript is still at its opening (≤ 2 turns); otherwise scroll
/// smoothly.
pub fn scroll_behavior_for(transcript: &[Turn]) -> ScrollBehavior {
    let last_is_pending = transcript.last().is_some_and(Turn::is_pending);
    if last_is_pending || transcript.len() <= 2 {
        ScrollBehavior::Instant
    } else {
        ScrollBehavior::Smooth
    }
}

/// Distance from the bottom, in pixels, within which the view counts as
/// following the conversation.
pub const NEAR_BOTTOM_PX: f64 = 100.0;

/// Scroll geometry reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub fn distance_to_bottom(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }

    pub fn is_near_bottom(&self) -> bool {
        self.distance_to_bottom() < NEAR_BOTTOM_PX
    }

    /// Whether to offer a "jump to latest" button.
    pub fn show_jump_to_latest(&self) -> bool {
        !self.is_near_bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::TurnRole;

    fn turns(roles: &[TurnRole]) -> Vec<Turn> {
        roles
            .iter()
            .enumerate()
            .map(|(i, r)| Turn::new(format!("t{i}"), *r, "x"))
            .collect()
    }

    #[test]
    fn opening_transcript_snaps() {
        let t = turns(&[TurnRole::Assistant, TurnRole::User]);
        assert_eq!(scroll_behavior_for(&t), ScrollBehavior::Instant);
        assert_eq!(scroll_behavior_for(&[]), ScrollBehavior::Instant);
    }

    #[test]
    fn pending_snaps_even_late() {
        let t = turns(&[
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Pending,
        ]);
        assert_eq!(scroll_behavior_for(&t), ScrollBehavior::Instant);
    }

    #[test]
    fn steady_state_reply_is_smooth() {
        let t = turns(&[TurnRole::Assistant, TurnRole::User, TurnRole::Assistant]);
        assert_eq!(scroll_behavior_for(&t), ScrollBehavior::Smooth);
    }

    #[test]
    fn jump_button_threshold() {
        let at_bottom = Viewport {
            scroll_top: 950.0,
            scroll_height: 1500.0,
            client_height: 500.0,
        };
        assert!(at_bottom.is_near_bottom());
        assert!(!at_bottom.show_jump_to_latest());

        let scrolled_up = Viewport {
            scroll_top: 900.0,
            ..at_bottom
        };
        assert_eq!(scrolled_up.distance_to_bottom(), 100.0);
        assert!(scrolled_up.show_jump_to_latest());
    }
}

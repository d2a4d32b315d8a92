// PixelPal — Conversation Script
//
// Both devices carry the same ordered script and the same type-to-clip
// table, so a conversation type on the wire is enough to drive playback on
// either side.

use crate::animation::emotes;

/// Wire discriminants are fixed; both firmwares must agree on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ConversationType {
    Hello = 0,
    Question01 = 1,
    Question02 = 2,
    Question03 = 3,
    Agree = 4,
    Disagree = 5,
    Yell = 6,
    Laugh = 7,
    Wink = 8,
    Zone = 9,
    Shock = 10,
}

impl ConversationType {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Hello,
            1 => Self::Question01,
            2 => Self::Question02,
            3 => Self::Question03,
            4 => Self::Agree,
            5 => Self::Disagree,
            6 => Self::Yell,
            7 => Self::Laugh,
            8 => Self::Wink,
            9 => Self::Zone,
            10 => Self::Shock,
            _ => return None,
        })
    }
}

/// Round-robin order the active sender walks through.
pub const CONVERSATION_ORDER: [ConversationType; 11] = [
    ConversationType::Hello,
    ConversationType::Question01,
    ConversationType::Agree,
    ConversationType::Question02,
    ConversationType::Disagree,
    ConversationType::Yell,
    ConversationType::Question03,
    ConversationType::Laugh,
    ConversationType::Wink,
    ConversationType::Zone,
    ConversationType::Shock,
];

/// Clip shown while a message of this type is being processed.
pub fn clip_for(kind: ConversationType) -> &'static str {
    match kind {
        ConversationType::Hello => emotes::COMS_HELLO,
        ConversationType::Question01 => emotes::COMS_TALK_01,
        ConversationType::Question02 => emotes::COMS_TALK_02,
        ConversationType::Question03 => emotes::COMS_TALK_03,
        ConversationType::Agree => emotes::COMS_AGREE,
        ConversationType::Disagree => emotes::COMS_DISAGREE,
        ConversationType::Yell => emotes::COMS_YELL,
        ConversationType::Laugh => emotes::COMS_LAUGH,
        ConversationType::Wink => emotes::COMS_WINK,
        ConversationType::Zone => emotes::COMS_ZONED,
        ConversationType::Shock => emotes::COMS_SHOCK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_round_trip() {
        for kind in CONVERSATION_ORDER {
            assert_eq!(ConversationType::from_i32(kind as i32), Some(kind));
        }
        assert_eq!(ConversationType::from_i32(11), None);
        assert_eq!(ConversationType::from_i32(-1), None);
    }

    #[test]
    fn every_type_has_a_clip() {
        for kind in CONVERSATION_ORDER {
            assert!(clip_for(kind).starts_with("/gifs/"));
        }
    }
}

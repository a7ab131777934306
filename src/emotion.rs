use crate::types::Emotion;

// First match wins; buckets are checked in this order.
const LOVING: &[&str] = &[
    "love",
    "miss you",
    "dear",
    "sweetheart",
    "proud of you",
    "hold you",
];

const REFLECTIVE: &[&str] = &[
    "remember",
    "memory",
    "memories",
    "back then",
    "those days",
    "used to",
    "when you were",
];

const WISE: &[&str] = &[
    "advice",
    "lesson",
    "learned",
    "what matters",
    "important thing",
    "believe in",
];

const COMFORTING: &[&str] = &[
    "it's okay",
    "i'm here",
    "don't worry",
    "sorry",
    "difficult",
    "hard time",
    "be gentle with yourself",
];

/// Classify the emotional register of a message for styling purposes.
///
/// Total and deterministic: lowercased substring search over fixed keyword
/// buckets with priority loving > reflective > wise > comforting, falling
/// back to warm. Purely cosmetic; nothing branches on the result.
pub fn detect_message_emotion(text: &str) -> Emotion {
    let lowered = text.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));

    if contains_any(LOVING) {
        Emotion::Loving
    } else if contains_any(REFLECTIVE) {
        Emotion::Reflective
    } else if contains_any(WISE) {
        Emotion::Wise
    } else if contains_any(COMFORTING) {
        Emotion::Comforting
    } else {
        Emotion::Warm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loving_outranks_reflective() {
        // "love" and "remember" both match; loving wins on priority.
        assert_eq!(
            detect_message_emotion("I love and remember you"),
            Emotion::Loving
        );
    }

    #[test]
    fn defaults_to_warm() {
        assert_eq!(detect_message_emotion("just checking in"), Emotion::Warm);
        assert_eq!(detect_message_emotion(""), Emotion::Warm);
    }

    #[test]
    fn matches_are_case_insensitive() {
        assert_eq!(
            detect_message_emotion("REMEMBER the lake house?"),
            Emotion::Reflective
        );
        assert_eq!(
            detect_message_emotion("The most important thing I learned..."),
            Emotion::Wise
        );
        assert_eq!(
            detect_message_emotion("I'm here, don't worry."),
            Emotion::Comforting
        );
    }
}

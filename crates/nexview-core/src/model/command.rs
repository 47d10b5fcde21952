// ── Remote commands ──
//
// Verbs the server understands for media transport control. The verb is
// the frame's event name; the target player id is its single argument.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Media transport control sent to a player on the monitored host.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum MediaCommand {
    #[strum(to_string = "audio-previous", serialize = "previous", serialize = "prev")]
    #[serde(rename = "audio-previous")]
    Previous,
    #[strum(to_string = "audio-play-pause", serialize = "play-pause", serialize = "toggle")]
    #[serde(rename = "audio-play-pause")]
    PlayPause,
    #[strum(to_string = "audio-next", serialize = "next")]
    #[serde(rename = "audio-next")]
    Next,
}

impl MediaCommand {
    /// The wire verb, e.g. `"audio-play-pause"`.
    pub fn verb(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_verbs() {
        assert_eq!(MediaCommand::Previous.verb(), "audio-previous");
        assert_eq!(MediaCommand::PlayPause.verb(), "audio-play-pause");
        assert_eq!(MediaCommand::Next.as_ref(), "audio-next");
        assert_eq!(MediaCommand::Next.to_string(), "audio-next");
    }

    #[test]
    fn parses_short_and_wire_names() {
        assert_eq!("toggle".parse::<MediaCommand>().unwrap(), MediaCommand::PlayPause);
        assert_eq!("audio-next".parse::<MediaCommand>().unwrap(), MediaCommand::Next);
        assert_eq!("prev".parse::<MediaCommand>().unwrap(), MediaCommand::Previous);
        assert!("rewind".parse::<MediaCommand>().is_err());
    }

    #[test]
    fn verbs_are_unique() {
        let verbs: Vec<&str> = MediaCommand::iter().map(MediaCommand::verb).collect();
        assert_eq!(verbs, ["audio-previous", "audio-play-pause", "audio-next"]);
    }
}

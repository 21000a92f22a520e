use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active top-level feature view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free-form conversation with the assistant.
    #[default]
    Chat,
    /// Upload a file and ask the assistant about it.
    File,
    /// Conversation scoped to web content.
    Web,
    /// AEM workspace: pages, compliance, assets, tags, workflows, versions.
    Aem,
}

impl Mode {
    /// All modes in selector order.
    pub const ALL: [Mode; 4] = [Mode::Chat, Mode::File, Mode::Web, Mode::Aem];

    /// Human-readable label for the mode selector.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Chat => "Chat",
            Mode::File => "File Analysis",
            Mode::Web => "Web Search",
            Mode::Aem => "AEM Workspace",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Chat => write!(f, "chat"),
            Mode::File => write!(f, "file"),
            Mode::Web => write!(f, "web"),
            Mode::Aem => write!(f, "aem"),
        }
    }
}

/// Error returned when parsing an invalid mode string.
#[derive(Debug)]
pub struct ModeParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for ModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown mode: {}", self.invalid_value)
    }
}

impl std::error::Error for ModeParseError {}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Mode::Chat),
            "file" => Ok(Mode::File),
            "web" => Ok(Mode::Web),
            "aem" => Ok(Mode::Aem),
            _ => Err(ModeParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let json = serde_json::to_string(&Mode::Aem).unwrap();
        assert_eq!(json, r#""aem""#);
        let mode: Mode = serde_json::from_str(r#""web""#).unwrap();
        assert_eq!(mode, Mode::Web);
    }

    #[test]
    fn parse() {
        assert_eq!("chat".parse::<Mode>().unwrap(), Mode::Chat);
        assert_eq!(" AEM ".parse::<Mode>().unwrap(), Mode::Aem);
        let err = "desktop".parse::<Mode>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown mode: desktop");
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn default_is_chat() {
        assert_eq!(Mode::default(), Mode::Chat);
    }
}

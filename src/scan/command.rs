use serde::Deserialize;

/// Control message received from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlCommand {
    Start,
    Stop,
    /// Any other action; ignored
    #[serde(other)]
    Unknown,
}

impl ControlCommand {
    /// Parse a text frame. Malformed JSON is an error for the caller to drop.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ControlCommand::parse(r#"{"action":"start"}"#).unwrap(), ControlCommand::Start);
        assert_eq!(ControlCommand::parse(r#"{"action":"stop"}"#).unwrap(), ControlCommand::Stop);
        assert_eq!(
            ControlCommand::parse(r#"{"action":"pause","extra":1}"#).unwrap(),
            ControlCommand::Unknown
        );
    }

    #[test]
    fn test_malformed_commands() {
        assert!(ControlCommand::parse("start").is_err());
        assert!(ControlCommand::parse("{\"action\":").is_err());
        assert!(ControlCommand::parse("{}").is_err());
    }
}

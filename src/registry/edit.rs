use crate::config::RegistryConfig;
use crate::core::{PlayerOrientation, Result, TeleportDirection, WaystoneColor, WaystoneError};

/// Properties accepted by `WaystoneEdit::parse`, in display form.
pub const EDITABLE_PROPERTIES: &[&str] = &[
    "name",
    "isPublic",
    "priority",
    "textColor",
    "teleportDirection",
    "playerOrientation",
    "serverOwned",
    "ownerName",
    "ownerUuid",
    "defaultDiscovered",
    "color",
];

/// Config properties accepted by `ConfigEdit::parse`.
pub const CONFIG_PROPERTIES: &[&str] = &["debugLogs", "requireDiscover"];

/// A single typed change to a waystone.
#[derive(Debug, Clone, PartialEq)]
pub enum WaystoneEdit {
    Name(String),
    Public(bool),
    Priority(i32),
    TextColor(String),
    TeleportDirection(TeleportDirection),
    PlayerOrientation(PlayerOrientation),
    ServerOwned(bool),
    OwnerName(String),
    OwnerId(String),
    DefaultDiscovered(bool),
    Color(WaystoneColor),
}

impl WaystoneEdit {
    /// Parses a `(property, value)` pair as typed at a command line.
    pub fn parse(property: &str, value: &str) -> Result<Self> {
        let key = property.trim().to_ascii_lowercase();
        let value = strip_quotes(value.trim());

        match key.as_str() {
            "name" => Ok(Self::Name(value.to_string())),
            "ispublic" | "public" => parse_bool("isPublic", value).map(Self::Public),
            "priority" => value
                .parse()
                .map(Self::Priority)
                .map_err(|_| WaystoneError::invalid_value("priority", value)),
            "textcolor" => Ok(Self::TextColor(value.to_string())),
            "teleportdirection" | "direction" => value.parse().map(Self::TeleportDirection),
            "playerorientation" | "orientation" => value.parse().map(Self::PlayerOrientation),
            "serverowned" => parse_bool("serverOwned", value).map(Self::ServerOwned),
            "ownername" => Ok(Self::OwnerName(value.to_string())),
            "owneruuid" => Ok(Self::OwnerId(value.to_string())),
            "defaultdiscovered" => parse_bool("defaultDiscovered", value).map(Self::DefaultDiscovered),
            "color" => value.parse().map(Self::Color),
            "editors" | "viewers" => Err(WaystoneError::UnsupportedProperty(key)),
            "world" | "worldname" => Err(WaystoneError::ImmutableProperty("world".into())),
            "x" | "y" | "z" | "yaw" => Err(WaystoneError::ImmutableProperty("position".into())),
            "id" | "createdat" => Err(WaystoneError::ImmutableProperty(key)),
            _ => Err(WaystoneError::UnknownProperty(format!(
                "{} (available: {})",
                property.trim(),
                EDITABLE_PROPERTIES.join(", ")
            ))),
        }
    }

    /// Display name of the edited property.
    pub fn property(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Public(_) => "isPublic",
            Self::Priority(_) => "priority",
            Self::TextColor(_) => "textColor",
            Self::TeleportDirection(_) => "teleportDirection",
            Self::PlayerOrientation(_) => "playerOrientation",
            Self::ServerOwned(_) => "serverOwned",
            Self::OwnerName(_) => "ownerName",
            Self::OwnerId(_) => "ownerUuid",
            Self::DefaultDiscovered(_) => "defaultDiscovered",
            Self::Color(_) => "color",
        }
    }

    /// Changes that can detach a waystone from its real owner.
    /// Applies the configured name rules to a `Name` edit; other edits pass through.
    pub fn validated(self, config: &RegistryConfig) -> Result<Self> {
        match self {
            WaystoneEdit::Name(name) => Ok(WaystoneEdit::Name(config.validate_name(&name)?)),
            other => Ok(other),
        }
    }

    pub fn is_risky(&self) -> bool {
        matches!(self, Self::OwnerName(_) | Self::OwnerId(_))
    }

    /// Fields only an editor-of-all may change, even on owned waystones.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::Priority(_) | Self::ServerOwned(_) | Self::OwnerName(_) | Self::OwnerId(_) | Self::DefaultDiscovered(_)
        )
    }
}

/// A change to the persisted runtime switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEdit {
    DebugLogs(bool),
    RequireDiscover(bool),
}

impl ConfigEdit {
    pub fn parse(property: &str, value: &str) -> Result<Self> {
        let value = strip_quotes(value.trim());
        match property.trim().to_ascii_lowercase().as_str() {
            "debuglogs" => parse_bool("debugLogs", value).map(Self::DebugLogs),
            "requirediscover" => parse_bool("requireDiscover", value).map(Self::RequireDiscover),
            _ => Err(WaystoneError::UnknownProperty(format!(
                "{} (available: {})",
                property.trim(),
                CONFIG_PROPERTIES.join(", ")
            ))),
        }
    }
}

fn parse_bool(property: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(WaystoneError::invalid_value(property, value)),
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!(WaystoneEdit::parse("Public", "TRUE").unwrap(), WaystoneEdit::Public(true));
        assert_eq!(
            WaystoneEdit::parse("direction", "west").unwrap(),
            WaystoneEdit::TeleportDirection(TeleportDirection::West)
        );
        assert_eq!(
            WaystoneEdit::parse("orientation", "Towards").unwrap(),
            WaystoneEdit::PlayerOrientation(PlayerOrientation::Towards)
        );
        assert_eq!(WaystoneEdit::parse("priority", "-4").unwrap(), WaystoneEdit::Priority(-4));
        assert_eq!(
            WaystoneEdit::parse("name", "\"Market Square\"").unwrap(),
            WaystoneEdit::Name("Market Square".into())
        );
    }

    #[test]
    fn test_rejected_properties() {
        assert!(matches!(
            WaystoneEdit::parse("editors", "p-2"),
            Err(WaystoneError::UnsupportedProperty(_))
        ));
        assert!(matches!(
            WaystoneEdit::parse("worldname", "nether"),
            Err(WaystoneError::ImmutableProperty(_))
        ));
        assert!(matches!(WaystoneEdit::parse("y", "70"), Err(WaystoneError::ImmutableProperty(_))));
        assert!(matches!(
            WaystoneEdit::parse("createdAt", "now"),
            Err(WaystoneError::ImmutableProperty(_))
        ));
        match WaystoneEdit::parse("flavour", "mint") {
            Err(WaystoneError::UnknownProperty(msg)) => assert!(msg.contains("defaultDiscovered")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            WaystoneEdit::parse("priority", "high"),
            Err(WaystoneError::InvalidValue { .. })
        ));
        assert!(matches!(
            WaystoneEdit::parse("serverowned", "yes"),
            Err(WaystoneError::InvalidValue { .. })
        ));
        assert!(matches!(
            WaystoneEdit::parse("color", "blue"),
            Err(WaystoneError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_risk_flags() {
        assert!(WaystoneEdit::OwnerId("p-9".into()).is_risky());
        assert!(!WaystoneEdit::Name("x".into()).is_risky());
        assert!(WaystoneEdit::Priority(1).requires_admin());
        assert!(!WaystoneEdit::Color(WaystoneColor::Red).requires_admin());
    }

    #[test]
    fn test_validated_applies_name_rules() {
        let config = RegistryConfig::in_memory();
        let blank = WaystoneEdit::parse("name", "\"   \"").unwrap();
        assert_eq!(blank.validated(&config).unwrap(), WaystoneEdit::Name("Waystone".into()));

        let long = WaystoneEdit::parse("name", &"x".repeat(500)).unwrap();
        assert_eq!(
            long.validated(&config),
            Err(WaystoneError::NameTooLong { len: 500, max: 100 })
        );

        let priority = WaystoneEdit::Priority(3);
        assert_eq!(priority.validated(&config).unwrap(), WaystoneEdit::Priority(3));
    }

    #[test]
    fn test_config_edit() {
        assert_eq!(ConfigEdit::parse("requireDiscover", "true").unwrap(), ConfigEdit::RequireDiscover(true));
        assert_eq!(ConfigEdit::parse("DEBUGLOGS", "'false'").unwrap(), ConfigEdit::DebugLogs(false));
        assert!(ConfigEdit::parse("verbose", "true").is_err());
    }
}

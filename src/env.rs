/// Build environment the alias table is assembled for.
///
/// Parsed once from a mode tag (`NODE_ENV` in the CLI) when configuration is
/// built, never re-read per resolution. Unrecognized tags keep their text so
/// diagnostics can show what was actually set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    /// Parse a mode tag. An empty tag means development.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" | "local" | "" => Self::Development,
            _ => Self::Other(tag.trim().to_string()),
        }
    }

    /// Whether linked-package (contextual) aliasing is active.
    ///
    /// Production builds never see linked-package rewrites; every other
    /// environment does, including unrecognized tags like "staging".
    pub fn linked_packages_enabled(&self) -> bool {
        !matches!(self, Self::Production)
    }

    /// Human-facing tag for diagnostics.
    pub fn tag(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Other(tag) => tag,
        }
    }
}

/// Whether static aliases survive environment filtering.
///
/// Two behaviors exist in the wild: keep static aliases everywhere, or drop
/// the whole alias table outside of development the way linked-package rules
/// are dropped. The choice is an explicit flag rather than an inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaticAliasPolicy {
    /// Static aliases are active in every environment, production included.
    #[default]
    Always,
    /// Static aliases follow the same gate as linked-package rules: active
    /// everywhere except production.
    FollowEnvironment,
}

impl StaticAliasPolicy {
    /// Parse the `staticAliases` configuration value.
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value {
            "always" => Some(Self::Always),
            "follow-environment" => Some(Self::FollowEnvironment),
            _ => None,
        }
    }

    /// Whether static rules stay in the table for this environment.
    pub fn keeps_static(self, env: &Environment) -> bool {
        match self {
            Self::Always => true,
            Self::FollowEnvironment => env.linked_packages_enabled(),
        }
    }

    /// Configuration-file spelling, for diagnostics.
    pub fn config_value(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::FollowEnvironment => "follow-environment",
        }
    }
}

//! Visual themes.
//!
//! One renderer serves every look; a variant only changes branding text and
//! the accent colour.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ThemeConfig;

/// Built-in theme variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeVariant {
    /// Plain yellow school-bus look.
    Classic,
    /// The "PRO" branded look.
    #[default]
    Pro,
    /// Soft colours for younger pupils.
    Pastel,
    /// Dark look for early morning runs.
    Night,
}

impl std::fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Pro => write!(f, "pro"),
            Self::Pastel => write!(f, "pastel"),
            Self::Night => write!(f, "night"),
        }
    }
}

/// Resolved theme used by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Which variant this theme came from.
    pub variant: ThemeVariant,
    /// Brand title shown on the splash screen.
    pub title: String,
    /// Line under the title.
    pub tagline: String,
    /// Accent colour as `#RRGGBB`.
    pub accent: String,
}

impl Theme {
    /// Build the theme for a variant with its default accent.
    #[must_use]
    pub fn for_variant(variant: ThemeVariant) -> Self {
        let (title, accent) = match variant {
            ThemeVariant::Classic => ("BusBuddy", "#FFD600"),
            ThemeVariant::Pro => ("BusBuddy PRO", "#FBC02D"),
            ThemeVariant::Pastel => ("BusBuddy", "#F8BBD0"),
            ThemeVariant::Night => ("BusBuddy", "#546E7A"),
        };
        Self {
            variant,
            title: title.to_string(),
            tagline: "Smart School Transportation".to_string(),
            accent: accent.to_string(),
        }
    }

    /// Build the theme described by the configuration.
    #[must_use]
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::for_variant(config.variant);
        if let Some(accent) = &config.accent {
            theme.accent.clone_from(accent);
        }
        theme
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_variant(ThemeVariant::default())
    }
}

/// `#RRGGBB`, either case.
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex colour pattern"));

/// Check that `value` is a `#RRGGBB` colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_display() {
        assert_eq!(ThemeVariant::Classic.to_string(), "classic");
        assert_eq!(ThemeVariant::Night.to_string(), "night");
    }

    #[test]
    fn test_every_variant_has_valid_accent() {
        for variant in [
            ThemeVariant::Classic,
            ThemeVariant::Pro,
            ThemeVariant::Pastel,
            ThemeVariant::Night,
        ] {
            let theme = Theme::for_variant(variant);
            assert!(is_hex_color(&theme.accent), "{variant}: {}", theme.accent);
        }
    }

    #[test]
    fn test_pro_title() {
        assert_eq!(Theme::default().title, "BusBuddy PRO");
    }

    #[test]
    fn test_accent_override() {
        let config = ThemeConfig {
            variant: ThemeVariant::Classic,
            accent: Some("#123456".to_string()),
        };
        let theme = Theme::from_config(&config);
        assert_eq!(theme.variant, ThemeVariant::Classic);
        assert_eq!(theme.accent, "#123456");
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#abcdef"));
        assert!(is_hex_color("#ABCDEF"));
        assert!(!is_hex_color("abcdef"));
        assert!(!is_hex_color("#abcde"));
        assert!(!is_hex_color("#ghijkl"));
        assert!(!is_hex_color("#abcdef0"));
        assert!(!is_hex_color(" #abcdef"));
    }

    #[test]
    fn test_variant_deserialize() {
        let variant: ThemeVariant = serde_json::from_str("\"pastel\"").unwrap();
        assert_eq!(variant, ThemeVariant::Pastel);
    }
}

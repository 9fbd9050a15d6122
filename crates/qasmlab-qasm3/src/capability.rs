//! Which compilation routes a build provides.

use serde::{Deserialize, Serialize};

/// Optional collaborators available to the compiler.
///
/// Computed once at startup and passed to the compiler as configuration.
/// Configuration can switch a route off but never on: see
/// [`Capabilities::restrict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Full-grammar parse, validation and direct lowering.
    pub full_parser: bool,
    /// `OpenQASM` 2.0 fallback.
    pub legacy_loader: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

impl Capabilities {
    /// Routes compiled into this build.
    pub fn detect() -> Self {
        Self {
            full_parser: cfg!(feature = "full-parser"),
            legacy_loader: cfg!(feature = "legacy"),
        }
    }

    /// Only the structural route.
    pub fn structural_only() -> Self {
        Self {
            full_parser: false,
            legacy_loader: false,
        }
    }

    /// Keep only the routes enabled in both sets.
    #[must_use]
    pub fn restrict(self, other: Capabilities) -> Self {
        Self {
            full_parser: self.full_parser && other.full_parser,
            legacy_loader: self.legacy_loader && other.legacy_loader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_follows_features() {
        let caps = Capabilities::detect();
        assert_eq!(caps.full_parser, cfg!(feature = "full-parser"));
        assert_eq!(caps.legacy_loader, cfg!(feature = "legacy"));
    }

    #[test]
    fn test_restrict_only_narrows() {
        let all = Capabilities {
            full_parser: true,
            legacy_loader: true,
        };
        let none = Capabilities::structural_only();
        assert_eq!(all.restrict(none), none);
        assert_eq!(none.restrict(all), none);

        let no_legacy = Capabilities {
            full_parser: true,
            legacy_loader: false,
        };
        assert_eq!(all.restrict(no_legacy), no_legacy);
    }
}

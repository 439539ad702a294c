//! Ad format catalog and dimension resolution.
//!
//! The catalog is a fixed table of six display formats. Slots name a format
//! (and optionally a narrower one for mobile viewports) and the resolver turns
//! that request into a concrete pixel size.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdsError, Result};

/// Viewport width (px) below which the mobile format is used.
pub const DEFAULT_MOBILE_BREAKPOINT: u32 = 768;

/// Named ad format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdFormatKind {
    /// 300x250 medium rectangle.
    Rectangle,
    /// 728x90 leaderboard.
    Leaderboard,
    /// 160x600 wide skyscraper.
    Skyscraper,
    /// 320x100 large mobile banner.
    LargeMobile,
    /// 320x50 mobile banner.
    MobileBanner,
    /// 970x250 billboard.
    Billboard,
}

impl AdFormatKind {
    /// Every format, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Rectangle,
        Self::Leaderboard,
        Self::Skyscraper,
        Self::LargeMobile,
        Self::MobileBanner,
        Self::Billboard,
    ];

    /// Catalog key as used in configuration and page markup.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Leaderboard => "leaderboard",
            Self::Skyscraper => "skyscraper",
            Self::LargeMobile => "large_mobile",
            Self::MobileBanner => "mobile_banner",
            Self::Billboard => "billboard",
        }
    }

    /// Catalog entry for this format.
    #[must_use]
    pub fn format(self) -> &'static AdFormat {
        &AD_FORMATS[self as usize]
    }

    /// Pixel size of this format.
    #[must_use]
    pub fn dimensions(self) -> ResolvedDimensions {
        let format = self.format();
        ResolvedDimensions {
            width: format.width,
            height: format.height,
        }
    }
}

impl fmt::Display for AdFormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AdFormatKind {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| AdsError::UnknownFormatKind(s.to_string()))
    }
}

/// Static catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdFormat {
    /// Format key.
    pub kind: AdFormatKind,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Human-readable name.
    pub display_name: &'static str,
}

/// The format catalog, indexed by `AdFormatKind as usize`.
pub static AD_FORMATS: [AdFormat; 6] = [
    AdFormat {
        kind: AdFormatKind::Rectangle,
        width: 300,
        height: 250,
        display_name: "Medium Rectangle",
    },
    AdFormat {
        kind: AdFormatKind::Leaderboard,
        width: 728,
        height: 90,
        display_name: "Leaderboard",
    },
    AdFormat {
        kind: AdFormatKind::Skyscraper,
        width: 160,
        height: 600,
        display_name: "Wide Skyscraper",
    },
    AdFormat {
        kind: AdFormatKind::LargeMobile,
        width: 320,
        height: 100,
        display_name: "Large Mobile Banner",
    },
    AdFormat {
        kind: AdFormatKind::MobileBanner,
        width: 320,
        height: 50,
        display_name: "Mobile Banner",
    },
    AdFormat {
        kind: AdFormatKind::Billboard,
        width: 970,
        height: 250,
        display_name: "Billboard",
    },
];

/// Concrete slot size for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl fmt::Display for ResolvedDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Viewport width paired with the breakpoint that splits desktop from mobile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    breakpoint: u32,
}

impl Viewport {
    /// Viewport of the given width using the default breakpoint.
    #[must_use]
    pub const fn new(width: u32) -> Self {
        Self {
            width,
            breakpoint: DEFAULT_MOBILE_BREAKPOINT,
        }
    }

    /// Override the mobile breakpoint.
    #[must_use]
    pub const fn with_breakpoint(mut self, breakpoint: u32) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    /// Viewport width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// True when the viewport is in the mobile class.
    #[must_use]
    pub const fn is_narrow(&self) -> bool {
        self.width < self.breakpoint
    }
}

/// Resolve a slot's dimensions from raw format keys.
///
/// Both keys are validated even when only one is selected, so a typo in a
/// mobile override fails on desktop too.
///
/// # Errors
///
/// Returns [`AdsError::UnknownFormatKind`] if either key is not in the catalog.
pub fn resolve(
    format_key: &str,
    mobile_format_key: Option<&str>,
    is_narrow_viewport: bool,
) -> Result<ResolvedDimensions> {
    let format = format_key.parse::<AdFormatKind>()?;
    let mobile = mobile_format_key
        .map(str::parse::<AdFormatKind>)
        .transpose()?;
    Ok(resolve_kind(format, mobile, is_narrow_viewport))
}

/// Resolve a slot's dimensions from typed format kinds.
#[must_use]
pub fn resolve_kind(
    format: AdFormatKind,
    mobile_format: Option<AdFormatKind>,
    is_narrow_viewport: bool,
) -> ResolvedDimensions {
    match mobile_format {
        Some(mobile) if is_narrow_viewport => mobile.dimensions(),
        _ => format.dimensions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_catalog_indexed_by_kind() {
        for kind in AdFormatKind::ALL {
            assert_eq!(kind.format().kind, kind);
            assert!(kind.format().width > 0);
            assert!(kind.format().height > 0);
        }
    }

    #[test]
    fn test_keys_unique_and_parse_back() {
        let mut keys: Vec<_> = AdFormatKind::ALL.iter().map(|k| k.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), AdFormatKind::ALL.len());

        for kind in AdFormatKind::ALL {
            assert_eq!(kind.key().parse::<AdFormatKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_resolve_each_entry_on_desktop() {
        for entry in AD_FORMATS {
            let dims = resolve(entry.kind.key(), None, false).unwrap();
            assert_eq!((dims.width, dims.height), (entry.width, entry.height));
        }
    }

    #[test]
    fn test_resolve_known_sizes() {
        let dims = resolve("rectangle", Some("mobile_banner"), false).unwrap();
        assert_eq!(dims, ResolvedDimensions { width: 300, height: 250 });

        let dims = resolve("leaderboard", Some("rectangle"), true).unwrap();
        assert_eq!(dims, ResolvedDimensions { width: 300, height: 250 });
    }

    #[test]
    fn test_narrow_without_mobile_falls_back() {
        let dims = resolve("leaderboard", None, true).unwrap();
        assert_eq!(dims, ResolvedDimensions { width: 728, height: 90 });
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert_eq!(
            resolve("bogus-key", None, false),
            Err(AdsError::UnknownFormatKind("bogus-key".to_string()))
        );
        // Keys are exact: no case folding.
        assert!(resolve("Rectangle", None, false).is_err());
    }

    #[test]
    fn test_unknown_mobile_key_rejected_on_desktop() {
        assert_eq!(
            resolve("rectangle", Some("tiny"), false),
            Err(AdsError::UnknownFormatKind("tiny".to_string()))
        );
    }

    #[test]
    fn test_viewport_breakpoint() {
        assert!(Viewport::new(375).is_narrow());
        assert!(Viewport::new(767).is_narrow());
        assert!(!Viewport::new(768).is_narrow());
        assert!(!Viewport::new(1280).is_narrow());
        assert!(!Viewport::new(600).with_breakpoint(480).is_narrow());
    }

    #[test]
    fn test_dimensions_display() {
        assert_eq!(AdFormatKind::Leaderboard.dimensions().to_string(), "728x90");
    }

    fn any_kind() -> impl Strategy<Value = AdFormatKind> {
        prop::sample::select(AdFormatKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_mobile_override_only_on_narrow(
            format in any_kind(),
            mobile in any_kind(),
            narrow in any::<bool>(),
        ) {
            let dims = resolve(format.key(), Some(mobile.key()), narrow).unwrap();
            let expected = if narrow { mobile } else { format };
            prop_assert_eq!(dims, expected.dimensions());
        }
    }
}

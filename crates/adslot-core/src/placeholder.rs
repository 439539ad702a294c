//! Fallback block shown when a slot has no creative.
//!
//! # Usage
//!
//! ```
//! use adslot_core::placeholder::{Placeholder, PlaceholderReason};
//!
//! let html = Placeholder::new(728, 90)
//!     .label("Sponsored")
//!     .reason(PlaceholderReason::Development)
//!     .to_html();
//! assert!(html.contains("width:728px;height:90px"));
//! ```

use std::fmt;

use quick_xml::escape::escape;
use serde::Serialize;

/// Textual tag identifying the block as a placeholder.
pub const PLACEHOLDER_TAG: &str = "Ad placeholder";

/// Why a slot is showing a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    /// Ads are suppressed outside production.
    #[default]
    Development,
    /// The script is still loading or retrying.
    Loading,
    /// The script failed and retries are exhausted.
    Exhausted,
    /// This slot's creative failed to load.
    CreativeFailed,
}

impl PlaceholderReason {
    /// Machine-readable key, used as the `data-reason` attribute.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Loading => "loading",
            Self::Exhausted => "exhausted",
            Self::CreativeFailed => "creative_failed",
        }
    }
}

/// Glyph style, chosen from the block's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderIcon {
    /// Wide and flat blocks.
    Banner,
    /// Everything else.
    Tile,
}

impl PlaceholderIcon {
    /// Pick the style for a block size. Wide means `width > height * 1.5`.
    #[must_use]
    pub fn for_size(width: u32, height: u32) -> Self {
        if u64::from(width) * 2 > u64::from(height) * 3 {
            Self::Banner
        } else {
            Self::Tile
        }
    }

    /// Glyph rendered inside the block.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Banner => "\u{1F4E2}",
            Self::Tile => "\u{1F96B}",
        }
    }
}

/// Fixed-size placeholder block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    label: Option<String>,
    width: u32,
    height: u32,
    reason: PlaceholderReason,
}

impl Placeholder {
    /// Create a placeholder of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            label: None,
            width,
            height,
            reason: PlaceholderReason::default(),
        }
    }

    /// Add a caption.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the reason the slot is unfilled.
    #[must_use]
    pub fn reason(mut self, reason: PlaceholderReason) -> Self {
        self.reason = reason;
        self
    }

    /// Block width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Block height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Caption, if any.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Why the slot is unfilled.
    #[must_use]
    pub fn why(&self) -> PlaceholderReason {
        self.reason
    }

    /// Glyph style for this block.
    #[must_use]
    pub fn icon(&self) -> PlaceholderIcon {
        PlaceholderIcon::for_size(self.width, self.height)
    }

    /// Render as an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<div class="ad-placeholder" data-reason="{}" style="width:{}px;height:{}px">"#,
            self.reason.key(),
            self.width,
            self.height
        )?;
        write!(
            f,
            r#"<span class="ad-placeholder-icon">{}</span><span class="ad-placeholder-tag">{}</span>"#,
            self.icon().glyph(),
            PLACEHOLDER_TAG
        )?;
        if let Some(label) = &self.label {
            write!(
                f,
                r#"<span class="ad-placeholder-label">{}</span>"#,
                escape(label.as_str())
            )?;
        }
        write!(
            f,
            r#"<span class="ad-placeholder-size">{}&#215;{}</span></div>"#,
            self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_by_aspect_ratio() {
        assert_eq!(PlaceholderIcon::for_size(728, 90), PlaceholderIcon::Banner);
        assert_eq!(PlaceholderIcon::for_size(320, 50), PlaceholderIcon::Banner);
        assert_eq!(PlaceholderIcon::for_size(300, 250), PlaceholderIcon::Tile);
        assert_eq!(PlaceholderIcon::for_size(160, 600), PlaceholderIcon::Tile);
        // Exactly 1.5 is not wide.
        assert_eq!(PlaceholderIcon::for_size(150, 100), PlaceholderIcon::Tile);
        assert_eq!(PlaceholderIcon::for_size(151, 100), PlaceholderIcon::Banner);
    }

    #[test]
    fn test_html_snapshot() {
        let html = Placeholder::new(300, 250)
            .label("Sponsored")
            .reason(PlaceholderReason::Exhausted)
            .to_html();
        insta::assert_snapshot!(html, @r#"<div class="ad-placeholder" data-reason="exhausted" style="width:300px;height:250px"><span class="ad-placeholder-icon">🥫</span><span class="ad-placeholder-tag">Ad placeholder</span><span class="ad-placeholder-label">Sponsored</span><span class="ad-placeholder-size">300&#215;250</span></div>"#);
    }

    #[test]
    fn test_label_is_escaped() {
        let html = Placeholder::new(728, 90)
            .label("<script>alert(1)</script> & co")
            .to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn test_no_label_no_caption_span() {
        let html = Placeholder::new(728, 90).to_html();
        assert!(!html.contains("ad-placeholder-label"));
        assert!(html.contains("data-reason=\"development\""));
        assert!(html.contains(PlaceholderIcon::Banner.glyph()));
    }
}

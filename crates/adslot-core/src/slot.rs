//! Per-placement slot renderer.

use std::fmt;

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::environment::Environment;
use crate::error::{AdsError, Result};
use crate::format::{AdFormatKind, ResolvedDimensions, Viewport, resolve_kind};
use crate::loader::{LoaderState, ScriptLoader};
use crate::placeholder::{Placeholder, PlaceholderReason};

/// What a page asks to show in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSlotRequest {
    /// Ad-network slot id (opaque).
    pub slot_id: String,
    /// Format on desktop, and on mobile when no override is set.
    pub format: AdFormatKind,
    /// Format on narrow viewports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_format: Option<AdFormatKind>,
    /// Caption shown on the placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AdSlotRequest {
    /// Request `format` for slot `slot_id`.
    pub fn new(slot_id: impl Into<String>, format: AdFormatKind) -> Self {
        Self {
            slot_id: slot_id.into(),
            format,
            mobile_format: None,
            label: None,
        }
    }

    /// Build a request from raw format keys.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::UnknownFormatKind`] if either key is not in the catalog.
    pub fn parse(
        slot_id: impl Into<String>,
        format: &str,
        mobile_format: Option<&str>,
    ) -> Result<Self> {
        let mut request = Self::new(slot_id, format.parse()?);
        request.mobile_format = mobile_format
            .map(str::parse::<AdFormatKind>)
            .transpose()?;
        Ok(request)
    }

    /// Use `format` on narrow viewports.
    #[must_use]
    pub fn with_mobile_format(mut self, format: AdFormatKind) -> Self {
        self.mobile_format = Some(format);
        self
    }

    /// Caption the placeholder.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Size for the given viewport.
    #[must_use]
    pub fn dimensions(&self, viewport: Viewport) -> ResolvedDimensions {
        resolve_kind(self.format, self.mobile_format, viewport.is_narrow())
    }
}

/// Live ad container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSlot {
    /// Ad-network slot id.
    pub slot_id: String,
    /// Publisher id; omitted from markup when empty.
    pub ad_client: String,
    /// Resolved size.
    pub dimensions: ResolvedDimensions,
}

impl fmt::Display for LiveSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<ins class="adsbygoogle" style="display:inline-block;width:{}px;height:{}px""#,
            self.dimensions.width, self.dimensions.height
        )?;
        if !self.ad_client.is_empty() {
            write!(f, r#" data-ad-client="{}""#, escape(self.ad_client.as_str()))?;
        }
        write!(
            f,
            r#" data-ad-slot="{}"></ins>"#,
            escape(self.slot_id.as_str())
        )
    }
}

/// Output of one slot render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotView {
    /// The ad container.
    Live(LiveSlot),
    /// A fallback block.
    Placeholder(Placeholder),
}

impl SlotView {
    /// True for the live container.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Placeholder reason, if this is a placeholder.
    #[must_use]
    pub fn placeholder_reason(&self) -> Option<PlaceholderReason> {
        match self {
            Self::Live(_) => None,
            Self::Placeholder(p) => Some(p.why()),
        }
    }

    /// Render as an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SlotView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(live) => live.fmt(f),
            Self::Placeholder(placeholder) => placeholder.fmt(f),
        }
    }
}

/// One mounted ad placement.
///
/// Holds a read-only subscription to the shared loader state; it never
/// mutates that state beyond asking the loader to start.
#[derive(Debug)]
pub struct AdSlot {
    request: AdSlotRequest,
    creative_failed: bool,
    updates: Option<watch::Receiver<LoaderState>>,
}

impl AdSlot {
    /// Mount a slot for `request`.
    #[must_use]
    pub fn new(request: AdSlotRequest) -> Self {
        Self {
            request,
            creative_failed: false,
            updates: None,
        }
    }

    /// The slot's request.
    #[must_use]
    pub fn request(&self) -> &AdSlotRequest {
        &self.request
    }

    /// Render for the current environment, viewport, and loader state.
    ///
    /// Outside production the loader is never touched.
    pub fn render(
        &mut self,
        environment: Environment,
        viewport: Viewport,
        loader: &ScriptLoader,
    ) -> SlotView {
        let dimensions = self.request.dimensions(viewport);

        if !environment.is_production() {
            return self.placeholder(dimensions, PlaceholderReason::Development);
        }

        loader.ensure_loaded();
        if self.updates.is_none() {
            self.updates = Some(loader.subscribe());
        }

        if self.creative_failed {
            return self.placeholder(dimensions, PlaceholderReason::CreativeFailed);
        }

        let state = loader.state();
        if state.is_ready() {
            SlotView::Live(LiveSlot {
                slot_id: self.request.slot_id.clone(),
                ad_client: loader.ad_client().to_string(),
                dimensions,
            })
        } else if state.is_exhausted() {
            self.placeholder(dimensions, PlaceholderReason::Exhausted)
        } else {
            self.placeholder(dimensions, PlaceholderReason::Loading)
        }
    }

    /// Record that this slot's creative failed to load.
    ///
    /// Only this slot falls back; the shared loader is unaffected.
    pub fn mark_creative_failed(&mut self) {
        self.creative_failed = true;
        tracing::debug!(slot_id = %self.request.slot_id, "ad creative failed to load");
    }

    /// The slot-local creative failure, if one was recorded.
    #[must_use]
    pub fn creative_error(&self) -> Option<AdsError> {
        self.creative_failed
            .then(|| AdsError::CreativeLoad(self.request.slot_id.clone()))
    }

    /// Wait for the next loader state change.
    ///
    /// Returns `false` if the slot has not subscribed yet (never rendered in
    /// production) or the loader is gone.
    pub async fn changed(&mut self) -> bool {
        match self.updates.as_mut() {
            Some(updates) => updates.changed().await.is_ok(),
            None => false,
        }
    }

    fn placeholder(&self, dimensions: ResolvedDimensions, reason: PlaceholderReason) -> SlotView {
        let mut placeholder = Placeholder::new(dimensions.width, dimensions.height).reason(reason);
        if let Some(label) = &self.request.label {
            placeholder = placeholder.label(label.clone());
        }
        SlotView::Placeholder(placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let request = AdSlotRequest::parse("1234", "leaderboard", Some("mobile_banner")).unwrap();
        assert_eq!(request.format, AdFormatKind::Leaderboard);
        assert_eq!(request.mobile_format, Some(AdFormatKind::MobileBanner));
    }

    #[test]
    fn test_parse_request_unknown() {
        let err = AdSlotRequest::parse("1234", "bogus-key", None).unwrap_err();
        assert_eq!(err, AdsError::UnknownFormatKind("bogus-key".to_string()));
    }

    #[test]
    fn test_request_dimensions_by_viewport() {
        let request = AdSlotRequest::new("1", AdFormatKind::Leaderboard)
            .with_mobile_format(AdFormatKind::Rectangle);
        assert_eq!(request.dimensions(Viewport::new(1280)).width, 728);
        assert_eq!(request.dimensions(Viewport::new(390)).width, 300);
    }

    #[test]
    fn test_request_from_json() {
        let request: AdSlotRequest =
            serde_json::from_str(r#"{"slot_id":"99","format":"large_mobile"}"#).unwrap();
        assert_eq!(request.format, AdFormatKind::LargeMobile);
        assert!(request.mobile_format.is_none());

        let err = serde_json::from_str::<AdSlotRequest>(r#"{"slot_id":"1","format":"huge"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_live_markup() {
        let live = LiveSlot {
            slot_id: "12\"34".to_string(),
            ad_client: "ca-pub-1".to_string(),
            dimensions: ResolvedDimensions {
                width: 300,
                height: 250,
            },
        };
        insta::assert_snapshot!(live.to_string(), @r#"<ins class="adsbygoogle" style="display:inline-block;width:300px;height:250px" data-ad-client="ca-pub-1" data-ad-slot="12&quot;34"></ins>"#);
    }
}

//! Analytics collaborator contract.
//!
//! Pages report navigation through an [`AnalyticsSink`]. The ad subsystem
//! itself never emits analytics events.

use serde_json::{Map, Value};

/// Event name sent on page navigation.
pub const PAGE_VIEW_EVENT: &str = "page_view";

/// Receives `(eventName, properties)` analytics calls.
pub trait AnalyticsSink: Send + Sync {
    /// Record one event.
    fn track(&self, event_name: &str, properties: &Map<String, Value>);
}

/// Writes events to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, event_name: &str, properties: &Map<String, Value>) {
        // Built outside the macro, where `Value` names `tracing::field::Value`.
        let properties = Value::Object(properties.clone());
        tracing::info!(
            target: "adslot::analytics",
            event = event_name,
            %properties,
            "analytics event"
        );
    }
}

/// Report a page navigation.
pub fn track_page_view(sink: &dyn AnalyticsSink, path: &str, title: Option<&str>) {
    let mut properties = Map::new();
    properties.insert("page_path".to_string(), Value::from(path));
    if let Some(title) = title {
        properties.insert("page_title".to_string(), Value::from(title));
    }
    sink.track(PAGE_VIEW_EVENT, &properties);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Map<String, Value>)>>);

    impl AnalyticsSink for Recorder {
        fn track(&self, event_name: &str, properties: &Map<String, Value>) {
            self.0
                .lock()
                .unwrap()
                .push((event_name.to_string(), properties.clone()));
        }
    }

    #[test]
    fn test_page_view_properties() {
        let recorder = Recorder::default();
        track_page_view(&recorder, "/guides/eggs", Some("How long do eggs last?"));
        track_page_view(&recorder, "/", None);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, PAGE_VIEW_EVENT);
        assert_eq!(events[0].1["page_path"], "/guides/eggs");
        assert_eq!(events[0].1["page_title"], "How long do eggs last?");
        assert!(!events[1].1.contains_key("page_title"));
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        track_page_view(&TracingAnalytics, "/", Some("Home"));
    }
}

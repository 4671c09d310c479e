//! Fail-soft ad slot.
//!
//! A slot asks the API for an ad once and falls back to a placeholder on any
//! failure, so a broken ad server never breaks the page. Tracking runs in
//! detached tasks and never blocks the caller.

use std::sync::atomic::{AtomicBool, Ordering};

use newsdesk_core::delivery::AdContext;
use newsdesk_core::models::{DisplayAd, TrackEvent};
use tokio::task::JoinHandle;

use crate::ads::NewsdeskClient;

/// What a slot renders.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    Ad(DisplayAd),
    Placeholder,
}

/// Fires at most once per slot; later calls are no-ops.
#[derive(Debug, Default)]
pub struct ImpressionTracker {
    fired: AtomicBool,
}

impl ImpressionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first caller only.
    pub fn fire_once(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Result of a click on a filled slot.
#[derive(Debug)]
pub struct ClickThrough {
    /// Where to navigate, if the ad has a link.
    pub link_url: Option<String>,
    /// The detached tracking request.
    pub tracking: JoinHandle<()>,
}

pub struct AdSlot {
    client: NewsdeskClient,
    context: AdContext,
    content: SlotContent,
    impression: ImpressionTracker,
}

impl AdSlot {
    /// Fetches the ad for `context`. Never fails: errors become a placeholder.
    pub async fn load(client: NewsdeskClient, context: AdContext) -> Self {
        let content = match client.display_ad(&context).await {
            Ok(Some(ad)) => SlotContent::Ad(ad),
            Ok(None) => SlotContent::Placeholder,
            Err(e) => {
                tracing::warn!(
                    position = %context.position,
                    page_type = %context.page_type,
                    error = %e,
                    transient = e.is_retryable(),
                    "Ad request failed, showing placeholder"
                );
                SlotContent::Placeholder
            }
        };

        Self {
            client,
            context,
            content,
            impression: ImpressionTracker::new(),
        }
    }

    pub fn content(&self) -> &SlotContent {
        &self.content
    }

    pub fn context(&self) -> &AdContext {
        &self.context
    }

    pub fn ad(&self) -> Option<&DisplayAd> {
        match &self.content {
            SlotContent::Ad(ad) => Some(ad),
            SlotContent::Placeholder => None,
        }
    }

    /// Called when the slot scrolls into view. Records the impression the
    /// first time only; returns the tracking task when one was started.
    pub fn on_visible(&self) -> Option<JoinHandle<()>> {
        let ad = self.ad()?;
        if !self.impression.fire_once() {
            return None;
        }
        Some(self.spawn_track(ad.id, TrackEvent::Impression))
    }

    /// Records the click in the background and hands back the link at once.
    pub fn click(&self) -> Option<ClickThrough> {
        let ad = self.ad()?;
        Some(ClickThrough {
            link_url: ad.link_url.clone(),
            tracking: self.spawn_track(ad.id, TrackEvent::Click),
        })
    }

    fn spawn_track(&self, id: uuid::Uuid, event: TrackEvent) -> JoinHandle<()> {
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.track(id, event).await {
                tracing::warn!(
                    ad_id = %id,
                    event = event.as_str(),
                    error = %e,
                    "Ad tracking failed"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::config::HttpConfig;
    use newsdesk_core::models::{AdPosition, PageType};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> AdContext {
        AdContext::new(AdPosition::Header, PageType::Homepage, None)
    }

    fn client(uri: &str) -> NewsdeskClient {
        NewsdeskClient::new(uri, &HttpConfig::default()).unwrap()
    }

    async fn server_with_ad(id: Uuid) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/advertisements/display"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": "Header banner",
                "imageUrl": "https://cdn.example.com/banner.png",
                "linkUrl": "https://sponsor.example.com",
                "customCode": null,
                "width": null,
                "height": null
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_impression_tracker_fires_once() {
        let tracker = ImpressionTracker::new();
        assert!(!tracker.has_fired());
        assert!(tracker.fire_once());
        assert!(!tracker.fire_once());
        assert!(tracker.has_fired());
    }

    #[tokio::test]
    async fn test_load_falls_back_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let slot = AdSlot::load(client(&server.uri()), ctx()).await;
        assert_eq!(slot.content(), &SlotContent::Placeholder);
        assert!(slot.on_visible().is_none());
        assert!(slot.click().is_none());
    }

    #[tokio::test]
    async fn test_load_falls_back_on_bad_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let slot = AdSlot::load(client(&server.uri()), ctx()).await;
        assert_eq!(slot.content(), &SlotContent::Placeholder);
    }

    #[tokio::test]
    async fn test_load_falls_back_when_unreachable() {
        let slot = AdSlot::load(client("http://127.0.0.1:1"), ctx()).await;
        assert_eq!(slot.content(), &SlotContent::Placeholder);
    }

    #[tokio::test]
    async fn test_impression_recorded_once() {
        let id = Uuid::new_v4();
        let server = server_with_ad(id).await;
        Mock::given(method("POST"))
            .and(path(format!("/api/advertisements/{}/track", id)))
            .and(body_json(json!({"type": "impression"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id, "impressions": 1, "clicks": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let slot = AdSlot::load(client(&server.uri()), ctx()).await;
        assert_eq!(slot.ad().map(|ad| ad.id), Some(id));

        let first = slot.on_visible().expect("first visibility tracks");
        assert!(slot.on_visible().is_none());
        first.await.unwrap();
    }

    #[tokio::test]
    async fn test_click_returns_link_and_tracks() {
        let id = Uuid::new_v4();
        let server = server_with_ad(id).await;
        Mock::given(method("POST"))
            .and(path(format!("/api/advertisements/{}/track", id)))
            .and(body_json(json!({"type": "click"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id, "impressions": 1, "clicks": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let slot = AdSlot::load(client(&server.uri()), ctx()).await;
        let click = slot.click().unwrap();
        assert_eq!(click.link_url.as_deref(), Some("https://sponsor.example.com"));
        click.tracking.await.unwrap();
    }

    #[tokio::test]
    async fn test_tracking_failure_is_swallowed() {
        let id = Uuid::new_v4();
        let server = server_with_ad(id).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let slot = AdSlot::load(client(&server.uri()), ctx()).await;
        // The task completes without panicking and is not retried.
        slot.on_visible().unwrap().await.unwrap();
    }
}

use newsdesk_core::config::HttpConfig;
use newsdesk_core::delivery::AdContext;
use newsdesk_core::error::AppError;
use newsdesk_core::models::{AdCounters, DisplayAd, TrackEvent, TrackRequest};
use reqwest::{Client, StatusCode};
use url::Url;
use uuid::Uuid;

/// HTTP client for the Newsdesk ad endpoints.
///
/// # Examples
///
/// ```no_run
/// use newsdesk_client::NewsdeskClient;
/// use newsdesk_core::config::HttpConfig;
/// use newsdesk_core::delivery::AdContext;
/// use newsdesk_core::models::{AdPosition, PageType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NewsdeskClient::new("http://localhost:8080", &HttpConfig::default())?;
/// let ctx = AdContext::new(AdPosition::Header, PageType::Homepage, None);
/// if let Some(ad) = client.display_ad(&ctx).await? {
///     println!("Serving {}", ad.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NewsdeskClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl NewsdeskClient {
    /// Creates a client for the API at `base_url_str`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed and
    /// `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str, config: &HttpConfig) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url_str)
            .map_err(|_| AppError::InvalidUrl(base_url_str.to_string()))?;
        // Relative joins replace the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Asks the server which ad fills the slot described by `ctx`.
    ///
    /// `Ok(None)` when nothing is eligible (HTTP 204). Sent once; a failed
    /// request is the caller's cue to show a placeholder.
    pub async fn display_ad(&self, ctx: &AdContext) -> Result<Option<DisplayAd>, AppError> {
        let mut url = self.endpoint("api/advertisements/display")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("position", ctx.position.as_str());
            query.append_pair("pageType", ctx.page_type.as_str());
            if let Some(page_id) = &ctx.page_id {
                query.append_pair("pageId", page_id);
            }
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} while requesting an ad",
                status.as_u16()
            )));
        }

        let ad = resp
            .json::<DisplayAd>()
            .await
            .map_err(|e| AppError::ClientError(format!("Invalid ad payload: {}", e)))?;
        Ok(Some(ad))
    }

    /// Records one impression or click. Sent once, never retried.
    pub async fn track(&self, id: Uuid, event: TrackEvent) -> Result<AdCounters, AppError> {
        let url = self.endpoint(&format!("api/advertisements/{}/track", id))?;
        let resp = self
            .client
            .post(url)
            .json(&TrackRequest { event })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match resp.status() {
            status if status.is_success() => resp
                .json::<AdCounters>()
                .await
                .map_err(|e| AppError::ClientError(e.to_string())),
            StatusCode::NOT_FOUND => Err(AppError::not_found("Advertisement", id)),
            status => Err(AppError::ClientError(format!(
                "HTTP {} while tracking {}",
                status.as_u16(),
                event.as_str()
            ))),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::models::{AdPosition, PageType};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NewsdeskClient {
        NewsdeskClient::new(&server.uri(), &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = NewsdeskClient::new("not a url", &HttpConfig::default());
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_display_ad_sends_context() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/advertisements/display"))
            .and(query_param("position", "in-article"))
            .and(query_param("pageType", "article"))
            .and(query_param("pageId", "city-budget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": "Spring sale",
                "imageUrl": "https://cdn.example.com/spring.png",
                "linkUrl": "https://shop.example.com",
                "customCode": null,
                "width": 728,
                "height": 90
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = AdContext::new(
            AdPosition::InArticle,
            PageType::Article,
            Some("city-budget".to_string()),
        );
        let ad = client(&server).display_ad(&ctx).await.unwrap().unwrap();
        assert_eq!(ad.id, id);
        assert_eq!(ad.width, Some(728));
    }

    #[tokio::test]
    async fn test_display_ad_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/advertisements/display"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ctx = AdContext::new(AdPosition::Footer, PageType::Global, None);
        assert!(client(&server).display_ad(&ctx).await.unwrap().is_none());
    }

    #[test]
    fn test_new_keeps_base_path_prefix() {
        let client = NewsdeskClient::new("http://news.example.com/cms", &HttpConfig::default())
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://news.example.com/cms/");
        assert_eq!(
            client.endpoint("api/advertisements/display").unwrap().as_str(),
            "http://news.example.com/cms/api/advertisements/display"
        );
    }

    #[tokio::test]
    async fn test_display_ad_under_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cms/api/advertisements/display"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/cms", server.uri());
        let client = NewsdeskClient::new(&base, &HttpConfig::default()).unwrap();
        let ctx = AdContext::new(AdPosition::Footer, PageType::Global, None);
        assert!(client.display_ad(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_display_ad_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = AdContext::new(AdPosition::Header, PageType::Global, None);
        let err = client(&server).display_ad(&ctx).await.unwrap_err();
        assert!(matches!(err, AppError::ClientError(_)));
    }

    #[tokio::test]
    async fn test_track_posts_event() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path(format!("/api/advertisements/{}/track", id)))
            .and(body_json(json!({"type": "click"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "impressions": 10,
                "clicks": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let counters = client(&server).track(id, TrackEvent::Click).await.unwrap();
        assert_eq!(counters.clicks, 2);
    }

    #[tokio::test]
    async fn test_track_unknown_ad() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .track(Uuid::new_v4(), TrackEvent::Impression)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}

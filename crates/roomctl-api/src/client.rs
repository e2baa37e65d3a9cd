// Async HTTP client for the room management API.
//
// Base path: {base}/api/
// Auth: optional HTTP basic credentials on every request

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::events::{self, EventSubscription};
use crate::transport::{BasicCredentials, TransportConfig};
use crate::types;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the room management API.
///
/// Stateless request/response wrapper. Every method performs exactly one
/// HTTP call and returns the decoded, server-confirmed value.
pub struct RoomsClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
    credentials: Option<BasicCredentials>,
}

impl RoomsClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL and transport config.
    ///
    /// Accepts either the server root (`https://host/`) or the API root
    /// (`https://host/api`); both normalize to `https://host/api/`.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let stream_http = transport.build_stream_client()?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            stream_http,
            base_url,
            credentials: transport.credentials.clone(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth and TLS).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            stream_http: http.clone(),
            http,
            base_url,
            credentials: None,
        })
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"rooms"`) onto the API root.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// `rooms/{key}[/{action}]` with `key` percent-encoded as a single
    /// path segment.
    fn room_url(&self, key: &str, action: Option<&str>) -> Result<Url, Error> {
        // Dot segments are dropped by `push`; no room carries such a key.
        if matches!(key, "" | "." | "..") {
            return Err(Error::NotFound {
                message: format!("room '{key}' not found"),
            });
        }
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().push("rooms").push(key);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some(creds) => creds.apply(builder),
            None => builder,
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get_url(self.url(path)?).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .request(reqwest::Method::GET, url)
            .query(params)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn get_text(&self, path: &str) -> Result<String, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.text().await?)
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        params: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, Error> {
        debug!("POST {url} params={params:?}");

        let mut req = self.request(reqwest::Method::POST, url).query(params);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn post_no_response(&self, url: Url) -> Result<(), Error> {
        debug!("POST {url}");

        let resp = self.request(reqwest::Method::POST, url).send().await?;
        self.handle_empty(resp).await
    }

    async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.request(reqwest::Method::DELETE, url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    /// The server writes plain-text error bodies (`http.Error`), so the
    /// trimmed body is the message. An empty body falls back to the
    /// status line.
    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = match raw.trim() {
            "" => status.to_string(),
            text => text.to_owned(),
        };

        if status == reqwest::StatusCode::NOT_FOUND {
            Error::NotFound { message }
        } else {
            Error::Api {
                status: status.as_u16(),
                message,
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Config ───────────────────────────────────────────────────────

    pub async fn rooms_config(&self) -> Result<types::RoomsConfigResponse, Error> {
        self.get("config/rooms").await
    }

    // ── Rooms ────────────────────────────────────────────────────────

    /// List rooms, optionally filtered by container labels.
    ///
    /// Each `(key, value)` pair is sent as a query parameter; the server
    /// returns only rooms carrying every listed label.
    pub async fn list_rooms(
        &self,
        labels: &[(String, String)],
    ) -> Result<Vec<types::RoomEntryResponse>, Error> {
        if labels.is_empty() {
            self.get("rooms").await
        } else {
            self.get_with_params("rooms", labels).await
        }
    }

    /// Create a room. `start` maps to the `?start=` query flag.
    pub async fn create_room(
        &self,
        settings: &types::RoomSettings,
        start: bool,
    ) -> Result<types::RoomEntryResponse, Error> {
        self.post(self.url("rooms")?, &[("start", start.to_string())], Some(settings))
            .await
    }

    pub async fn get_room(&self, id: &str) -> Result<types::RoomEntryResponse, Error> {
        self.get_url(self.room_url(id, None)?).await
    }

    pub async fn get_room_by_name(&self, name: &str) -> Result<types::RoomEntryResponse, Error> {
        self.get_url(self.room_url(name, Some("by-name"))?).await
    }

    pub async fn remove_room(&self, id: &str) -> Result<(), Error> {
        self.delete(self.room_url(id, None)?).await
    }

    pub async fn room_settings(&self, id: &str) -> Result<types::RoomSettings, Error> {
        self.get_url(self.room_url(id, Some("settings"))?).await
    }

    pub async fn room_stats(&self, id: &str) -> Result<types::RoomStats, Error> {
        self.get_url(self.room_url(id, Some("stats"))?).await
    }

    pub async fn start_room(&self, id: &str) -> Result<(), Error> {
        self.post_no_response(self.room_url(id, Some("start"))?).await
    }

    pub async fn stop_room(&self, id: &str) -> Result<(), Error> {
        self.post_no_response(self.room_url(id, Some("stop"))?).await
    }

    pub async fn pause_room(&self, id: &str) -> Result<(), Error> {
        self.post_no_response(self.room_url(id, Some("pause"))?).await
    }

    pub async fn restart_room(&self, id: &str) -> Result<(), Error> {
        self.post_no_response(self.room_url(id, Some("restart"))?).await
    }

    /// Recreate a room's container, optionally with new settings.
    ///
    /// Without `settings` the server reuses the current ones. Without
    /// `start` the server keeps the previous running state.
    pub async fn recreate_room(
        &self,
        id: &str,
        settings: Option<&types::RoomSettings>,
        start: Option<bool>,
    ) -> Result<types::RoomEntryResponse, Error> {
        let params: Vec<(&str, String)> = start
            .map(|s| ("start", s.to_string()))
            .into_iter()
            .collect();
        self.post(self.room_url(id, Some("recreate"))?, &params, settings)
            .await
    }

    // ── Pull ─────────────────────────────────────────────────────────

    pub async fn pull_start(
        &self,
        request: &types::PullStart,
    ) -> Result<types::PullStatusResponse, Error> {
        self.post(self.url("pull")?, &[], Some(request)).await
    }

    pub async fn pull_status(&self) -> Result<types::PullStatusResponse, Error> {
        self.get("pull").await
    }

    pub async fn pull_stop(&self) -> Result<(), Error> {
        self.delete(self.url("pull")?).await
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Raw `docker-compose.yaml` describing every room.
    pub async fn export_compose(&self) -> Result<String, Error> {
        self.get_text("docker-compose.yaml").await
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Open the server-sent event stream (`GET events?sse`).
    ///
    /// Resolves once the server has answered with a success status;
    /// any other status is reported as [`Error::EventStream`].
    pub async fn subscribe_events(&self) -> Result<EventSubscription, Error> {
        let mut url = self.url("events")?;
        url.set_query(Some("sse"));
        debug!("GET {url} (event stream)");

        let mut req = self
            .stream_http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(ref creds) = self.credentials {
            req = creds.apply(req);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::EventStream(format!("failed to connect: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::EventStream(format!(
                "server answered {status}: {}",
                body.trim()
            )));
        }

        Ok(events::subscription(resp))
    }
}

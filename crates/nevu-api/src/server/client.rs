use std::collections::BTreeMap;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use nevu_core::models::{ContainerResponse, Directory, MediaContainer, MediaItem};

use super::error::PlexError;
use super::proxy::{ProxyMethod, ProxyRequest};
use crate::traits::MediaServer;

const LIBRARY_IDENTIFIER: &str = "com.plexapp.plugins.library";

/// Connection details for one media server, gathered at login.
#[derive(Debug, Clone)]
pub struct ServerSession {
    pub server_url: String,
    pub token: String,
    pub client_id: String,
    pub session_id: String,
    pub product: String,
}

/// Media server client. Requests go through `{backend}/proxy` unless
/// `direct` is set.
pub struct PlexServerClient {
    backend_url: String,
    session: ServerSession,
    direct: bool,
    http: Client,
}

impl PlexServerClient {
    pub fn new(backend_url: impl Into<String>, session: ServerSession, direct: bool) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            session,
            direct,
            http: Client::new(),
        }
    }

    pub fn session(&self) -> &ServerSession {
        &self.session
    }

    fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Plex-Token".to_string(), self.session.token.clone()),
            (
                "X-Plex-Client-Identifier".to_string(),
                self.session.client_id.clone(),
            ),
            (
                "X-Plex-Session-Identifier".to_string(),
                self.session.session_id.clone(),
            ),
            ("X-Plex-Product".to_string(), self.session.product.clone()),
        ])
    }

    /// Absolute server URL for `path` (which may carry its own query) plus
    /// extra query pairs.
    pub fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, PlexError> {
        let base = self.session.server_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: ProxyMethod,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, PlexError> {
        let url = self.build_url(path, query)?;
        tracing::debug!(method = ?method, path, direct = self.direct, "server request");

        let resp = if self.direct {
            let mut req = self.http.request(method.as_reqwest(), url);
            for (name, value) in self.headers() {
                req = req.header(name, value);
            }
            req.send().await?
        } else {
            let envelope = ProxyRequest {
                url: url.to_string(),
                method,
                headers: self.headers(),
            };
            self.http
                .post(format!("{}/proxy", self.backend_url))
                .json(&envelope)
                .send()
                .await?
        };

        Self::check_response(resp).await
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlexError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "server API error");
            Err(PlexError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlexError> {
        let resp = self.send(ProxyMethod::Get, path, query).await?;
        resp.json::<T>()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))
    }

    async fn get_container(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<MediaContainer, PlexError> {
        let body: ContainerResponse = self.get_json(path, query).await?;
        Ok(body.media_container)
    }

    /// Image URL routed through the server's photo transcoder.
    ///
    /// Images are fetched by the renderer directly, so this never uses the
    /// proxy.
    pub fn transcode_image_url(
        &self,
        path: &str,
        width: u32,
        height: u32,
    ) -> Result<String, PlexError> {
        let width = width.to_string();
        let height = height.to_string();
        let url = self.build_url(
            "/photo/:/transcode",
            &[
                ("width", &width),
                ("height", &height),
                ("minSize", "1"),
                ("upscale", "1"),
                ("url", path),
                ("X-Plex-Token", &self.session.token),
            ],
        )?;
        Ok(url.to_string())
    }

    /// Direct stream URL for a part key (trailers, hover previews).
    pub fn media_url(&self, part_key: &str) -> Result<String, PlexError> {
        Ok(self
            .build_url(part_key, &[("X-Plex-Token", &self.session.token)])?
            .to_string())
    }
}

impl MediaServer for PlexServerClient {
    type Error = PlexError;

    async fn get_all_libraries(&self) -> Result<Vec<Directory>, PlexError> {
        Ok(self.get_container("/library/sections", &[]).await?.directories)
    }

    async fn get_library(&self, section: &str) -> Result<MediaContainer, PlexError> {
        self.get_container(&format!("/library/sections/{section}"), &[])
            .await
    }

    async fn get_library_dir(
        &self,
        dir: &str,
        params: &[(String, String)],
    ) -> Result<MediaContainer, PlexError> {
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.get_container(dir, &pairs).await
    }

    async fn get_library_secondary(
        &self,
        section: &str,
        kind: &str,
    ) -> Result<Vec<Directory>, PlexError> {
        Ok(self
            .get_container(&format!("/library/sections/{section}/{kind}"), &[])
            .await?
            .directories)
    }

    async fn get_library_media(&self, path: &str) -> Result<Vec<MediaItem>, PlexError> {
        Ok(self
            .get_container(&format!("/library{path}"), &[])
            .await?
            .metadata)
    }

    async fn get_library_meta(&self, rating_key: &str) -> Result<MediaItem, PlexError> {
        self.get_container(
            &format!("/library/metadata/{rating_key}"),
            &[
                ("includeChildren", "1"),
                ("includeOnDeck", "1"),
                ("includeExtras", "1"),
                ("includeConcerts", "1"),
            ],
        )
        .await?
        .metadata
        .into_iter()
        .next()
        .ok_or_else(|| PlexError::NotFound(rating_key.to_string()))
    }

    async fn get_library_meta_children(&self, rating_key: &str) -> Result<Vec<MediaItem>, PlexError> {
        Ok(self
            .get_container(&format!("/library/metadata/{rating_key}/children"), &[])
            .await?
            .metadata)
    }

    async fn get_item_by_guid(&self, guid: &str) -> Result<Option<MediaItem>, PlexError> {
        Ok(self
            .get_container("/library/all", &[("guid", guid)])
            .await?
            .metadata
            .into_iter()
            .next())
    }

    async fn set_media_played_status(&self, played: bool, rating_key: &str) -> Result<(), PlexError> {
        let path = if played { "/:/scrobble" } else { "/:/unscrobble" };
        self.send(
            ProxyMethod::Get,
            path,
            &[("key", rating_key), ("identifier", LIBRARY_IDENTIFIER)],
        )
        .await?;
        Ok(())
    }

    async fn set_media_rating(&self, rating: f32, rating_key: &str) -> Result<(), PlexError> {
        let rating = rating.to_string();
        self.send(
            ProxyMethod::Put,
            "/:/rate",
            &[
                ("key", rating_key),
                ("identifier", LIBRARY_IDENTIFIER),
                ("rating", &rating),
            ],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PlexServerClient {
        PlexServerClient::new(
            "http://localhost:3000/",
            ServerSession {
                server_url: "http://10.0.0.2:32400/".into(),
                token: "tok".into(),
                client_id: "cid".into(),
                session_id: "sid".into(),
                product: "Nevu".into(),
            },
            false,
        )
    }

    #[test]
    fn test_build_url_keeps_existing_query() {
        let c = client();
        let url = c.build_url("/sections/1/all?genre=7", &[]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:32400/sections/1/all?genre=7");

        let url = c
            .build_url("/library/sections/1/all", &[("unwatched!", "1"), ("sort", "title:asc")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.2:32400/library/sections/1/all?unwatched%21=1&sort=title%3Aasc"
        );
    }

    #[test]
    fn test_transcode_image_url() {
        let url = client()
            .transcode_image_url("/library/metadata/1/thumb/123", 600, 900)
            .unwrap();
        assert!(url.starts_with("http://10.0.0.2:32400/photo/:/transcode?width=600&height=900"));
        assert!(url.contains("url=%2Flibrary%2Fmetadata%2F1%2Fthumb%2F123"));
        assert!(url.ends_with("X-Plex-Token=tok"));
    }

    #[test]
    fn test_media_url_appends_token() {
        assert_eq!(
            client().media_url("/library/parts/9/file.mp4").unwrap(),
            "http://10.0.0.2:32400/library/parts/9/file.mp4?X-Plex-Token=tok"
        );
        assert_eq!(
            client().media_url("/trailer?x=1").unwrap(),
            "http://10.0.0.2:32400/trailer?x=1&X-Plex-Token=tok"
        );
    }

    #[test]
    fn test_identity_headers() {
        let headers = client().headers();
        assert_eq!(headers["X-Plex-Client-Identifier"], "cid");
        assert_eq!(headers["X-Plex-Session-Identifier"], "sid");
        assert_eq!(headers["Accept"], "application/json");
    }
}

use reqwest::Client;

use nevu_core::models::UserOption;

use super::error::BackendError;
use crate::traits::SettingsBackend;

/// Client for `{backend}/user/options`, keyed by the account token.
pub struct OptionsClient {
    backend_url: String,
    account_token: String,
    http: Client,
}

impl OptionsClient {
    pub fn new(backend_url: impl Into<String>, account_token: String) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            account_token,
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/user/options", self.backend_url)
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(BackendError::Api {
                status,
                message: body,
            })
        }
    }
}

impl SettingsBackend for OptionsClient {
    type Error = BackendError;

    async fn fetch_options(&self) -> Result<Vec<UserOption>, BackendError> {
        tracing::debug!("fetching user options");
        let resp = self
            .http
            .get(self.endpoint())
            .header("X-Plex-Token", &self.account_token)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json::<Vec<UserOption>>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn upsert_option(&self, key: &str, value: &str) -> Result<(), BackendError> {
        tracing::debug!(key, value, "saving user option");
        let resp = self
            .http
            .post(self.endpoint())
            .header("X-Plex-Token", &self.account_token)
            .json(&UserOption {
                key: key.to_string(),
                value: value.to_string(),
            })
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        let client = OptionsClient::new("http://localhost:3000/", "tok".into());
        assert_eq!(client.endpoint(), "http://localhost:3000/user/options");
    }

    #[test]
    fn test_option_list_shape() {
        let opts: Vec<UserOption> = serde_json::from_str(
            r#"[{"key":"AUTO_NEXT_EP","value":"false"},{"key":"AUTO_MATCH_TRACKS","value":"true"}]"#,
        )
        .unwrap();
        assert_eq!(opts[0].key, "AUTO_NEXT_EP");
        assert_eq!(opts[1].value, "true");
    }
}

use reqwest::Client;

use super::error::CommunityError;
use super::types::{GraphQLResponse, ReviewsData};

const API_URL: &str = "https://community.plex.tv/api";

const REVIEWS_OPERATION: &str = "getRatingsAndReviewsPageData";
const REVIEWS_QUERY: &str = include_str!("reviews.graphql");

/// Plex community GraphQL client.
pub struct CommunityClient {
    account_token: String,
    http: Client,
}

impl CommunityClient {
    pub fn new(account_token: String) -> Self {
        Self {
            account_token,
            http: Client::new(),
        }
    }

    async fn graphql_request<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, CommunityError> {
        tracing::debug!(operation, "community GraphQL request");

        let resp = self
            .http
            .post(API_URL)
            .header("x-plex-token", &self.account_token)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "operationName": operation,
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(operation, status = status_code, "community API error");
            return Err(CommunityError::Api {
                status: status_code,
                message: body,
            });
        }

        let body: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| CommunityError::Parse(e.to_string()))?;

        match body.data {
            Some(data) => Ok(data),
            None => Err(CommunityError::GraphQL(
                body.errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
        }
    }

    /// Ratings and reviews for a metadata id (last segment of the GUID).
    ///
    /// Recent reviews that also appear under top reviews are removed.
    pub async fn get_user_reviews(&self, metadata_id: &str) -> Result<ReviewsData, CommunityError> {
        let mut data: ReviewsData = self
            .graphql_request(
                REVIEWS_OPERATION,
                REVIEWS_QUERY,
                serde_json::json!({ "metadataID": metadata_id }),
            )
            .await?;
        data.dedupe_recent();
        Ok(data)
    }
}

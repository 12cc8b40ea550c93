use serde::{Deserialize, Serialize};

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

/// All review sections for one metadata item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsData {
    pub user_review: Option<ActivityReview>,
    #[serde(default)]
    pub friend_reviews: ReviewsSection,
    #[serde(default)]
    pub hot_reviews: ReviewsSection,
    #[serde(default)]
    pub other_reviews: ReviewsSection,
    #[serde(default)]
    pub recent_reviews: ReviewsSection,
    #[serde(default)]
    pub top_reviews: ReviewsSection,
}

impl ReviewsData {
    /// Drop recent reviews that are already listed as top reviews.
    pub fn dedupe_recent(&mut self) {
        let top = &self.top_reviews.nodes;
        self.recent_reviews
            .nodes
            .retain(|review| !top.iter().any(|t| t.id == review.id));
    }

    /// Sections in display order with their titles.
    pub fn sections(&self) -> [&ReviewsSection; 5] {
        [
            &self.friend_reviews,
            &self.top_reviews,
            &self.hot_reviews,
            &self.recent_reviews,
            &self.other_reviews,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSection {
    #[serde(default)]
    pub nodes: Vec<ActivityReview>,
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
}

/// A rating or review activity. Plain ratings carry `rating`; written
/// reviews carry `reviewRating` and a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReview {
    #[serde(rename = "__typename", default)]
    pub typename: String,
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub reactions_types: Vec<String>,
    #[serde(default)]
    pub review_rating: Option<f32>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub has_spoilers: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "userV2")]
    pub user: Option<ReviewUser>,
}

impl ActivityReview {
    /// Rating on the 0-10 scale, whichever field carries it.
    pub fn score(&self) -> Option<f32> {
        self.review_rating.or(self.rating)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str) -> serde_json::Value {
        serde_json::json!({
            "__typename": "ActivityReview",
            "id": id,
            "reviewRating": 8,
            "hasSpoilers": false,
            "message": "Great",
            "userV2": {"id": "u", "username": "someone", "displayName": "Someone"}
        })
    }

    #[test]
    fn test_deserialize_and_dedupe() {
        let json = serde_json::json!({
            "data": {
                "userReview": null,
                "friendReviews": {"nodes": [], "pageInfo": {"hasNextPage": false}, "title": "Friends"},
                "hotReviews": {"nodes": [], "pageInfo": {"hasNextPage": false}, "title": "Hot"},
                "otherReviews": {"nodes": [], "pageInfo": {"hasNextPage": false}, "title": "Other"},
                "recentReviews": {"nodes": [review("a"), review("b")], "pageInfo": {"hasNextPage": true}, "title": "Recent"},
                "topReviews": {"nodes": [review("a")], "pageInfo": {"hasNextPage": false}, "title": "Top"}
            }
        });
        let resp: GraphQLResponse<ReviewsData> = serde_json::from_value(json).unwrap();
        let mut data = resp.data.unwrap();
        assert!(data.recent_reviews.page_info.has_next_page);

        data.dedupe_recent();
        let ids: Vec<_> = data.recent_reviews.nodes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(data.top_reviews.nodes[0].score(), Some(8.0));
    }

    #[test]
    fn test_plain_rating_node() {
        let node: ActivityReview = serde_json::from_value(serde_json::json!({
            "__typename": "ActivityRating", "id": "r1", "rating": 6.0
        }))
        .unwrap();
        assert_eq!(node.score(), Some(6.0));
        assert!(node.message.is_none());
    }
}

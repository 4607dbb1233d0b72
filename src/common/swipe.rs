use serde::{Deserialize, Serialize};

use super::page::Identified;
use super::types::{User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// A candidate shown in swiper mode. Fields beyond the user are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialMatch {
    pub user: User,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl PotentialMatch {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

impl Identified for PotentialMatch {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.user.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialMatchPage {
    #[serde(default)]
    pub matches: Vec<PotentialMatch>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub swiped_user_id: UserId,
    pub direction: SwipeDirection,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extra_candidate_fields_survive() {
        let page: PotentialMatchPage = serde_json::from_value(json!({
            "matches": [{"user": {"id": 4, "username": "kim"}, "distanceKm": 3.5}],
            "hasNextPage": true
        }))
        .unwrap();

        assert!(page.has_next_page);
        assert_eq!(page.matches[0].user_id(), 4);
        assert_eq!(page.matches[0].details["distanceKm"], 3.5);
    }

    #[test]
    fn swipe_body_uses_lowercase_direction() {
        let body = SwipeRequest {
            swiped_user_id: 4,
            direction: SwipeDirection::Right,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"swipedUserId": 4, "direction": "right"})
        );
    }
}

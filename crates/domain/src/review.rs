//! Application reviews left by clients.

use chrono::{DateTime, Utc};
use common::NationalId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A score-and-comment review submitted by an authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// National ID of the reviewer.
    pub client_id: NationalId,

    /// Username of the reviewer.
    pub username: String,

    /// Score in `[1, 10]`.
    pub score: u8,

    /// Optional free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Creates a validated review.
    pub fn new(
        client_id: NationalId,
        username: impl Into<String>,
        score: u8,
        comment: Option<String>,
    ) -> Result<Self, DomainError> {
        if !(1..=10).contains(&score) {
            return Err(DomainError::InvalidScore {
                score: i64::from(score),
            });
        }

        Ok(Self {
            client_id,
            username: username.into(),
            score,
            comment,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scores_in_range() {
        for score in 1..=10 {
            assert!(Review::new(NationalId::new("1"), "u", score, None).is_ok());
        }
    }

    #[test]
    fn rejects_scores_out_of_range() {
        assert!(matches!(
            Review::new(NationalId::new("1"), "u", 0, None),
            Err(DomainError::InvalidScore { score: 0 })
        ));
        assert!(matches!(
            Review::new(NationalId::new("1"), "u", 11, None),
            Err(DomainError::InvalidScore { score: 11 })
        ));
    }

    #[test]
    fn comment_is_optional_in_serialized_form() {
        let review = Review::new(NationalId::new("1"), "u", 8, None).unwrap();
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("comment").is_none());
    }
}

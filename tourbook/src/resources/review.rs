//! Review documents

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::repository::{FieldViolation, MemoryCollection, Resource};

/// Collection of reviews
pub type Reviews = MemoryCollection<Review>;

/// Fields of the author shown on every review
pub const AUTHOR_FIELDS: [&str; 2] = ["name", "photo"];

/// A user's review of a tour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub review: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Number>,
    /// Id of the reviewed tour
    pub tour: String,
    /// Id of the author
    pub user: String,
}

impl Resource for Review {
    const MODEL: &'static str = "Review";
    const SINGULAR: &'static str = "review";
    const PLURAL: &'static str = "reviews";
    const REQUIRED: &'static [(&'static str, &'static str)] = &[
        ("review", "Review can not be empty"),
        ("tour", "Review must belong to a tour"),
        ("user", "Review must belong to a user"),
    ];

    fn validate(&self) -> Vec<FieldViolation> {
        match self.rating.as_ref().and_then(Number::as_f64) {
            Some(rating) if !(1.0..=5.0).contains(&rating) => {
                vec![FieldViolation::new("rating", "Rating must be between 1 and 5")]
            }
            _ => Vec::new(),
        }
    }
}

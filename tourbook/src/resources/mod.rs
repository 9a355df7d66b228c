//! Tour, user and review document kinds and how their collections relate

pub mod review;
pub mod tour;
pub mod user;

use std::sync::Arc;

use crate::repository::{DocumentSource, Relation};

pub use review::{Review, Reviews};
pub use tour::{Tour, Tours};
pub use user::{User, Users};

/// The three collections, wired together
///
/// Reviews expand their `user` to the author's name and photo; tours expand
/// their `reviews` when fetched one at a time.
#[derive(Clone)]
pub struct Collections {
    pub tours: Tours,
    pub users: Users,
    pub reviews: Reviews,
}

impl Collections {
    /// Empty, related collections
    pub fn new() -> Self {
        let users = Users::new();
        let author: Arc<dyn DocumentSource> = Arc::new(users.clone());
        let reviews = Reviews::new()
            .with_relation(Relation::belongs_to("user", author, review::AUTHOR_FIELDS))
            .with_default_expansion(["user"]);
        let children: Arc<dyn DocumentSource> = Arc::new(reviews.clone());
        let tours = Tours::new().with_relation(Relation::has_many("reviews", children, "tour"));
        Self {
            tours,
            users,
            reviews,
        }
    }
}

impl Default for Collections {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Collection, Document};
    use serde_json::{json, Value};

    fn body(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_tour_expands_reviews_with_authors() {
        let collections = Collections::new();
        let user = collections
            .users
            .create(body(json!({
                "name": "Laura", "email": "laura@example.com",
                "password": "hash", "photo": "user-2.jpg"
            })))
            .await
            .unwrap();
        let tour = collections
            .tours
            .create(body(json!({
                "name": "The Sea Explorer", "duration": 7, "maxGroupSize": 15,
                "difficulty": "medium", "price": 497, "summary": "Sea", "imageCover": "c.jpg"
            })))
            .await
            .unwrap();
        collections
            .reviews
            .create(body(json!({
                "review": "Lovely", "rating": 5,
                "tour": tour["_id"], "user": user["_id"]
            })))
            .await
            .unwrap();

        let expanded = collections
            .tours
            .find_by_id(tour["_id"].as_str().unwrap(), &["reviews".to_string()])
            .await
            .unwrap()
            .unwrap();
        let reviews = expanded["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 1);
        let author = reviews[0]["user"].as_object().unwrap();
        assert_eq!(author["name"], json!("Laura"));
        assert_eq!(author["photo"], json!("user-2.jpg"));
        assert!(author.get("email").is_none());
        assert!(author.get("password").is_none());
    }
}

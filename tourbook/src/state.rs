//! Application state management

use std::path::Path;
use std::sync::Arc;

use crate::{
    auth::{JwtGenerator, PasswordHasher},
    config::Config,
    error::{Error, Result},
    handlers::ResourceHandlers,
    middleware::JwtAuth,
    repository::Document,
    resources::{tour, Collections, Reviews, Tours, Users},
};

/// Application state shared across handlers
///
/// Cloning is cheap: collections share their stores and everything else sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    collections: Collections,
    tours: ResourceHandlers<Tours>,
    users: ResourceHandlers<Users>,
    reviews: ResourceHandlers<Reviews>,
    hasher: Arc<PasswordHasher>,
    tokens: JwtGenerator,
    jwt: JwtAuth,
}

impl AppState {
    /// Create state with empty collections
    ///
    /// Fails if the password or token settings are unusable.
    pub fn new(config: Config) -> Result<Self> {
        let collections = Collections::new();
        let hasher = PasswordHasher::new(&config.password)?;
        let tokens = JwtGenerator::new(&config.jwt)?;
        let jwt = JwtAuth::new(&config.jwt)?;

        let tours = ResourceHandlers::new(Arc::new(collections.tours.clone()))
            .expand_on_get(["reviews"])
            .with_post_process(tour::public_image_paths);
        let users = ResourceHandlers::new(Arc::new(collections.users.clone()));
        let reviews = ResourceHandlers::new(Arc::new(collections.reviews.clone()));

        Ok(Self {
            config: Arc::new(config),
            collections,
            tours,
            users,
            reviews,
            hasher: Arc::new(hasher),
            tokens,
            jwt,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The raw collections, for lookups the CRUD handlers do not cover
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Tour handlers
    pub fn tours(&self) -> &ResourceHandlers<Tours> {
        &self.tours
    }

    /// User handlers
    pub fn users(&self) -> &ResourceHandlers<Users> {
        &self.users
    }

    /// Review handlers
    pub fn reviews(&self) -> &ResourceHandlers<Reviews> {
        &self.reviews
    }

    /// Password hasher
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Token issuer
    pub fn tokens(&self) -> &JwtGenerator {
        &self.tokens
    }

    /// Token validator
    pub fn jwt(&self) -> &JwtAuth {
        &self.jwt
    }

    /// Import the configured tour seed, if any
    ///
    /// Returns the number of tours imported.
    pub async fn seed(&self) -> Result<usize> {
        match self.config.data.tours_seed.as_deref() {
            Some(path) => self.import_tours(path).await,
            None => Ok(0),
        }
    }

    /// Import a JSON array of tours
    ///
    /// Stops at the first tour that fails validation.
    pub async fn import_tours(&self, path: &Path) -> Result<usize> {
        let raw = tokio::fs::read(path).await?;
        let tours: Vec<Document> = serde_json::from_slice(&raw)?;
        let imported = self
            .collections
            .tours
            .insert_many(tours)
            .await
            .map_err(|e| Error::Internal(format!("Tour seed {}: {}", path.display(), e)))?;

        tracing::info!(count = imported, path = %path.display(), "Imported tour seed");
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Collection;
    use std::io::Write;

    fn config() -> Config {
        let mut config = Config::default();
        config.jwt.secret = "state-test-secret".to_string();
        config
    }

    #[test]
    fn test_new_requires_hmac_algorithm() {
        let mut bad = config();
        bad.jwt.algorithm = "RS256".to_string();
        assert!(matches!(AppState::new(bad), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_seed_without_path_is_noop() {
        let state = AppState::new(config()).unwrap();
        assert_eq!(state.seed().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_tours_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "The Forest Hiker", "duration": 5, "maxGroupSize": 25, "difficulty": "easy",
                  "price": 397, "summary": "Forest", "imageCover": "tour-1-cover.jpg", "id": "legacy"}},
                {{"name": "The Sea Explorer", "duration": 7, "maxGroupSize": 15, "difficulty": "medium",
                  "price": 497, "summary": "Sea", "imageCover": "tour-2-cover.jpg"}}
            ]"#
        )
        .unwrap();

        let mut config = config();
        config.data.tours_seed = Some(file.path().to_path_buf());
        let state = AppState::new(config).unwrap();

        assert_eq!(state.seed().await.unwrap(), 2);
        assert_eq!(state.collections().tours.count_all(&[]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Half a tour"}}]"#).unwrap();

        let state = AppState::new(config()).unwrap();
        let err = state.import_tours(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Tour validation failed"));
    }
}

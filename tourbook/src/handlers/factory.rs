//! Uniform CRUD handlers over any [`Collection`]
//!
//! [`ResourceHandlers`] is built once per resource kind at wiring time and
//! shared read-only by every request for that kind. Route layers call its five
//! operations after doing their own resource-specific steps (scoping, body
//! defaults).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tourbook::handlers::ResourceHandlers;
//! use tourbook::query::QueryParams;
//!
//! let handlers = ResourceHandlers::new(Arc::new(tours)).expand_on_get(["reviews"]);
//! let page = handlers.list(&QueryParams::from_pairs([("difficulty", "easy")]), &[]).await?;
//! let one = handlers.get_one("0190a1b2-...").await?;
//! ```

use std::sync::Arc;

use axum::http::StatusCode;

use crate::query::{QueryBuilder, QueryParams, RESERVED_KEYS};
use crate::repository::{Collection, Document, FilterClause};

use super::error::{ApiError, ApiErrorKind, ApiOperation};
use super::response::{ItemResponse, ListResponse};

/// Hook applied to every document a handler returns
pub type PostProcess = Arc<dyn Fn(&mut Document) + Send + Sync>;

/// The five CRUD operations closed over one collection
pub struct ResourceHandlers<C> {
    collection: Arc<C>,
    expand_on_get: Arc<Vec<String>>,
    post_process: Option<PostProcess>,
}

impl<C> Clone for ResourceHandlers<C> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            expand_on_get: Arc::clone(&self.expand_on_get),
            post_process: self.post_process.clone(),
        }
    }
}

impl<C: Collection> ResourceHandlers<C> {
    /// Handlers over `collection` with no expansion and no hook
    pub fn new(collection: Arc<C>) -> Self {
        Self {
            collection,
            expand_on_get: Arc::new(Vec::new()),
            post_process: None,
        }
    }

    /// Relations eagerly expanded by [`get_one`](Self::get_one)
    #[must_use]
    pub fn expand_on_get<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand_on_get = Arc::new(relations.into_iter().map(Into::into).collect());
        self
    }

    /// Rewrite every returned document with `hook`
    #[must_use]
    pub fn with_post_process<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Document) + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(hook));
        self
    }

    /// The underlying collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    fn finish(&self, mut document: Document) -> Document {
        if let Some(hook) = &self.post_process {
            hook(&mut document);
        }
        document
    }

    fn not_found(&self, id: &str, operation: ApiOperation) -> ApiError {
        ApiError::not_found(C::SINGULAR, id).with_operation(operation)
    }

    /// List documents matching `params`, restricted by `scope`
    ///
    /// Runs filter, sort, limit_fields and paginate in that order. A page past
    /// the last matching document fails with NotFound; page 1 of an empty
    /// result is an empty success.
    pub async fn list(
        &self,
        params: &QueryParams,
        scope: &[FilterClause],
    ) -> Result<ListResponse, ApiError> {
        let built = QueryBuilder::new(self.collection.find_many(scope), params)
            .filter(&RESERVED_KEYS)
            .sort()
            .limit_fields()
            .paginate();

        if let Some(window) = built.window() {
            let skip = window.skip();
            if skip > 0 {
                let clauses: Vec<FilterClause> =
                    scope.iter().chain(built.filters()).cloned().collect();
                let total = self.collection.count_all(&clauses).await?;
                if skip >= total {
                    return Err(ApiError::new(
                        ApiOperation::List,
                        ApiErrorKind::NotFound,
                        "This page does not exist",
                    ));
                }
            }
        }

        let documents = built
            .execute()
            .await?
            .into_iter()
            .map(|doc| self.finish(doc))
            .collect();
        Ok(ListResponse::new(C::PLURAL, documents))
    }

    /// Fetch one document, expanding the configured relations
    pub async fn get_one(&self, id: &str) -> Result<ItemResponse, ApiError> {
        let document = self
            .collection
            .find_by_id(id, &self.expand_on_get)
            .await?
            .ok_or_else(|| self.not_found(id, ApiOperation::Get))?;
        Ok(ItemResponse::new(C::SINGULAR, self.finish(document)))
    }

    /// Validate and insert `body`
    pub async fn create_one(&self, body: Document) -> Result<ItemResponse, ApiError> {
        let document = self.collection.create(body).await?;
        Ok(ItemResponse::created(C::SINGULAR, self.finish(document)))
    }

    /// Merge `patch` into the document and re-validate it
    pub async fn update_one(&self, id: &str, patch: Document) -> Result<ItemResponse, ApiError> {
        let document = self
            .collection
            .update_by_id(id, patch)
            .await?
            .ok_or_else(|| self.not_found(id, ApiOperation::Update))?;
        Ok(ItemResponse::new(C::SINGULAR, self.finish(document)))
    }

    /// Remove the document; 204 with an empty body
    pub async fn delete_one(&self, id: &str) -> Result<StatusCode, ApiError> {
        self.collection
            .delete_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id, ApiOperation::Delete))?;
        Ok(StatusCode::NO_CONTENT)
    }
}

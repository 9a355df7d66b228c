//! In-memory document collection
//!
//! [`MemoryCollection`] keeps the documents of one resource kind in a
//! `BTreeMap` keyed by UUID v7 ids, so key order is insertion order. Writes
//! hold the lock for the whole operation; reads work on a snapshot and release
//! the lock before any relation is expanded.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Number, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::criteria::{
    parse_timestamp, FilterClause, FilterOperator, FilterValue, OrderDirection, Projection, Sort,
};
use super::error::{RepositoryError, RepositoryOperation};
use super::schema::{conform, Resource};
use super::traits::{
    Collection, Document, DocumentSource, QueryHandle, RepositoryResult, CREATED_AT_FIELD,
    ID_FIELD, VERSION_FIELD,
};

type Store = Arc<RwLock<BTreeMap<String, Document>>>;

/// A relation another collection can be expanded into
#[derive(Clone)]
pub enum Relation {
    /// `field` holds the id of a document in `source`; expansion replaces the
    /// id with that document, narrowed to `select` when non-empty
    BelongsTo {
        field: String,
        source: Arc<dyn DocumentSource>,
        select: Vec<String>,
    },
    /// Documents in `source` whose `foreign_field` holds this document's id,
    /// added as an array under `name`
    HasMany {
        name: String,
        source: Arc<dyn DocumentSource>,
        foreign_field: String,
    },
}

impl Relation {
    /// Reference to a parent document
    pub fn belongs_to<I, S>(field: impl Into<String>, source: Arc<dyn DocumentSource>, select: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::BelongsTo {
            field: field.into(),
            source,
            select: select.into_iter().map(Into::into).collect(),
        }
    }

    /// Reverse reference to child documents
    pub fn has_many(
        name: impl Into<String>,
        source: Arc<dyn DocumentSource>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self::HasMany {
            name: name.into(),
            source,
            foreign_field: foreign_field.into(),
        }
    }

    /// Name the relation is requested by
    pub fn name(&self) -> &str {
        match self {
            Self::BelongsTo { field, .. } => field,
            Self::HasMany { name, .. } => name,
        }
    }
}

/// Document collection for resource kind `R`
pub struct MemoryCollection<R> {
    documents: Store,
    relations: Arc<Vec<Relation>>,
    default_expansion: Arc<Vec<String>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for MemoryCollection<R> {
    fn clone(&self) -> Self {
        Self {
            documents: self.documents.clone(),
            relations: self.relations.clone(),
            default_expansion: self.default_expansion.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> MemoryCollection<R> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            relations: Arc::new(Vec::new()),
            default_expansion: Arc::new(Vec::new()),
            _resource: PhantomData,
        }
    }

    /// Register a relation that can be expanded by name
    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        Arc::make_mut(&mut self.relations).push(relation);
        self
    }

    /// Relations expanded on every read, in addition to requested ones
    #[must_use]
    pub fn with_default_expansion<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.default_expansion).extend(names.into_iter().map(Into::into));
        self
    }

    /// Insert many bodies, stopping at the first invalid one
    pub async fn insert_many(&self, bodies: Vec<Document>) -> RepositoryResult<usize> {
        let mut inserted = 0;
        for body in bodies {
            self.create(body).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Fetch a document with its hidden fields and without expansion
    pub async fn fetch_with_hidden(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    /// First document satisfying every clause, with its hidden fields
    pub async fn find_one_with_hidden(&self, clauses: &[FilterClause]) -> Option<Document> {
        self.documents
            .read()
            .await
            .values()
            .find(|doc| matches_all(doc, clauses))
            .cloned()
    }

    fn expansion_for(&self, requested: &[String]) -> Vec<String> {
        let mut names = self.default_expansion.as_ref().clone();
        for name in requested {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    async fn expand_document(&self, doc: &mut Document, names: &[String]) -> RepositoryResult<()> {
        for relation in self.relations.iter() {
            if !names.iter().any(|n| n == relation.name()) {
                continue;
            }
            match relation {
                Relation::BelongsTo {
                    field,
                    source,
                    select,
                } => {
                    let Some(Value::String(ref_id)) = doc.get(field).cloned() else {
                        continue;
                    };
                    // Dangling references stay as plain ids
                    if let Some(related) = source.lookup(&ref_id).await? {
                        let related = if select.is_empty() {
                            related
                        } else {
                            project(related, &Projection::Include(select.clone()))
                        };
                        doc.insert(field.clone(), Value::Object(related));
                    }
                }
                Relation::HasMany {
                    name,
                    source,
                    foreign_field,
                } => {
                    let Some(id) = doc.get(ID_FIELD).cloned() else {
                        continue;
                    };
                    let children = source.lookup_where(foreign_field, &id).await?;
                    doc.insert(
                        name.clone(),
                        Value::Array(children.into_iter().map(Value::Object).collect()),
                    );
                }
            }
        }
        Ok(())
    }

    fn present(doc: Document, projection: Option<&Projection>) -> Document {
        let mut doc = match projection {
            Some(projection) => project(doc, projection),
            None => doc,
        };
        for field in R::SECRET {
            doc.remove(*field);
        }
        for field in R::HIDDEN {
            if !projection.is_some_and(|p| p.includes(field)) {
                doc.remove(*field);
            }
        }
        doc
    }

    /// Whether any clause compares against a secret field
    fn filters_secret(clauses: &[FilterClause]) -> bool {
        clauses.iter().any(|c| R::SECRET.contains(&c.field.as_str()))
    }

    fn check_unique(
        store: &BTreeMap<String, Document>,
        doc: &Document,
        except: Option<&str>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<()> {
        for field in R::UNIQUE {
            let Some(value) = doc.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = store
                .iter()
                .any(|(id, other)| Some(id.as_str()) != except && other.get(*field) == Some(value));
            if clash {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(RepositoryError::already_exists(R::SINGULAR, shown).with_operation(operation));
            }
        }
        Ok(())
    }
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn is_system_field(field: &str) -> bool {
    field == ID_FIELD || field == VERSION_FIELD || field == CREATED_AT_FIELD
}

impl<R: Resource> Collection for MemoryCollection<R> {
    type Query = MemoryQuery<R>;
    const SINGULAR: &'static str = R::SINGULAR;
    const PLURAL: &'static str = R::PLURAL;

    fn find_many(&self, scope: &[FilterClause]) -> MemoryQuery<R> {
        MemoryQuery {
            collection: self.clone(),
            clauses: scope.to_vec(),
            sort: None,
            projection: None,
            window: None,
            expand: Vec::new(),
        }
    }

    async fn find_by_id(&self, id: &str, expand: &[String]) -> RepositoryResult<Option<Document>> {
        let Some(mut doc) = self.fetch_with_hidden(id).await else {
            return Ok(None);
        };
        self.expand_document(&mut doc, &self.expansion_for(expand))
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Expand))?;
        Ok(Some(Self::present(doc, None)))
    }

    async fn create(&self, mut body: Document) -> RepositoryResult<Document> {
        let created_at = body
            .remove(CREATED_AT_FIELD)
            .filter(|v| v.as_str().and_then(parse_timestamp).is_some())
            .unwrap_or_else(now_value);
        body.retain(|field, _| !is_system_field(field));

        let mut doc = conform::<R>(body, RepositoryOperation::Create)?;

        let mut store = self.documents.write().await;
        Self::check_unique(&store, &doc, None, RepositoryOperation::Create)?;
        let id = Uuid::now_v7().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        doc.insert(VERSION_FIELD.to_string(), Value::Number(Number::from(0)));
        doc.insert(CREATED_AT_FIELD.to_string(), created_at);
        store.insert(id, doc.clone());
        drop(store);

        Ok(Self::present(doc, None))
    }

    async fn update_by_id(&self, id: &str, patch: Document) -> RepositoryResult<Option<Document>> {
        let mut store = self.documents.write().await;
        let Some(existing) = store.get(id) else {
            return Ok(None);
        };

        let mut merged = existing.clone();
        let system: Vec<(String, Value)> = [ID_FIELD, VERSION_FIELD, CREATED_AT_FIELD]
            .iter()
            .filter_map(|field| merged.remove(*field).map(|v| (field.to_string(), v)))
            .collect();
        for (field, value) in patch {
            if !is_system_field(&field) {
                merged.insert(field, value);
            }
        }

        let mut doc = conform::<R>(merged, RepositoryOperation::Update)
            .map_err(|e| e.with_entity(R::SINGULAR, id))?;
        Self::check_unique(&store, &doc, Some(id), RepositoryOperation::Update)?;
        doc.extend(system);
        store.insert(id.to_string(), doc.clone());
        drop(store);

        Ok(Some(Self::present(doc, None)))
    }

    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Option<Document>> {
        let removed = self.documents.write().await.remove(id);
        Ok(removed.map(|doc| Self::present(doc, None)))
    }

    async fn count_all(&self, filter: &[FilterClause]) -> RepositoryResult<u64> {
        if Self::filters_secret(filter) {
            return Ok(0);
        }
        let store = self.documents.read().await;
        Ok(store.values().filter(|doc| matches_all(doc, filter)).count() as u64)
    }
}

#[async_trait]
impl<R: Resource> DocumentSource for MemoryCollection<R> {
    async fn lookup(&self, id: &str) -> RepositoryResult<Option<Document>> {
        self.find_by_id(id, &[]).await
    }

    async fn lookup_where(&self, field: &str, value: &Value) -> RepositoryResult<Vec<Document>> {
        let mut docs: Vec<Document> = {
            let store = self.documents.read().await;
            store
                .values()
                .filter(|doc| doc.get(field) == Some(value))
                .cloned()
                .collect()
        };
        let names = self.expansion_for(&[]);
        for doc in &mut docs {
            self.expand_document(doc, &names).await?;
        }
        Ok(docs.into_iter().map(|doc| Self::present(doc, None)).collect())
    }
}

/// Pending list query over a [`MemoryCollection`]
pub struct MemoryQuery<R> {
    collection: MemoryCollection<R>,
    clauses: Vec<FilterClause>,
    sort: Option<Sort>,
    projection: Option<Projection>,
    window: Option<(u64, u64)>,
    expand: Vec<String>,
}

impl<R: Resource> QueryHandle for MemoryQuery<R> {
    fn apply_filter(mut self, clauses: &[FilterClause]) -> Self {
        self.clauses.extend_from_slice(clauses);
        self
    }

    fn apply_sort(mut self, sort: &Sort) -> Self {
        self.sort = Some(sort.clone());
        self
    }

    fn apply_projection(mut self, projection: &Projection) -> Self {
        self.projection = Some(projection.clone());
        self
    }

    fn apply_skip_limit(mut self, skip: u64, limit: u64) -> Self {
        self.window = Some((skip, limit));
        self
    }

    fn expand(mut self, relations: &[String]) -> Self {
        self.expand.extend_from_slice(relations);
        self
    }

    async fn execute(self) -> RepositoryResult<Vec<Document>> {
        if MemoryCollection::<R>::filters_secret(&self.clauses) {
            return Ok(Vec::new());
        }
        let mut docs: Vec<Document> = {
            let store = self.collection.documents.read().await;
            store
                .values()
                .filter(|doc| matches_all(doc, &self.clauses))
                .cloned()
                .collect()
        };

        if let Some(sort) = &self.sort {
            let mut sort = sort.clone();
            sort.keys.retain(|key| !R::SECRET.contains(&key.field.as_str()));
            docs.sort_by(|a, b| compare_documents(a, b, &sort));
        }

        if let Some((skip, limit)) = self.window {
            let skip = usize::try_from(skip).unwrap_or(usize::MAX);
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            docs = docs.into_iter().skip(skip).take(limit).collect();
        }

        let names = self.collection.expansion_for(&self.expand);
        for doc in &mut docs {
            self.collection
                .expand_document(doc, &names)
                .await
                .map_err(|e| e.with_operation(RepositoryOperation::FindMany))?;
        }

        let projection = self.projection.as_ref();
        Ok(docs
            .into_iter()
            .map(|doc| MemoryCollection::<R>::present(doc, projection))
            .collect())
    }
}

/// Apply a projection; an include set always keeps the identifier
pub(crate) fn project(doc: Document, projection: &Projection) -> Document {
    match projection {
        Projection::Include(fields) => doc
            .into_iter()
            .filter(|(k, _)| k == ID_FIELD || fields.iter().any(|f| f == k))
            .collect(),
        Projection::Exclude(fields) => doc
            .into_iter()
            .filter(|(k, _)| !fields.iter().any(|f| f == k))
            .collect(),
    }
}

/// Whether `doc` satisfies every clause
pub(crate) fn matches_all(doc: &Document, clauses: &[FilterClause]) -> bool {
    clauses.iter().all(|clause| matches_clause(doc, clause))
}

fn matches_clause(doc: &Document, clause: &FilterClause) -> bool {
    match doc.get(&clause.field) {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => items.iter().any(|item| satisfies(item, clause)),
        Some(value) => satisfies(value, clause),
    }
}

fn satisfies(value: &Value, clause: &FilterClause) -> bool {
    let Some(ordering) = compare_to_filter(value, clause) else {
        return false;
    };
    match clause.operator {
        FilterOperator::Equal => ordering == Ordering::Equal,
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
    }
}

// None means the types are not comparable, which never matches
fn compare_to_filter(value: &Value, clause: &FilterClause) -> Option<Ordering> {
    match (value, &clause.value) {
        (Value::Number(n), FilterValue::Integer(i)) => match n.as_i64() {
            Some(v) => Some(v.cmp(i)),
            None => n.as_f64()?.partial_cmp(&(*i as f64)),
        },
        (Value::Number(n), FilterValue::Float(f)) => n.as_f64()?.partial_cmp(f),
        (Value::String(s), FilterValue::String(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::String(s), FilterValue::Date(d)) => match parse_timestamp(s) {
            Some(v) => Some(v.cmp(d)),
            None => clause.raw.as_deref().map(|raw| s.as_str().cmp(raw)),
        },
        // Other coerced values meet string fields as the text the client sent
        (Value::String(s), filter) => {
            let text = match (&clause.raw, filter) {
                (Some(raw), _) => raw.clone(),
                (None, FilterValue::Integer(i)) => i.to_string(),
                (None, FilterValue::Float(f)) => f.to_string(),
                (None, FilterValue::Boolean(b)) => b.to_string(),
                (None, _) => return None,
            };
            Some(s.as_str().cmp(text.as_str()))
        }
        (Value::Bool(b), FilterValue::Boolean(c)) => Some(b.cmp(c)),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (parse_timestamp(x), parse_timestamp(y)) {
                (Some(dx), Some(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &Sort) -> Ordering {
    for key in &sort.keys {
        let ordering = compare_values(a.get(&key.field), b.get(&key.field));
        let ordering = match key.direction {
            OrderDirection::Ascending => ordering,
            OrderDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Pagination, RepositoryErrorKind, FieldViolation};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Hike {
        name: String,
        price: f64,
        difficulty: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_note: Option<String>,
        #[serde(default)]
        start_dates: Vec<String>,
    }

    impl Resource for Hike {
        const MODEL: &'static str = "Hike";
        const SINGULAR: &'static str = "hike";
        const PLURAL: &'static str = "hikes";
        const REQUIRED: &'static [(&'static str, &'static str)] = &[
            ("name", "A hike must have a name"),
            ("price", "A hike must have a price"),
        ];
        const HIDDEN: &'static [&'static str] = &["secretNote"];
        const UNIQUE: &'static [&'static str] = &["name"];

        fn validate(&self) -> Vec<FieldViolation> {
            if self.price < 0.0 {
                vec![FieldViolation::new("price", "Price must be positive")]
            } else {
                Vec::new()
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Note {
        text: String,
        hike: String,
    }

    impl Resource for Note {
        const MODEL: &'static str = "Note";
        const SINGULAR: &'static str = "note";
        const PLURAL: &'static str = "notes";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Badge {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<String>,
    }

    impl Resource for Badge {
        const MODEL: &'static str = "Badge";
        const SINGULAR: &'static str = "badge";
        const PLURAL: &'static str = "badges";
        const SECRET: &'static [&'static str] = &["pin"];
    }

    async fn badges() -> MemoryCollection<Badge> {
        let badges = MemoryCollection::<Badge>::new();
        let bodies = vec![
            json!({"code": "007", "pin": "1234"}),
            json!({"code": "7", "pin": "9999"}),
            json!({"code": "+4912"}),
            json!({"code": "1.50"}),
            json!({"code": "true"}),
        ];
        badges
            .insert_many(bodies.into_iter().map(doc).collect())
            .await
            .unwrap();
        badges
    }

    fn codes(docs: &[Document]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.get("code").and_then(Value::as_str).unwrap_or_default())
            .collect()
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryCollection<Hike> {
        let hikes = MemoryCollection::<Hike>::new();
        let bodies = vec![
            json!({"name": "Forest", "price": 397, "difficulty": "easy", "secretNote": "shh"}),
            json!({"name": "Sea", "price": 497, "difficulty": "medium", "startDates": ["2021-06-19", "2021-07-20"]}),
            json!({"name": "Snow", "price": 997, "difficulty": "difficult"}),
            json!({"name": "City", "price": 497, "difficulty": "easy"}),
            json!({"name": "Park", "price": 1497, "difficulty": "medium"}),
        ];
        hikes
            .insert_many(bodies.into_iter().map(doc).collect())
            .await
            .unwrap();
        hikes
    }

    fn names(docs: &[Document]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_create_stamps_system_fields_and_hides() {
        let hikes = MemoryCollection::<Hike>::new();
        let created = hikes
            .create(doc(json!({"name": "Forest", "price": 10, "difficulty": "easy", "secretNote": "x", "junk": true})))
            .await
            .unwrap();
        assert!(created.get(ID_FIELD).and_then(Value::as_str).is_some());
        assert_eq!(created.get(VERSION_FIELD), Some(&json!(0)));
        assert!(created.get(CREATED_AT_FIELD).is_some());
        assert!(created.get("secretNote").is_none());
        assert!(created.get("junk").is_none());

        let id = created[ID_FIELD].as_str().unwrap();
        let raw = hikes.fetch_with_hidden(id).await.unwrap();
        assert_eq!(raw.get("secretNote"), Some(&json!("x")));
    }

    #[tokio::test]
    async fn test_create_missing_required_field() {
        let hikes = MemoryCollection::<Hike>::new();
        let err = hikes
            .create(doc(json!({"price": 10, "difficulty": "easy"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
        assert!(err.message.contains("name: A hike must have a name"));
    }

    #[tokio::test]
    async fn test_unique_field_rejected() {
        let hikes = seeded().await;
        let err = hikes
            .create(doc(json!({"name": "Forest", "price": 1, "difficulty": "easy"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert_eq!(err.message, "Duplicate field value: Forest. Please use another value!");
    }

    #[tokio::test]
    async fn test_filter_sort_limit() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[])
            .apply_filter(&[FilterClause::eq("difficulty", "easy")])
            .apply_sort(&Sort::descending("price").then_ascending("name"))
            .apply_skip_limit(0, 2)
            .execute()
            .await
            .unwrap();
        assert_eq!(names(&docs), vec!["City", "Forest"]);
    }

    #[tokio::test]
    async fn test_sort_tie_break_uses_second_key() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[])
            .apply_filter(&[FilterClause::eq("price", 497_i64)])
            .apply_sort(&Sort::ascending("name"))
            .execute()
            .await
            .unwrap();
        assert_eq!(names(&docs), vec!["City", "Sea"]);
    }

    #[tokio::test]
    async fn test_range_filters() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[])
            .apply_filter(&[FilterClause::gte("price", 497_i64), FilterClause::lt("price", 1000.5)])
            .apply_sort(&Sort::ascending("price").then_ascending("name"))
            .execute()
            .await
            .unwrap();
        assert_eq!(names(&docs), vec!["City", "Sea", "Snow"]);
    }

    #[tokio::test]
    async fn test_array_field_matches_any_element() {
        let hikes = seeded().await;
        let date = parse_timestamp("2021-07-01").unwrap();
        let docs = hikes
            .find_many(&[])
            .apply_filter(&[FilterClause::gte("startDates", date)])
            .execute()
            .await
            .unwrap();
        assert_eq!(names(&docs), vec!["Sea"]);
    }

    #[tokio::test]
    async fn test_mismatched_types_never_match() {
        let hikes = seeded().await;
        let count = hikes
            .count_all(&[FilterClause::eq("price", "cheap")])
            .await
            .unwrap();
        assert_eq!(count, 0);
        let count = hikes
            .count_all(&[FilterClause::eq("unknownField", "x")])
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_include_projection_keeps_id() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[])
            .apply_projection(&Projection::include(["name", "price"]))
            .execute()
            .await
            .unwrap();
        for d in &docs {
            let mut keys: Vec<&str> = d.keys().map(String::as_str).collect();
            keys.sort_unstable();
            assert_eq!(keys, vec!["_id", "name", "price"]);
        }
    }

    #[tokio::test]
    async fn test_hidden_field_selected_explicitly() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[FilterClause::eq("name", "Forest")])
            .apply_projection(&Projection::include(["secretNote"]))
            .execute()
            .await
            .unwrap();
        assert_eq!(docs[0].get("secretNote"), Some(&json!("shh")));
    }

    #[tokio::test]
    async fn test_exclude_projection() {
        let hikes = seeded().await;
        let docs = hikes
            .find_many(&[])
            .apply_projection(&Projection::exclude([VERSION_FIELD]))
            .execute()
            .await
            .unwrap();
        assert_eq!(docs.len(), 5);
        assert!(docs.iter().all(|d| d.get(VERSION_FIELD).is_none()));
        assert!(docs.iter().all(|d| d.get("difficulty").is_some()));
    }

    #[tokio::test]
    async fn test_pages_over_twenty_five_documents() {
        let hikes = MemoryCollection::<Hike>::new();
        for i in 1..=25 {
            hikes
                .create(doc(json!({"name": format!("hike-{:02}", i), "price": i, "difficulty": "easy"})))
                .await
                .unwrap();
        }
        let page = Pagination::new(3, 10);
        let docs = hikes
            .find_many(&[])
            .apply_sort(&Sort::ascending("price"))
            .apply_skip_limit(page.skip(), page.limit)
            .execute()
            .await
            .unwrap();
        assert_eq!(docs.len(), 5);
        assert_eq!(docs[0]["name"], json!("hike-21"));
        assert_eq!(docs[4]["name"], json!("hike-25"));
    }

    #[tokio::test]
    async fn test_repeated_query_is_stable() {
        let hikes = seeded().await;
        let run = || {
            hikes
                .find_many(&[])
                .apply_sort(&Sort::descending("price"))
                .execute()
        };
        let first = run().await.unwrap();
        let second = run().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["Park", "Snow", "Sea", "City", "Forest"]);
    }

    #[tokio::test]
    async fn test_update_merges_and_revalidates() {
        let hikes = seeded().await;
        let forest = hikes
            .find_one_with_hidden(&[FilterClause::eq("name", "Forest")])
            .await
            .unwrap();
        let id = forest[ID_FIELD].as_str().unwrap().to_string();

        let updated = hikes
            .update_by_id(&id, doc(json!({"price": 450, "_id": "hijack"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["price"], json!(450.0));
        assert_eq!(updated["difficulty"], json!("easy"));
        assert_eq!(updated[ID_FIELD], json!(id));

        let err = hikes
            .update_by_id(&id, doc(json!({"price": -1})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
        assert_eq!(err.operation, RepositoryOperation::Update);

        let err = hikes
            .update_by_id(&id, doc(json!({"name": "Snow"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);

        assert!(hikes.update_by_id("missing", Document::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let hikes = seeded().await;
        let created = hikes
            .create(doc(json!({"name": "Gone", "price": 1, "difficulty": "easy"})))
            .await
            .unwrap();
        let id = created[ID_FIELD].as_str().unwrap();
        assert!(hikes.delete_by_id(id).await.unwrap().is_some());
        assert!(hikes.delete_by_id(id).await.unwrap().is_none());
        assert_eq!(hikes.count_all(&[]).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_relations_expand() {
        let hikes = seeded().await;
        let notes = MemoryCollection::<Note>::new().with_relation(Relation::belongs_to(
            "hike",
            Arc::new(hikes.clone()),
            ["name"],
        ));
        let forest = hikes
            .find_one_with_hidden(&[FilterClause::eq("name", "Forest")])
            .await
            .unwrap();
        let forest_id = forest[ID_FIELD].clone();
        notes
            .create(doc(json!({"text": "lovely", "hike": forest_id})))
            .await
            .unwrap();

        let hikes = hikes.with_relation(Relation::has_many("notes", Arc::new(notes.clone()), "hike"));
        let id = forest_id.as_str().unwrap();

        let plain = hikes.find_by_id(id, &[]).await.unwrap().unwrap();
        assert!(plain.get("notes").is_none());

        let expanded = hikes
            .find_by_id(id, &["notes".to_string()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expanded["notes"].as_array().map(Vec::len), Some(1));

        let listed = notes
            .find_many(&[])
            .expand(&["hike".to_string()])
            .execute()
            .await
            .unwrap();
        let hike = listed[0]["hike"].as_object().unwrap();
        let mut keys: Vec<&str> = hike.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["_id", "name"]);
    }

    #[tokio::test]
    async fn test_default_expansion_applies_to_every_read() {
        let hikes = seeded().await;
        let forest = hikes
            .find_one_with_hidden(&[FilterClause::eq("name", "Forest")])
            .await
            .unwrap();
        let notes = MemoryCollection::<Note>::new()
            .with_relation(Relation::belongs_to("hike", Arc::new(hikes.clone()), ["name"]))
            .with_default_expansion(["hike"]);
        let created = notes
            .create(doc(json!({"text": "ok", "hike": forest[ID_FIELD].clone()})))
            .await
            .unwrap();
        let id = created[ID_FIELD].as_str().unwrap();
        let found = notes.find_by_id(id, &[]).await.unwrap().unwrap();
        assert_eq!(found["hike"]["name"], json!("Forest"));
    }

    #[tokio::test]
    async fn test_string_field_matches_the_text_sent() {
        use crate::query::{filter_clauses, QueryParams, RESERVED_KEYS};

        let badges = badges().await;
        for code in ["007", "7", "+4912", "1.50", "true"] {
            let params = QueryParams::from_pairs([("code", code)]);
            let clauses = filter_clauses(&params, &RESERVED_KEYS);
            let found = badges.find_many(&[]).apply_filter(&clauses).execute().await.unwrap();
            assert_eq!(codes(&found), vec![code], "code={code}");
        }
    }

    #[tokio::test]
    async fn test_secret_fields_never_leave_the_collection() {
        let badges = badges().await;
        let projected = badges
            .find_many(&[])
            .apply_projection(&Projection::include(["code", "pin"]))
            .execute()
            .await
            .unwrap();
        assert_eq!(projected.len(), 5);
        assert!(projected.iter().all(|d| d.get("pin").is_none()));

        let guesses = [FilterClause::new("pin", FilterOperator::GreaterThanOrEqual, FilterValue::String("1".into()))];
        let matched = badges.find_many(&[]).apply_filter(&guesses).execute().await.unwrap();
        assert!(matched.is_empty());
        assert_eq!(badges.count_all(&guesses).await.unwrap(), 0);

        let raw = badges
            .find_one_with_hidden(&[FilterClause::eq("code", "007")])
            .await
            .unwrap();
        assert_eq!(raw.get("pin"), Some(&json!("1234")));
    }
}

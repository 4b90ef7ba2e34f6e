//! In-memory [`RecordStore`] for tests.
//!
//! Behaves like a small PocketBase: generated ids and system fields,
//! `field = "value"` filters joined with `&&`, sorting, paging, relation
//! expansion for `shops.owner` and `products.shop`, unique auth emails and
//! 404s for unknown collections. Every trait call is recorded so tests can
//! assert exactly which remote calls an action made.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value, json};
use url::Url;

use super::pocketbase::stored_file_name;
use super::types::file_url;
use super::{
    ListQuery, ListResult, PRODUCTS, Record, RecordBody, RecordStore, SHOPS, SchemaRepair,
    StoreError, USERS,
};

const BASE_URL: &str = "http://memory.test";
/// First `created` timestamp handed out; each record is one second later.
const EPOCH_SECONDS: i64 = 1_735_689_600;
/// Fields an auth collection accepts but never returns.
const WRITE_ONLY_FIELDS: [&str; 2] = ["password", "passwordConfirm"];
/// `(collection, field, target collection)` for expandable relations.
const RELATIONS: [(&str, &str, &str); 2] = [(SHOPS, "owner", USERS), (PRODUCTS, "shop", SHOPS)];

/// Kind of store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Update,
    List,
    Delete,
    RepairSchema,
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub collection: String,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    op: StoreOp,
    collection: String,
    status: u16,
    message: String,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Vec<Record>>,
    passwords: HashMap<(String, String), String>,
    calls: Vec<StoreCall>,
    failures: VecDeque<InjectedFailure>,
    sequence: i64,
}

/// In-memory record store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    base_url: Url,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store with `users`, `_superusers`, `shops` and `products`.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::without_schema();
        store.add_collections(&[SHOPS, PRODUCTS]);
        store
    }

    /// A store holding only the auth collections, as a backend whose schema
    /// was never imported.
    #[must_use]
    pub fn without_schema() -> Self {
        // BASE_URL is a constant absolute http URL, so parsing cannot fail.
        #[allow(clippy::expect_used)]
        let base_url = Url::parse(BASE_URL).expect("BASE_URL is an absolute URL");
        let store = Self {
            state: Arc::new(Mutex::new(State::default())),
            base_url,
        };
        store.add_collections(&[USERS, mercado_core::SUPERUSER_COLLECTION]);
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_collections(&self, names: &[&str]) {
        let mut state = self.lock();
        for name in names {
            state.collections.entry((*name).to_owned()).or_default();
        }
    }

    /// Insert a record directly, without logging a call.
    ///
    /// # Panics
    ///
    /// Panics if `fields` is not an object or the collection does not exist.
    #[must_use]
    pub fn insert(&self, collection: &str, fields: Value) -> Record {
        let Value::Object(fields) = fields else {
            panic!("seed record must be a JSON object");
        };
        let mut state = self.lock();
        match insert_record(&mut state, collection, fields) {
            Ok(record) => record,
            Err(e) => panic!("seeding {collection} failed: {e}"),
        }
    }

    /// Every call made through [`RecordStore`] or [`SchemaRepair`], in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind.
    #[must_use]
    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next `op` on `collection` fail with a 400 and `message`.
    pub fn fail_next(&self, op: StoreOp, collection: &str, message: &str) {
        self.lock().failures.push_back(InjectedFailure {
            op,
            collection: collection.to_owned(),
            status: 400,
            message: message.to_owned(),
        });
    }

    /// All records of a collection in insertion order.
    #[must_use]
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Password set when an auth record was created.
    #[must_use]
    pub fn password_of(&self, collection: &str, id: &str) -> Option<String> {
        self.lock()
            .passwords
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
    }
}

/// Log the call and pop a matching injected failure, if any.
fn begin(state: &mut State, op: StoreOp, collection: &str) -> Result<(), StoreError> {
    state.calls.push(StoreCall {
        op,
        collection: collection.to_owned(),
    });
    let position = state
        .failures
        .iter()
        .position(|f| f.op == op && f.collection == collection);
    if let Some(failure) = position.and_then(|i| state.failures.remove(i)) {
        return Err(StoreError::Api {
            status: failure.status,
            message: failure.message,
            data: Value::Null,
        });
    }
    Ok(())
}

fn missing_collection(collection: &str) -> StoreError {
    StoreError::NotFound(format!("Missing collection context ({collection})."))
}

fn is_auth_collection(collection: &str) -> bool {
    collection == USERS || collection == mercado_core::SUPERUSER_COLLECTION
}

fn insert_record(
    state: &mut State,
    collection: &str,
    mut fields: Map<String, Value>,
) -> Result<Record, StoreError> {
    if !state.collections.contains_key(collection) {
        return Err(missing_collection(collection));
    }

    let password = if is_auth_collection(collection) {
        let email = fields.get("email").and_then(Value::as_str).unwrap_or_default();
        let taken = state
            .collections
            .get(collection)
            .is_some_and(|records| records.iter().any(|r| r.get("email").and_then(Value::as_str) == Some(email)));
        if email.is_empty() || taken {
            return Err(StoreError::Api {
                status: 400,
                message: "Failed to create record.".to_owned(),
                data: json!({"email": {"code": "validation_invalid_email", "message": "Invalid or already used email."}}),
            });
        }
        let password = fields.get("password").and_then(Value::as_str).map(ToOwned::to_owned);
        for field in WRITE_ONLY_FIELDS {
            fields.remove(field);
        }
        password
    } else {
        None
    };

    state.sequence += 1;
    let id = format!("r{:014}", state.sequence);
    let created = DateTime::from_timestamp(EPOCH_SECONDS + state.sequence, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string())
        .unwrap_or_default();

    let mut record = Record::new();
    record.insert("id".to_owned(), json!(id));
    record.insert("collectionId".to_owned(), json!(format!("pbc_{collection}")));
    record.insert("collectionName".to_owned(), json!(collection));
    record.insert("created".to_owned(), json!(created));
    record.insert("updated".to_owned(), json!(created));
    record.extend(fields);

    if let Some(password) = password {
        state
            .passwords
            .insert((collection.to_owned(), id), password);
    }
    if let Some(records) = state.collections.get_mut(collection) {
        records.push(record.clone());
    }
    Ok(record)
}

/// Merge multipart files into the fields as their file names.
fn flatten_body(body: RecordBody) -> Map<String, Value> {
    let mut fields = body.fields;
    for upload in body.files {
        fields.insert(upload.field, Value::String(upload.file_name));
    }
    fields
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Comparison {
    Eq,
    NotEq,
}

#[derive(Debug, PartialEq, Eq)]
struct Clause {
    field: String,
    comparison: Comparison,
    value: String,
}

fn invalid_filter(filter: &str) -> StoreError {
    StoreError::Api {
        status: 400,
        message: "Invalid filter parameters.".to_owned(),
        data: json!({ "filter": filter }),
    }
}

/// Parse `field = "value" && field != 'value'`.
fn parse_filter(filter: &str) -> Result<Vec<Clause>, StoreError> {
    let mut clauses = Vec::new();
    let mut rest = filter.trim();

    while !rest.is_empty() {
        let op_start = rest
            .find(['=', '!'])
            .ok_or_else(|| invalid_filter(filter))?;
        let field = rest.get(..op_start).unwrap_or_default().trim().to_owned();
        let after_field = rest.get(op_start..).unwrap_or_default();
        let (comparison, after_op) = if let Some(r) = after_field.strip_prefix("!=") {
            (Comparison::NotEq, r)
        } else if let Some(r) = after_field.strip_prefix('=') {
            (Comparison::Eq, r)
        } else {
            return Err(invalid_filter(filter));
        };
        if field.is_empty() {
            return Err(invalid_filter(filter));
        }

        let (value, after_value) = parse_literal(after_op.trim_start()).ok_or_else(|| invalid_filter(filter))?;
        clauses.push(Clause {
            field,
            comparison,
            value,
        });

        rest = after_value.trim_start();
        if rest.is_empty() {
            break;
        }
        rest = rest
            .strip_prefix("&&")
            .ok_or_else(|| invalid_filter(filter))?
            .trim_start();
        if rest.is_empty() {
            return Err(invalid_filter(filter));
        }
    }

    Ok(clauses)
}

/// Parse a quoted literal; returns the unescaped value and the remainder.
fn parse_literal(input: &str) -> Option<(String, &str)> {
    let mut chars = input.char_indices();
    let (_, quote) = chars.next().filter(|(_, c)| matches!(c, '"' | '\''))?;
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some((value, input.get(i + c.len_utf8()..)?));
        } else {
            value.push(c);
        }
    }
    None
}

fn field_text(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn matches(record: &Record, clauses: &[Clause]) -> bool {
    clauses.iter().all(|clause| {
        let equal = field_text(record, &clause.field) == clause.value;
        match clause.comparison {
            Comparison::Eq => equal,
            Comparison::NotEq => !equal,
        }
    })
}

fn sort_records(records: &mut [Record], sort: &str) {
    for key in sort.split(',').rev().map(str::trim).filter(|k| !k.is_empty()) {
        let (field, descending) = key
            .strip_prefix('-')
            .map_or((key.trim_start_matches('+'), false), |f| (f, true));
        records.sort_by(|a, b| {
            let ordering = field_text(a, field).cmp(&field_text(b, field));
            if descending { ordering.reverse() } else { ordering }
        });
    }
}

fn expand_relations(state: &State, collection: &str, record: &mut Record, expand: &str) {
    let mut expanded = Map::new();
    for name in expand.split(',').map(str::trim) {
        let Some((_, field, target)) = RELATIONS
            .iter()
            .find(|(c, f, _)| *c == collection && *f == name)
        else {
            continue;
        };
        let id = field_text(record, field);
        let related = state
            .collections
            .get(*target)
            .and_then(|records| records.iter().find(|r| field_text(r, "id") == id));
        if let Some(related) = related {
            expanded.insert((*field).to_owned(), Value::Object(related.clone()));
        }
    }
    if !expanded.is_empty() {
        record.insert("expand".to_owned(), Value::Object(expanded));
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, collection: &str, body: RecordBody) -> Result<Record, StoreError> {
        let mut state = self.lock();
        begin(&mut state, StoreOp::Create, collection)?;
        insert_record(&mut state, collection, flatten_body(body))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        body: RecordBody,
    ) -> Result<Record, StoreError> {
        let mut state = self.lock();
        begin(&mut state, StoreOp::Update, collection)?;
        let records = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        let record = records
            .iter_mut()
            .find(|r| field_text(r, "id") == id)
            .ok_or_else(|| StoreError::NotFound("The requested resource wasn't found.".to_owned()))?;
        let mut fields = flatten_body(body);
        for system in ["id", "collectionId", "collectionName", "created"] {
            fields.remove(system);
        }
        record.extend(fields);
        Ok(record.clone())
    }

    async fn list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Record>, StoreError> {
        let mut state = self.lock();
        begin(&mut state, StoreOp::List, collection)?;
        let records = state
            .collections
            .get(collection)
            .ok_or_else(|| missing_collection(collection))?;

        let clauses = match query.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(filter) => parse_filter(filter)?,
            None => Vec::new(),
        };
        let mut matched: Vec<Record> = records
            .iter()
            .filter(|r| matches(r, &clauses))
            .cloned()
            .collect();
        if let Some(sort) = &query.sort {
            sort_records(&mut matched, sort);
        }

        let per_page = query.per_page.max(1);
        let page = query.page.max(1);
        let total_items = i64::try_from(matched.len()).unwrap_or(i64::MAX);
        let total_pages = (total_items + i64::from(per_page) - 1) / i64::from(per_page);
        let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(usize::MAX);

        let mut items: Vec<Record> = matched.into_iter().skip(skip).take(take).collect();
        if let Some(expand) = &query.expand {
            for item in &mut items {
                expand_relations(&state, collection, item, expand);
            }
        }

        Ok(ListResult {
            page,
            per_page,
            total_items: if query.skip_total { -1 } else { total_items },
            total_pages: if query.skip_total { -1 } else { total_pages },
            items,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        begin(&mut state, StoreOp::Delete, collection)?;
        let records = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        let before = records.len();
        records.retain(|r| field_text(r, "id") != id);
        if records.len() == before {
            return Err(StoreError::NotFound(
                "The requested resource wasn't found.".to_owned(),
            ));
        }
        Ok(())
    }

    fn file_url(&self, record: &Record, field: &str) -> Option<String> {
        let filename = stored_file_name(record, field)?;
        let record_id = record.get("id")?.as_str()?;
        let collection = record.get("collectionId")?.as_str()?;
        file_url(&self.base_url, collection, record_id, filename)
            .ok()
            .map(String::from)
    }
}

#[async_trait]
impl SchemaRepair for MemoryStore {
    async fn repair_schema(&self) -> Result<String, StoreError> {
        {
            let mut state = self.lock();
            begin(&mut state, StoreOp::RepairSchema, "")?;
        }
        self.add_collections(&[SHOPS, PRODUCTS]);
        Ok("Collections imported.".to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let clauses = parse_filter(r#"shop = "s1" && name != 'Caja \'x\''"#).unwrap();
        assert_eq!(
            clauses,
            vec![
                Clause {
                    field: "shop".to_owned(),
                    comparison: Comparison::Eq,
                    value: "s1".to_owned(),
                },
                Clause {
                    field: "name".to_owned(),
                    comparison: Comparison::NotEq,
                    value: "Caja 'x'".to_owned(),
                },
            ]
        );
        assert!(parse_filter("shop").is_err());
        assert!(parse_filter(r#"shop = "s1" &&"#).is_err());
        assert!(parse_filter(r#"shop = "s1"#).is_err());
    }

    #[test]
    fn test_escaped_quote_matches_literally() {
        let filter = super::super::filter::eq("email", r#"x" || id != ""#);
        let clauses = parse_filter(&filter).unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses.first().unwrap().value, r#"x" || id != ""#);
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let store = MemoryStore::new();
        let a = store
            .create(SHOPS, RecordBody::new().field("name", "A"))
            .await
            .unwrap();
        store
            .create(SHOPS, RecordBody::new().field("name", "B"))
            .await
            .unwrap();

        let page = store
            .list(SHOPS, &ListQuery::page(1, 10).sort("-created"))
            .await
            .unwrap();
        let names: Vec<String> = page.items.iter().map(|r| field_text(r, "name")).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(page.total_items, 2);

        store.delete(SHOPS, a["id"].as_str().unwrap()).await.unwrap();
        assert_eq!(store.records(SHOPS).len(), 1);
        assert!(store.delete(SHOPS, "missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_paging() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let _ = store.insert(SHOPS, json!({"name": format!("S{i}")}));
        }
        let page = store.list(SHOPS, &ListQuery::page(2, 2)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(field_text(page.items.first().unwrap(), "name"), "S2");
    }

    #[tokio::test]
    async fn test_auth_records_hide_password_and_reject_duplicates() {
        let store = MemoryStore::new();
        let body = RecordBody::new()
            .field("email", "o@x.co")
            .field("password", "1234567890")
            .field("passwordConfirm", "1234567890");
        let user = store.create(USERS, body.clone()).await.unwrap();
        assert!(!user.contains_key("password"));
        assert_eq!(
            store.password_of(USERS, user["id"].as_str().unwrap()).as_deref(),
            Some("1234567890")
        );
        assert!(matches!(
            store.create(USERS, body).await,
            Err(StoreError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_expand_owner() {
        let store = MemoryStore::new();
        let owner = store.insert(USERS, json!({"email": "o@x.co"}));
        let _ = store.insert(SHOPS, json!({"name": "A", "owner": owner["id"]}));
        let page = store
            .list(SHOPS, &ListQuery::default().expand("owner"))
            .await
            .unwrap();
        let item = page.items.first().unwrap();
        assert_eq!(item["expand"]["owner"]["email"], "o@x.co");
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_log() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Create, SHOPS, "boom");
        let err = store
            .create(SHOPS, RecordBody::new().field("name", "A"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(store.records(SHOPS).is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall {
                op: StoreOp::Create,
                collection: SHOPS.to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_collection_and_repair() {
        let store = MemoryStore::without_schema();
        assert!(store.list(SHOPS, &ListQuery::default()).await.unwrap_err().is_not_found());
        store.repair_schema().await.unwrap();
        assert!(store.list(SHOPS, &ListQuery::default()).await.unwrap().is_empty());
    }

    #[test]
    fn test_file_url() {
        let store = MemoryStore::new();
        let record = store.insert(PRODUCTS, json!({"name": "P", "image": "p.png"}));
        let url = store.file_url(&record, "image").unwrap();
        assert!(url.starts_with("http://memory.test/api/files/pbc_products/"));
        assert!(url.ends_with("/p.png"));
    }
}

//! PocketBase REST client.
//!
//! # API Reference
//!
//! - Records: `/api/collections/{collection}/records[/{id}]`
//! - Auth: `POST /api/collections/{users|_superusers}/auth-with-password`
//! - Files: `/api/files/{collectionId}/{recordId}/{filename}`
//! - Authentication: `Authorization: <token>` from the current session
//! - Errors: `{"status": 400, "message": "...", "data": {...}}`

use std::sync::Arc;

use async_trait::async_trait;
use mercado_core::PrincipalRole;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use super::types::file_url;
use super::{ListQuery, ListResult, Record, RecordBody, RecordStore, SchemaRepair, StoreError};
use crate::session::{AuthSession, SessionHandle};

/// Diagnostic endpoint that re-imports the backend's collections.
const FIX_SCHEMA_PATH: [&str; 2] = ["api", "fix-schema"];

/// PocketBase API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct PocketBaseClient {
    inner: Arc<PocketBaseClientInner>,
}

struct PocketBaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionHandle,
}

impl PocketBaseClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url, session: SessionHandle) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mercado/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(PocketBaseClientInner {
                client,
                base_url,
                session,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Session whose token authorizes every request.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// Log in against the auth collection of `role` and store the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the credentials are rejected or the response
    /// is not an auth response.
    #[instrument(skip(self, password), fields(collection = role.collection_name()))]
    pub async fn authenticate(
        &self,
        role: PrincipalRole,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, StoreError> {
        let url = self.endpoint(&[
            "api",
            "collections",
            role.collection_name(),
            "auth-with-password",
        ])?;
        let body = json!({
            "identity": email,
            "password": password.expose_secret(),
        });
        let response = self.inner.client.post(url).json(&body).send().await?;
        let value: Value = self.handle_response(response).await?;

        let session =
            AuthSession::from_auth_response(&value).map_err(|e| StoreError::Parse(e.to_string()))?;
        self.inner.session.login(session.clone());
        tracing::info!(user = %session.principal().id, "authenticated");
        Ok(session)
    }

    /// Build an endpoint URL below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn records_url(&self, collection: &str, id: Option<&str>) -> Result<Url, StoreError> {
        match id {
            Some(id) => self.endpoint(&["api", "collections", collection, "records", id]),
            None => self.endpoint(&["api", "collections", collection, "records"]),
        }
    }

    /// Start a request carrying the session token, if any.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.inner.session.token() {
            Some(token) => builder.header(AUTHORIZATION, token.expose_secret()),
            None => builder,
        }
    }

    /// Send a record body as JSON, or as multipart when it carries files.
    async fn send_body(
        &self,
        method: Method,
        url: Url,
        body: RecordBody,
    ) -> Result<Record, StoreError> {
        let builder = self.request(method, url);
        let builder = if body.is_multipart() {
            builder.multipart(multipart_form(body)?)
        } else {
            builder.json(&body.fields)
        };
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, StoreError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| StoreError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse an error response body into a [`StoreError`].
    async fn parse_error(&self, response: Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let (message, data) = parse_error_body(status, &text);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            _ => StoreError::Api {
                status: status.as_u16(),
                message,
                data,
            },
        }
    }
}

/// Extract `message` and `data` from an error body, falling back to the raw
/// text or the status reason.
fn parse_error_body(status: StatusCode, text: &str) -> (String, Value) {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_owned()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        });
    let data = parsed
        .and_then(|mut v| v.get_mut("data").map(Value::take))
        .unwrap_or(Value::Null);
    (message, data)
}

/// Convert a record body into a multipart form.
fn multipart_form(body: RecordBody) -> Result<Form, StoreError> {
    let mut form = Form::new();
    for (name, value) in &body.fields {
        form = form.text(name.clone(), RecordBody::multipart_text(value));
    }
    for upload in body.files {
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = upload.mime {
            part = part
                .mime_str(&mime)
                .map_err(|e| StoreError::Parse(format!("invalid MIME type '{mime}': {e}")))?;
        }
        form = form.part(upload.field, part);
    }
    Ok(form)
}

/// First file name stored in `field` (single or multi-file field).
pub(super) fn stored_file_name<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    let name = match record.get(field)? {
        Value::String(name) => name.as_str(),
        Value::Array(names) => names.first()?.as_str()?,
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    #[instrument(skip(self, body), fields(multipart = body.is_multipart()))]
    async fn create(&self, collection: &str, body: RecordBody) -> Result<Record, StoreError> {
        let url = self.records_url(collection, None)?;
        self.send_body(Method::POST, url, body).await
    }

    #[instrument(skip(self, body), fields(multipart = body.is_multipart()))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        body: RecordBody,
    ) -> Result<Record, StoreError> {
        let url = self.records_url(collection, Some(id))?;
        self.send_body(Method::PATCH, url, body).await
    }

    #[instrument(skip(self, query), fields(page = query.page, filter = query.filter.as_deref()))]
    async fn list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Record>, StoreError> {
        let mut url = self.records_url(collection, None)?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        let response = self.request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.records_url(collection, Some(id))?;
        let response = self.request(Method::DELETE, url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(self.parse_error(response).await)
    }

    fn file_url(&self, record: &Record, field: &str) -> Option<String> {
        let filename = stored_file_name(record, field)?;
        let record_id = record.get("id")?.as_str()?;
        let collection = record
            .get("collectionId")
            .or_else(|| record.get("collectionName"))?
            .as_str()?;
        file_url(&self.inner.base_url, collection, record_id, filename)
            .ok()
            .map(String::from)
    }
}

#[async_trait]
impl SchemaRepair for PocketBaseClient {
    #[instrument(skip(self))]
    async fn repair_schema(&self) -> Result<String, StoreError> {
        let url = self.endpoint(&FIX_SCHEMA_PATH)?;
        let response = self.request(Method::POST, url).send().await?;
        let value: Value = self.handle_response(response).await?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), ToOwned::to_owned))
    }
}

impl std::fmt::Debug for PocketBaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.session.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::UserId;
    use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::{SystemCheck, SystemStatus};
    use crate::session::Principal;
    use crate::store::{FileUpload, PRODUCTS, SHOPS};

    fn client(base: &str) -> PocketBaseClient {
        PocketBaseClient::new(Url::parse(base).unwrap(), SessionHandle::new()).unwrap()
    }

    fn client_for(server: &MockServer, session: SessionHandle) -> PocketBaseClient {
        PocketBaseClient::new(Url::parse(&server.uri()).unwrap(), session).unwrap()
    }

    fn owner_session(token: &str) -> SessionHandle {
        SessionHandle::with_session(AuthSession::new(
            SecretString::from(token),
            Principal {
                id: UserId::new("u1"),
                email: "pati@mercado.test".to_owned(),
                role: PrincipalRole::User,
            },
        ))
    }

    fn empty_page() -> Value {
        json!({"page": 1, "perPage": 1, "totalItems": 0, "totalPages": 0, "items": []})
    }

    #[test]
    fn test_records_url() {
        let pb = client("http://127.0.0.1:8090");
        assert_eq!(
            pb.records_url("shops", None).unwrap().as_str(),
            "http://127.0.0.1:8090/api/collections/shops/records"
        );
        assert_eq!(
            pb.records_url("shops", Some("abc")).unwrap().as_str(),
            "http://127.0.0.1:8090/api/collections/shops/records/abc"
        );
    }

    #[test]
    fn test_list_query_encoding() {
        let pb = client("http://127.0.0.1:8090/");
        let mut url = pb.records_url("users", None).unwrap();
        url.query_pairs_mut()
            .extend_pairs(ListQuery::first().filter(r#"email = "a@b.co""#).to_pairs());
        assert_eq!(
            url.query(),
            Some("page=1&perPage=1&filter=email+%3D+%22a%40b.co%22&skipTotal=1")
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"status":400,"message":"Failed to create record.","data":{"name":{"code":"validation_required"}}}"#;
        let (message, data) = parse_error_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(message, "Failed to create record.");
        assert_eq!(data["name"]["code"], "validation_required");

        let (message, data) = parse_error_body(StatusCode::BAD_GATEWAY, "");
        assert_eq!(message, "Bad Gateway");
        assert!(data.is_null());

        let (message, _) = parse_error_body(StatusCode::INTERNAL_SERVER_ERROR, "upstream down");
        assert_eq!(message, "upstream down");
    }

    #[test]
    fn test_file_url_from_record() {
        let pb = client("http://127.0.0.1:8090");
        let record: Record = serde_json::from_value(json!({
            "id": "p1",
            "collectionId": "pbc_123",
            "collectionName": "products",
            "image": "caja_x1.png"
        }))
        .unwrap();
        assert_eq!(
            pb.file_url(&record, "image").as_deref(),
            Some("http://127.0.0.1:8090/api/files/pbc_123/p1/caja_x1.png")
        );

        let mut empty = record;
        empty.insert("image".to_owned(), json!(""));
        assert!(pb.file_url(&empty, "image").is_none());
    }

    #[test]
    fn test_stored_file_name_multi() {
        let record: Record = serde_json::from_value(json!({"gallery": ["a.png", "b.png"]})).unwrap();
        assert_eq!(stored_file_name(&record, "gallery"), Some("a.png"));
        assert_eq!(stored_file_name(&record, "missing"), None);
    }

    #[test]
    fn test_debug_hides_token() {
        let pb = client("http://127.0.0.1:8090");
        let debug_output = format!("{pb:?}");
        assert!(debug_output.contains("127.0.0.1"));
        assert!(debug_output.contains("authenticated: false"));
    }

    #[tokio::test]
    async fn test_missing_shops_collection_requests_repair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/collections/shops/records"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": 404,
                "message": "Missing collection context.",
                "data": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/fix-schema"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "schema imported"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pb = client_for(&server, SessionHandle::new());
        let err = pb.list(SHOPS, &ListQuery::page(1, 1)).await.unwrap_err();
        assert!(
            matches!(&err, StoreError::NotFound(m) if m == "Missing collection context."),
            "{err:?}"
        );

        let status = SystemCheck::new(pb).run().await.unwrap();
        assert_eq!(
            status,
            SystemStatus::Repaired {
                message: "schema imported".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_validation_message_is_kept_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/collections/shops/records"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": 400,
                "message": "Failed to create record.",
                "data": {"name": {"code": "validation_required", "message": "Missing required value."}}
            })))
            .mount(&server)
            .await;

        let pb = client_for(&server, owner_session("tok-1"));
        let err = pb
            .create(SHOPS, RecordBody::new().field("name", ""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to create record.");
        match err {
            StoreError::Api { status, data, .. } => {
                assert_eq!(status, 400);
                assert_eq!(data["name"]["code"], "validation_required");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/collections/shops/records"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": 401,
                "message": "The request requires valid record authorization token.",
                "data": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/collections/shops/records/s1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "status": 403,
                "message": "Only superusers can perform this action.",
                "data": {}
            })))
            .mount(&server)
            .await;

        let pb = client_for(&server, owner_session("tok-1"));
        let err = pb.list(SHOPS, &ListQuery::first()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)), "{err:?}");

        let err = pb.delete(SHOPS, "s1").await.unwrap_err();
        assert!(
            matches!(&err, StoreError::Unauthorized(m) if m == "Only superusers can perform this action."),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/collections/shops/records"))
            .and(header("Authorization", "tok-owner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(1)
            .mount(&server)
            .await;

        let session = owner_session("tok-owner");
        let pb = client_for(&server, session.clone());
        let page = pb.list(SHOPS, &ListQuery::first()).await.unwrap();
        assert!(page.is_empty());

        // Logged out: no header, so the token matcher above no longer applies.
        session.logout();
        let err = pb.list(SHOPS, &ListQuery::first()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{err:?}");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.last().unwrap().headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_authenticate_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/collections/_superusers/auth-with-password"))
            .and(body_json(json!({"identity": "root@mercado.test", "password": "s3cret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "tok-root",
                "record": {"id": "root1", "email": "root@mercado.test", "collectionName": "_superusers"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/collections/shops/records"))
            .and(header("Authorization", "tok-root"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .expect(1)
            .mount(&server)
            .await;

        let session = SessionHandle::new();
        let pb = client_for(&server, session.clone());
        let auth = pb
            .authenticate(
                PrincipalRole::Superuser,
                "root@mercado.test",
                &SecretString::from("s3cret"),
            )
            .await
            .unwrap();

        assert!(auth.principal().is_superuser());
        let stored = session.principal().unwrap();
        assert_eq!(stored.id.as_str(), "root1");
        assert_eq!(session.token().unwrap().expose_secret(), "tok-root");
        pb.list(SHOPS, &ListQuery::first()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/collections/users/auth-with-password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": 400,
                "message": "Failed to authenticate.",
                "data": {}
            })))
            .mount(&server)
            .await;

        let session = SessionHandle::new();
        let pb = client_for(&server, session.clone());
        let err = pb
            .authenticate(PrincipalRole::User, "pati@mercado.test", &SecretString::from("bad"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to authenticate.");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_create_with_image_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/collections/products/records"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .and(body_string_contains(r#"name="group_prices""#))
            .and(body_string_contains(r#""kind":"grouped""#))
            .and(body_string_contains(r#"filename="caja.png""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1",
                "collectionId": "pbc_products",
                "collectionName": "products",
                "name": "Caja",
                "image": "caja_x1.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pb = client_for(&server, owner_session("tok-1"));
        let body = RecordBody::new()
            .field("name", "Caja")
            .field("price", 12.5)
            .field(
                "group_prices",
                json!({"kind": "grouped", "tiers": [{"name": "Caja", "units": 24, "unit_price": 260.0, "min_qty": 5}]}),
            )
            .file(FileUpload {
                field: "image".to_owned(),
                file_name: "caja.png".to_owned(),
                mime: Some("image/png".to_owned()),
                bytes: b"png-bytes".to_vec(),
            });
        let record = pb.create(PRODUCTS, body).await.unwrap();
        assert_eq!(
            pb.file_url(&record, "image").as_deref(),
            Some(format!("{}/api/files/pbc_products/p1/caja_x1.png", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_update_without_files_is_json() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/collections/shops/records/s1"))
            .and(header_regex("content-type", "^application/json"))
            .and(body_json(json!({"commission_rate": 7.5})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "s1", "commission_rate": 7.5})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pb = client_for(&server, owner_session("tok-1"));
        let record = pb
            .update(SHOPS, "s1", RecordBody::new().field("commission_rate", 7.5))
            .await
            .unwrap();
        assert_eq!(record["id"], "s1");
    }
}

//! Request and response shapes shared by every [`RecordStore`](super::RecordStore).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// A raw record: field name to JSON value, including the system fields
/// `id`, `collectionId`, `collectionName`, `created` and `updated`.
pub type Record = Map<String, Value>;

/// A file attached to a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Record field receiving the file.
    pub field: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type, if known.
    pub mime: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// MIME type guessed from the file extension (images only).
    #[must_use]
    pub fn guess_mime(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "svg" => Some("image/svg+xml"),
            _ => None,
        }
    }
}

/// Body of a create or update request.
///
/// Without files it is sent as JSON. With files it becomes multipart: string
/// fields are sent as text and every other value as its JSON encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBody {
    pub fields: Map<String, Value>,
    pub files: Vec<FileUpload>,
}

impl RecordBody {
    /// An empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_owned(), value.into());
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn file(mut self, upload: FileUpload) -> Self {
        self.files.push(upload);
        self
    }

    /// Whether the body must be sent as multipart.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    /// Text form of a field value for a multipart part.
    #[must_use]
    pub fn multipart_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Parameters of a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub per_page: u32,
    /// Filter expression, e.g. `shop = "abc"`.
    pub filter: Option<String>,
    /// Sort expression, e.g. `-created`.
    pub sort: Option<String>,
    /// Relations to expand, e.g. `owner`.
    pub expand: Option<String>,
    /// Skip the total count (faster first-match lookups).
    pub skip_total: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
            filter: None,
            sort: None,
            expand: None,
            skip_total: false,
        }
    }
}

impl ListQuery {
    /// First page with `per_page` records.
    #[must_use]
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            ..Self::default()
        }
    }

    /// Query for a single first match.
    #[must_use]
    pub fn first() -> Self {
        Self {
            per_page: 1,
            skip_total: true,
            ..Self::default()
        }
    }

    /// Set the filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the sort.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Set the relations to expand.
    #[must_use]
    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    /// Query string pairs in the service's parameter names.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("perPage", self.per_page.to_string()),
        ];
        if let Some(filter) = &self.filter {
            pairs.push(("filter", filter.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(expand) = &self.expand {
            pairs.push(("expand", expand.clone()));
        }
        if self.skip_total {
            pairs.push(("skipTotal", "1".to_owned()));
        }
        pairs
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub page: u32,
    pub per_page: u32,
    /// `-1` when the total was skipped.
    pub total_items: i64,
    /// `-1` when the total was skipped.
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> ListResult<T> {
    /// Convert every item, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, E, F>(self, f: F) -> Result<ListResult<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(ListResult {
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }

    /// Whether this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether pages follow this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        i64::from(self.page) < self.total_pages
    }
}

/// URL of a stored file: `{base}/api/files/{collectionId}/{recordId}/{filename}`.
///
/// # Errors
///
/// Returns an error if the segments cannot be joined onto `base`.
pub fn file_url(
    base: &Url,
    collection_id: &str,
    record_id: &str,
    filename: &str,
) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["api", "files", collection_id, record_id, filename]);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_list_query_pairs() {
        let query = ListQuery::page(1, 50)
            .filter("shop = \"abc\"")
            .sort("-created")
            .expand("owner");
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "1".to_string()),
                ("perPage", "50".to_string()),
                ("filter", "shop = \"abc\"".to_string()),
                ("sort", "-created".to_string()),
                ("expand", "owner".to_string()),
            ]
        );
    }

    #[test]
    fn test_first_query_skips_total() {
        let pairs = ListQuery::first().to_pairs();
        assert!(pairs.contains(&("perPage", "1".to_string())));
        assert!(pairs.contains(&("skipTotal", "1".to_string())));
    }

    #[test]
    fn test_file_url() {
        let base = Url::parse("http://127.0.0.1:8090").unwrap();
        let url = file_url(&base, "pbc_products", "p1", "caja.png").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8090/api/files/pbc_products/p1/caja.png"
        );

        let nested = Url::parse("https://host.test/pb/").unwrap();
        let url = file_url(&nested, "c", "r", "a b.jpg").unwrap();
        assert_eq!(url.as_str(), "https://host.test/pb/api/files/c/r/a%20b.jpg");
    }

    #[test]
    fn test_multipart_text() {
        assert_eq!(RecordBody::multipart_text(&json!("Caja")), "Caja");
        assert_eq!(RecordBody::multipart_text(&json!(12.5)), "12.5");
        assert_eq!(RecordBody::multipart_text(&Value::Null), "");
        assert_eq!(
            RecordBody::multipart_text(&json!({"kind": "grouped", "tiers": []})),
            "{\"kind\":\"grouped\",\"tiers\":[]}"
        );
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(FileUpload::guess_mime("Foto.JPG"), Some("image/jpeg"));
        assert_eq!(FileUpload::guess_mime("notes.txt"), None);
        assert_eq!(FileUpload::guess_mime("noext"), None);
    }

    #[test]
    fn test_list_result_try_map() {
        let page = ListResult {
            page: 1,
            per_page: 2,
            total_items: 3,
            total_pages: 2,
            items: vec!["1", "2"],
        };
        assert!(page.has_more());
        let parsed = page.try_map(str::parse::<u8>).unwrap();
        assert_eq!(parsed.items, vec![1, 2]);
    }
}

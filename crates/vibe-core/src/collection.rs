//! Collection accessor: typed CRUD over one named collection
//!
//! Endpoints depend on the transport mode:
//!
//! | operation | direct | proxy |
//! |---|---|---|
//! | list | `GET /v1/{name}?...` | `POST /v1/collections/{group}/tables/{name}/query` |
//! | create | `POST /v1/{name}` | `POST /v1/collections/{group}/tables/{name}` |
//! | get / update / delete | `/v1/{name}/{id}` | `/v1/collections/{group}/tables/{name}/{id}` |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::http::request::{RequestOptions, TransportMode};
use crate::http::response::{total_count, unwrap_list, unwrap_one, unwrap_written};
use crate::http::RequestExecutor;

pub const DEFAULT_LIMIT: u64 = 20;

/// Operator used for literal filter values
pub const EQ: &str = "eq";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(format!("invalid order direction '{}', expected asc or desc", other)),
        }
    }
}

/// A filter on one field: a literal (equality) or an explicit condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Condition { operator: String, value: Value },
    Literal(Value),
}

impl FilterValue {
    pub fn condition(operator: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterValue::Condition {
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub fn operator(&self) -> &str {
        match self {
            FilterValue::Condition { operator, .. } => operator,
            FilterValue::Literal(_) => EQ,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            FilterValue::Condition { value, .. } | FilterValue::Literal(value) => value,
        }
    }
}

/// Query parameters for [`Collection::list`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: u64,
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, FilterValue>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: None,
            order_direction: None,
            filter: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Option<OrderDirection>) -> Self {
        self.order_by = Some(field.into());
        self.order_direction = direction;
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    /// Equality filter shorthand
    pub fn filter_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterValue::Literal(value.into()))
    }

    /// 1-based page for the proxy protocol
    ///
    /// Offsets that are not a multiple of `limit` round down to the page that
    /// contains them.
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    /// Direct-mode query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("limit", &self.limit.to_string());
        query.append_pair("offset", &self.offset.to_string());
        if let Some(order_by) = &self.order_by {
            query.append_pair("orderBy", order_by);
        }
        if let Some(direction) = self.order_direction {
            query.append_pair("orderDir", direction.as_str());
        }
        for (field, filter) in &self.filter {
            let key = match filter.operator() {
                EQ => format!("filter[{}]", field),
                operator => format!("filter[{}][{}]", field, operator),
            };
            query.append_pair(&key, &render_scalar(filter.value()));
        }
        query.finish()
    }

    /// Proxy-mode structured query body
    pub fn to_proxy_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("page".to_string(), json!(self.page()));
        body.insert("pageSize".to_string(), json!(self.limit));
        if let Some(order_by) = &self.order_by {
            body.insert("orderBy".to_string(), json!(order_by));
        }
        if let Some(direction) = self.order_direction {
            body.insert("orderDir".to_string(), json!(direction.as_str()));
        }
        if !self.filter.is_empty() {
            let filters: Vec<Value> = self
                .filter
                .iter()
                .map(|(field, filter)| {
                    json!({
                        "field": field,
                        "operator": filter.operator(),
                        "value": filter.value(),
                    })
                })
                .collect();
            body.insert("filter".to_string(), Value::Array(filters));
        }
        Value::Object(body)
    }
}

/// Pagination derived from a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: u64, limit: u64, offset: u64, returned: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(returned as u64) < total,
        }
    }
}

/// One page of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// CRUD facade over one named collection
///
/// Obtained from [`crate::Client::collection`]; one instance per name per client.
pub struct Collection {
    name: String,
    executor: Arc<RequestExecutor>,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, executor: Arc<RequestExecutor>) -> Self {
        Self {
            name: name.into(),
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_proxy(&self) -> bool {
        self.executor.mode() == TransportMode::Proxy
    }

    /// Path used for list queries (direct) and creates (both modes)
    pub fn collection_path(&self) -> String {
        let name = encode_segment(&self.name);
        match self.executor.mode() {
            TransportMode::Direct => format!("/v1/{}", name),
            TransportMode::Proxy => format!(
                "/v1/collections/{}/tables/{}",
                encode_segment(self.executor.config().collection_group()),
                name
            ),
        }
    }

    /// Path addressing a single record
    pub fn point_path(&self, id: impl fmt::Display) -> String {
        format!("{}/{}", self.collection_path(), encode_segment(&id.to_string()))
    }

    /// Fetch one page of records
    pub async fn list<T: DeserializeOwned>(&self, query: &ListQuery) -> Result<ListResult<T>> {
        let body = match self.executor.mode() {
            TransportMode::Direct => {
                let endpoint = format!("{}?{}", self.collection_path(), query.to_query_string());
                self.executor.execute(&endpoint, RequestOptions::get()).await?
            }
            TransportMode::Proxy => {
                let endpoint = format!("{}/query", self.collection_path());
                self.executor
                    .execute(&endpoint, RequestOptions::post(query.to_proxy_body()))
                    .await?
            }
        };

        let records = unwrap_list(&body, self.is_proxy());
        let pagination = Pagination::new(
            total_count(&body, records.len() as u64),
            query.limit,
            query.offset,
            records.len(),
        );
        let data = records
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<T>>>()?;

        Ok(ListResult { data, pagination })
    }

    /// Fetch one record; a missing record is `None`
    pub async fn get<T: DeserializeOwned>(&self, id: impl fmt::Display) -> Result<Option<T>> {
        let body = match self
            .executor
            .execute(&self.point_path(id), RequestOptions::get())
            .await
        {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        unwrap_one(&body, self.is_proxy()).map(decode).transpose()
    }

    /// Create a record; `None` when the backend answers without a body
    pub async fn create<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        partial: &P,
    ) -> Result<Option<T>> {
        let body = self
            .executor
            .execute(&self.collection_path(), RequestOptions::post(encode(partial)?))
            .await?;
        self.decode_written(&body)
    }

    /// Patch a record; `None` when the backend answers without a body
    pub async fn update<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        id: impl fmt::Display,
        partial: &P,
    ) -> Result<Option<T>> {
        let body = self
            .executor
            .execute(&self.point_path(id), RequestOptions::patch(encode(partial)?))
            .await?;
        self.decode_written(&body)
    }

    pub async fn delete(&self, id: impl fmt::Display) -> Result<()> {
        self.executor
            .execute(&self.point_path(id), RequestOptions::delete())
            .await?;
        Ok(())
    }

    fn decode_written<T: DeserializeOwned>(&self, body: &Value) -> Result<Option<T>> {
        unwrap_written(body, self.is_proxy()).map(decode).transpose()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

/// Percent-encode a single path segment
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::new(
            ErrorKind::ServerError,
            format!("Unexpected response shape: {}", e),
        )
    })
}

pub(crate) fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<Value> {
    serde_json::to_value(payload).map_err(|e| {
        Error::new(
            ErrorKind::ValidationError,
            format!("Failed to serialize request body: {}", e),
        )
    })
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

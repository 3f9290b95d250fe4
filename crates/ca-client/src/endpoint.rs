//! Endpoint descriptors.

use reqwest::Method;

/// Every backend route lives under this prefix
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// A single backend operation: method, path and query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    operation: &'static str,
    method: Method,
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new<I, S>(operation: &'static str, method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            method,
            segments: API_PREFIX
                .iter()
                .map(|s| (*s).to_string())
                .chain(segments.into_iter().map(Into::into))
                .collect(),
            query: Vec::new(),
        }
    }

    pub(crate) fn get<I, S>(operation: &'static str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(operation, Method::GET, segments)
    }

    pub(crate) fn post<I, S>(operation: &'static str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(operation, Method::POST, segments)
    }

    pub(crate) fn put<I, S>(operation: &'static str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(operation, Method::PUT, segments)
    }

    pub(crate) fn delete<I, S>(operation: &'static str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(operation, Method::DELETE, segments)
    }

    /// Add a query parameter
    #[must_use]
    pub(crate) fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// The backend's operation id (e.g. `getClientById`)
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path segments, unencoded
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Query parameters in insertion order
    #[must_use]
    pub fn query(&self) -> &[(&'static str, String)] {
        &self.query
    }

    /// Request path, e.g. `/api/v1/client/list`
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Cache key: the path, followed by the encoded query when there is one
    #[must_use]
    pub fn query_key(&self) -> Vec<String> {
        let mut key = vec![self.path()];
        if !self.query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            key.push(encoded);
        }
        key
    }
}

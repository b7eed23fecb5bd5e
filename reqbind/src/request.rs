use http::Method;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::{BindError, ParamMap};

/// `Content-Type` of urlencoded forms
pub const MIME_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// `Content-Type` of multipart forms
pub const MIME_MULTIPART_FORM: &str = "multipart/form-data";

/// Everything the binder reads from a request.
///
/// The routing layer is not part of reqbind: whatever matched the route
/// provides the path parameters, and whatever buffered the body provides its
/// bytes. Implemented for [`Request`] and for `http::Request<B>`.
pub trait RequestContext {
    /// The request method
    fn method(&self) -> &Method;

    /// Route parameters, in route order
    fn path_params(&self) -> Vec<(&str, &str)>;

    /// Parsed query string
    fn query_params(&self) -> ParamMap;

    /// Value of the header `name`, looked up case-insensitively. Values that
    /// are not visible ASCII count as absent.
    fn header(&self, name: &str) -> Option<&str>;

    /// The request body, fully buffered
    fn body(&self) -> &[u8];

    /// The `Content-Type` header
    fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// The declared body length: the `Content-Length` header if present and
    /// valid, the buffered body length otherwise. `None` means unknown.
    fn content_length(&self) -> Option<u64> {
        match self.header(CONTENT_LENGTH.as_str()) {
            Some(declared) => declared.trim().parse().ok(),
            None => Some(self.body().len() as u64),
        }
    }

    /// Form values. The default reads urlencoded bodies; multipart bodies
    /// need a context that parses them.
    fn form_params(&self) -> Result<ParamMap, BindError> {
        match self.content_type() {
            Some(content_type) if mime_matches(content_type, MIME_FORM_URLENCODED) => {
                Ok(ParamMap::from_urlencoded(self.body()))
            }
            _ => Ok(ParamMap::new()),
        }
    }
}

/// Returns true if `content_type` starts with `mime`, ignoring ASCII case and
/// leading whitespace. Parameters such as `; charset=utf-8` are allowed.
pub fn mime_matches(content_type: &str, mime: &str) -> bool {
    content_type
        .trim_start()
        .get(..mime.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(mime))
}

/// Route parameters, stored as an `http::Request` extension by the router.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Creates an empty set of route parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, after any existing ones
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Iterates over names and values, in route order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<B: AsRef<[u8]>> RequestContext for http::Request<B> {
    fn method(&self) -> &Method {
        http::Request::method(self)
    }

    fn path_params(&self) -> Vec<(&str, &str)> {
        self.extensions()
            .get::<PathParams>()
            .map(|params| params.iter().collect())
            .unwrap_or_default()
    }

    fn query_params(&self) -> ParamMap {
        self.uri()
            .query()
            .map(|query| ParamMap::from_urlencoded(query.as_bytes()))
            .unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)?.to_str().ok()
    }

    fn body(&self) -> &[u8] {
        http::Request::body(self).as_ref()
    }
}

/// An owned, already-routed request.
///
/// ```
/// use reqbind::{Request, RequestContext};
///
/// let req = Request::get("/users/3?expand=true")
///     .with_path_param("id", "3")
///     .with_header("Accept", "application/json");
/// assert_eq!(req.query_params().get("expand"), Some("true"));
/// assert_eq!(req.header("accept"), Some("application/json"));
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    target: String,
    path: Vec<(String, String)>,
    query: ParamMap,
    headers: Vec<(String, String)>,
    form: Option<ParamMap>,
    body: Vec<u8>,
}

impl Request {
    /// Creates a request for `target`, a path with an optional query string
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();
        let query = target
            .split_once('?')
            .map(|(_, query)| ParamMap::from_urlencoded(query.as_bytes()))
            .unwrap_or_default();
        Self {
            method,
            target,
            path: Vec::new(),
            query,
            headers: Vec::new(),
            form: None,
            body: Vec::new(),
        }
    }

    /// Creates a `GET` request
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    /// Creates a `POST` request
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    /// Creates a `PUT` request
    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    /// Creates a `PATCH` request
    pub fn patch(target: impl Into<String>) -> Self {
        Self::new(Method::PATCH, target)
    }

    /// Creates a `DELETE` request
    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Creates a `HEAD` request
    pub fn head(target: impl Into<String>) -> Self {
        Self::new(Method::HEAD, target)
    }

    /// The request target, as given
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Adds a route parameter
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter, after those of the target
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(name, value);
        self
    }

    /// Adds a header. Earlier headers of the same name win on lookup.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its `Content-Type`
    pub fn with_json(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_header(CONTENT_TYPE.as_str(), "application/json")
            .with_body(body)
    }

    /// Sets a urlencoded form body and its `Content-Type`
    pub fn with_form(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_header(CONTENT_TYPE.as_str(), MIME_FORM_URLENCODED)
            .with_body(body)
    }

    /// Adds an already-parsed form value, for instance from a multipart body.
    /// Once set, these replace whatever the body would parse to.
    pub fn with_form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.get_or_insert_default().append(name, value);
        self
    }
}

impl RequestContext for Request {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path_params(&self) -> Vec<(&str, &str)> {
        self.path
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }

    fn query_params(&self) -> ParamMap {
        self.query.clone()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn form_params(&self) -> Result<ParamMap, BindError> {
        match &self.form {
            Some(form) => Ok(form.clone()),
            None => match self.content_type() {
                Some(content_type) if mime_matches(content_type, MIME_FORM_URLENCODED) => {
                    Ok(ParamMap::from_urlencoded(&self.body))
                }
                _ => Ok(ParamMap::new()),
            },
        }
    }
}

use anyhow::{bail, Result};
use tracing::{debug, trace};
use url::Url;

use super::query::{QueryMap, QueryValue};
use super::serializer::{serialize, QueryPart, UrlParts};

/// A value routed to [`UrlComponents::set_component`] by component name.
///
/// Every component takes a `Text` value; the query additionally accepts a
/// pre-built `Map`. This is the closed replacement for a string-built setter
/// lookup: the component names a value can be routed to are fixed, and an
/// unknown name is a caller error.
#[derive(Debug, Clone)]
pub enum ComponentValue {
    Text(String),
    Map(QueryMap),
}

impl ComponentValue {
    fn is_empty(&self) -> bool {
        match self {
            ComponentValue::Text(text) => text.is_empty(),
            ComponentValue::Map(map) => map.is_empty(),
        }
    }

    fn into_text(self, name: &str) -> Result<String> {
        match self {
            ComponentValue::Text(text) => Ok(text),
            ComponentValue::Map(_) => {
                bail!("URL component '{}' expects a string value, got a query map", name)
            }
        }
    }
}

impl From<&str> for ComponentValue {
    fn from(text: &str) -> Self {
        ComponentValue::Text(text.to_owned())
    }
}

impl From<String> for ComponentValue {
    fn from(text: String) -> Self {
        ComponentValue::Text(text)
    }
}

impl From<QueryMap> for ComponentValue {
    fn from(map: QueryMap) -> Self {
        ComponentValue::Map(map)
    }
}

/// The eight parts of a URL, held as a mutable value object.
///
/// A record is created empty, from a URL string, or from a list of named
/// components; it is mutated through chainable setters and joined back into
/// a URL string with [`UrlComponents::to_url_string`].
///
/// All fields are optional except the query map, which is always present and
/// merely empty when the URL has no query. An empty string stored in a field
/// counts as absent when the record is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlComponents {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    path: Option<String>,
    query: QueryMap,
    fragment: Option<String>,
}

impl UrlComponents {
    /// Creates an empty record: all fields absent, query map empty.
    pub fn new() -> Self {
        UrlComponents::default()
    }

    /// Creates a record by splitting `url` into its components.
    ///
    /// A string the splitting primitive rejects yields an all-absent record
    /// rather than an error; callers should treat such a record as "nothing
    /// meaningful parsed".
    pub fn from_url(url: &str) -> Self {
        let mut components = UrlComponents::new();
        components.values_from_url(url);
        components
    }

    /// Creates a record from named components.
    ///
    /// Each `(name, value)` pair is routed through [`set_component`]; a name
    /// with no corresponding component fails fast. Empty values are skipped.
    ///
    /// [`set_component`]: UrlComponents::set_component
    pub fn from_components<I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, ComponentValue)>,
    {
        let mut record = UrlComponents::new();
        record.set_components(components)?;
        Ok(record)
    }

    /// Creates a record from the ambient pieces of an HTTP request.
    ///
    /// Synthesizes `http[s]://{host_header}{request_target}` and parses it.
    /// The three inputs are plain values supplied by the caller; whether the
    /// request really arrived over TLS (e.g. behind SSL termination) is not
    /// second-guessed here -- correct the scheme with [`set_scheme`] if
    /// needed.
    ///
    /// [`set_scheme`]: UrlComponents::set_scheme
    pub fn from_request_context(is_https: bool, host_header: &str, request_target: &str) -> Self {
        let url = format!(
            "http{}://{}{}",
            if is_https { "s" } else { "" },
            host_header,
            request_target
        );
        debug!("Synthesized URL from request context: {}", url);
        UrlComponents::from_url(&url)
    }

    /// Resets all fields, then fills them from `url`.
    ///
    /// Every component the splitting primitive produces is routed through
    /// [`set_component`](UrlComponents::set_component). On a parse failure
    /// the record is left all-absent.
    pub fn values_from_url(&mut self, url: &str) -> &mut Self {
        self.reset();

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("Could not split URL '{}': {}", url, err);
                return self;
            }
        };

        for (name, value) in split_components(&parsed) {
            trace!("Setting component {} from URL", name);
            if let Err(err) = self.set_component(name, ComponentValue::Text(value)) {
                // Unreachable: split_components only produces known names.
                debug!("Skipping component {}: {}", name, err);
            }
        }

        self
    }

    /// Routes `value` to the component called `name`.
    ///
    /// Recognized names are `scheme`, `host`, `port`, `user`, `pass`, `path`,
    /// `query` and `fragment`; anything else is an error signaling a caller
    /// bug. A `query` value may be a string (parsed as a query string) or a
    /// pre-built map.
    pub fn set_component(&mut self, name: &str, value: ComponentValue) -> Result<&mut Self> {
        match name {
            "scheme" => self.scheme = Some(value.into_text(name)?),
            "host" => self.host = Some(value.into_text(name)?),
            "port" => self.port = Some(value.into_text(name)?),
            "user" => self.user = Some(value.into_text(name)?),
            "pass" => self.pass = Some(value.into_text(name)?),
            "path" => self.path = Some(value.into_text(name)?),
            "fragment" => self.fragment = Some(value.into_text(name)?),
            "query" => {
                match value {
                    ComponentValue::Text(text) => self.set_query(text.as_str()),
                    ComponentValue::Map(map) => self.set_query(map),
                };
            }
            other => bail!("unknown URL component: '{}'", other),
        }

        Ok(self)
    }

    /// Routes a sequence of named values through
    /// [`set_component`](UrlComponents::set_component), skipping empty ones.
    pub fn set_components<I>(&mut self, components: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (String, ComponentValue)>,
    {
        for (name, value) in components {
            if value.is_empty() {
                continue;
            }
            self.set_component(&name, value)?;
        }
        Ok(self)
    }

    pub fn set_scheme(&mut self, scheme: Option<&str>) -> &mut Self {
        self.scheme = scheme.map(str::to_owned);
        self
    }

    pub fn set_host(&mut self, host: Option<&str>) -> &mut Self {
        self.host = host.map(str::to_owned);
        self
    }

    pub fn set_port(&mut self, port: Option<&str>) -> &mut Self {
        self.port = port.map(str::to_owned);
        self
    }

    pub fn set_user(&mut self, user: Option<&str>) -> &mut Self {
        self.user = user.map(str::to_owned);
        self
    }

    pub fn set_pass(&mut self, pass: Option<&str>) -> &mut Self {
        self.pass = pass.map(str::to_owned);
        self
    }

    pub fn set_path(&mut self, path: Option<&str>) -> &mut Self {
        self.path = path.map(str::to_owned);
        self
    }

    pub fn set_fragment(&mut self, fragment: Option<&str>) -> &mut Self {
        self.fragment = fragment.map(str::to_owned);
        self
    }

    /// Replaces the query map.
    ///
    /// A string value is parsed as a query string; a [`QueryMap`] replaces
    /// the map wholesale.
    pub fn set_query<Q: Into<QueryPart>>(&mut self, query: Q) -> &mut Self {
        self.query = match query.into() {
            QueryPart::Raw(raw) => QueryMap::parse(&raw),
            QueryPart::Map(map) => map,
        };
        self
    }

    /// Appends `value` under `key` in the query map.
    ///
    /// When the existing value is a list the new value is pushed onto it; a
    /// scalar (or absent) value is overwritten rather than promoted to a
    /// list. The asymmetry is intentional and part of the contract.
    pub fn append_to_query<V: Into<String>>(&mut self, key: &str, value: V) -> &mut Self {
        match self.query.get_mut(key) {
            Some(QueryValue::List(items)) => items.push(value.into()),
            _ => self.query.insert(key, QueryValue::Single(value.into())),
        }
        self
    }

    /// Removes `key` from the query map.
    ///
    /// Without an expected value the key is removed unconditionally; with
    /// one, only when the stored value equals it. Absent keys are ignored.
    pub fn unset_in_query(&mut self, key: &str, value: Option<&QueryValue>) -> &mut Self {
        let should_remove = match value {
            None => true,
            Some(expected) => self.query.get(key) == Some(expected),
        };
        if should_remove {
            self.query.remove(key);
        }
        self
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn pass(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The live query map, in insertion order.
    pub fn query(&self) -> &QueryMap {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryMap {
        &mut self.query
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Collects the non-empty fields into a [`UrlParts`] record, suitable as
    /// input to [`serialize`].
    pub fn components(&self) -> UrlParts {
        let mut parts = UrlParts::new();

        parts.scheme = self.scheme.clone().filter(|scheme| !scheme.is_empty());
        parts.host = self.host.clone().filter(|host| !host.is_empty());
        parts.port = self.port.clone().filter(|port| !port.is_empty());
        parts.user = self.user.clone().filter(|user| !user.is_empty());
        parts.pass = self.pass.clone().filter(|pass| !pass.is_empty());
        parts.path = self.path.clone().filter(|path| !path.is_empty());
        if !self.query.is_empty() {
            parts.query = Some(QueryPart::Map(self.query.clone()));
        }
        parts.fragment = self
            .fragment
            .clone()
            .filter(|fragment| !fragment.is_empty());

        parts
    }

    /// Joins the record back into a URL string.
    pub fn to_url_string(&self) -> String {
        serialize(&self.components(), false)
    }

    fn reset(&mut self) {
        self.scheme = None;
        self.host = None;
        self.port = None;
        self.user = None;
        self.pass = None;
        self.path = None;
        self.query.clear();
        self.fragment = None;
    }
}

impl std::fmt::Display for UrlComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_url_string())
    }
}

/// Flattens a split URL into `(name, value)` pairs for the component setter.
///
/// Mirrors the splitting primitive's output shape: absent parts produce no
/// pair, a bracketed IPv6 host is stored bare, and an empty username counts
/// as absent.
fn split_components(parsed: &Url) -> Vec<(&'static str, String)> {
    let mut components = Vec::new();

    components.push(("scheme", parsed.scheme().to_owned()));

    if let Some(host) = parsed.host_str() {
        let host = host
            .strip_prefix('[')
            .and_then(|host| host.strip_suffix(']'))
            .unwrap_or(host);
        components.push(("host", host.to_owned()));
    }

    if let Some(port) = parsed.port() {
        components.push(("port", port.to_string()));
    }

    if !parsed.username().is_empty() {
        components.push(("user", parsed.username().to_owned()));
    }

    if let Some(pass) = parsed.password() {
        components.push(("pass", pass.to_owned()));
    }

    if !parsed.path().is_empty() {
        components.push(("path", parsed.path().to_owned()));
    }

    if let Some(query) = parsed.query() {
        components.push(("query", query.to_owned()));
    }

    if let Some(fragment) = parsed.fragment() {
        components.push(("fragment", fragment.to_owned()));
    }

    components
}

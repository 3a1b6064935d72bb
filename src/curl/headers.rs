use indexmap::IndexMap;
use serde::Serialize;

/// Header names mapped to every value received for them, in arrival order.
///
/// HTTP allows a header to repeat (`Set-Cookie`, `Via`, CDN debug headers),
/// so values are appended rather than replaced. Names keep the case they had
/// on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderMap(IndexMap<String, Vec<String>>);

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// All values for `name` (exact, case-sensitive match).
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First value for `name`, ignoring ASCII case.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub version: String,
    pub code: String,
}

/// A start line as it appears in one side of the exchange.
pub trait StartLine: Sized {
    fn from_tokens(tokens: &[&str]) -> Option<Self>;
}

impl StartLine for RequestLine {
    fn from_tokens(tokens: &[&str]) -> Option<Self> {
        match tokens {
            [method, path, version, ..] => Some(RequestLine {
                method: method.to_string(),
                path: path.to_string(),
                version: version.to_string(),
            }),
            _ => None,
        }
    }
}

impl StartLine for StatusLine {
    fn from_tokens(tokens: &[&str]) -> Option<Self> {
        match tokens {
            [version, code, ..] => Some(StatusLine {
                version: version.to_string(),
                code: code.to_string(),
            }),
            _ => None,
        }
    }
}

/// Headers and start line for one side (request or response) of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRecord<S> {
    pub start: Option<S>,
    pub headers: HeaderMap,
}

impl<S> Default for HeaderRecord<S> {
    fn default() -> Self {
        Self {
            start: None,
            headers: HeaderMap::new(),
        }
    }
}

pub type RequestHeaders = HeaderRecord<RequestLine>;
pub type ResponseHeaders = HeaderRecord<StatusLine>;

impl<S: StartLine> HeaderRecord<S> {
    /// Feeds one non-empty `>` or `<` line.
    ///
    /// `name: value` lines are split on the first colon; lines mentioning
    /// `HTTP` without a colon are the start line. Anything else is ignored.
    pub fn accept(&mut self, content: &str) {
        if let Some((name, value)) = content.split_once(':') {
            self.headers.append(name.trim(), value.trim());
        } else if content.contains("HTTP") {
            let tokens: Vec<&str> = content.split_whitespace().collect();
            match S::from_tokens(&tokens) {
                Some(start) => self.start = Some(start),
                None => log::debug!("Ignoring short start line {content:?}"),
            }
        }
    }
}

impl ResponseHeaders {
    /// Numeric status code of the last response start line.
    pub fn status_code(&self) -> Option<u16> {
        self.start.as_ref()?.code.parse().ok()
    }
}

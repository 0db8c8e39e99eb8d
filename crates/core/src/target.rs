//! Inbound request target normalization.

/// The parsed fields of one inbound proxy request.
///
/// Built once per request by the connector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub method: String,
}

impl RequestTarget {
    /// The absolute URL the resolution chain operates on.
    ///
    /// Proxy clients may send either an absolute-form target
    /// (`GET http://host/path`) or an origin-form path plus a `Host`
    /// header. A path that already carries a scheme delimiter is used
    /// verbatim; otherwise the URL is synthesized from the parts.
    pub fn absolute_url(&self) -> String {
        if self.path.contains("://") {
            self.path.clone()
        } else {
            format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Whether the relay path should wrap the upstream socket in TLS.
    pub fn is_tls(&self) -> bool {
        matches!(self.scheme.as_str(), "https" | "tls" | "ssl")
    }
}

//! URI assembly from a base, path segments and query parameters

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::multidict::MultiDict;

/// Characters left alone in a path segment or query component: ASCII
/// alphanumerics and `-`, `.`, `_`. Everything else, `/`, `~` and `*`
/// included, is percent-encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

/// The value side of a query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Left out of the query string entirely
    Missing,
    /// One `key=value` pair
    One(String),
    /// One `key=value` pair per present element
    Many(Vec<Option<String>>),
}

/// Query parameters, in the order they should appear
pub type QueryParams = MultiDict<ParamValue>;

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::One(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::One(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Missing, Into::into)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Many(values.into_iter().map(|v| Some(v.to_string())).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Many(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<&str>>> for ParamValue {
    fn from(values: Vec<Option<&str>>) -> Self {
        ParamValue::Many(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }
}

impl From<Vec<Option<String>>> for ParamValue {
    fn from(values: Vec<Option<String>>) -> Self {
        ParamValue::Many(values)
    }
}

macro_rules! param_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::One(value.to_string())
                }
            }
        )*
    };
}

param_value_from_display!(bool, i32, i64, u16, u32, u64, usize, f64);

/// Percent-encode a single path segment
pub fn quote_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Encode one query key or value, spaces as `+`
fn quote_plus(component: &str) -> String {
    // `%` itself is escaped, so `%20` can only come from a space
    utf8_percent_encode(component, SEGMENT)
        .to_string()
        .replace("%20", "+")
}

/// Assemble a URI from a base, path segments and query parameters
///
/// At most one trailing `/` is stripped from `base`. Each present path
/// segment loses its leading and trailing slashes, is percent-encoded and
/// appended after a `/`; `None` segments are skipped. Query parameters are
/// encoded in order as `key=value` joined by `&`, spaces as `+`, and `Many`
/// values expand into repeated keys. Both encoders keep only ASCII
/// alphanumerics and `-._` literal, so `~` becomes `%7E` and `*` `%2A`.
///
/// ```rust
/// use restkit::uri::{make_uri, ParamValue, QueryParams};
///
/// let mut params = QueryParams::new();
/// params.add("tag", ParamValue::from(vec!["a", "b"]));
/// params.add("skip", ParamValue::Missing);
///
/// let uri = make_uri("http://x.org/", [Some("db"), Some("a/b")], &params);
/// assert_eq!(uri, "http://x.org/db/a%2Fb?tag=a&tag=b");
/// ```
pub fn make_uri<I, P>(base: &str, path: I, params: &QueryParams) -> String
where
    I: IntoIterator<Item = Option<P>>,
    P: AsRef<str>,
{
    let base = base.strip_suffix('/').unwrap_or(base);
    let mut uri = String::from(base);

    for segment in path.into_iter().flatten() {
        uri.push('/');
        uri.push_str(&quote_segment(segment.as_ref().trim_matches('/')));
    }

    let mut pairs = Vec::new();
    for (key, value) in params.iter() {
        match value {
            ParamValue::Missing => {}
            ParamValue::One(v) => pairs.push(format!("{}={}", quote_plus(key), quote_plus(v))),
            ParamValue::Many(values) => {
                for v in values.iter().flatten() {
                    pairs.push(format!("{}={}", quote_plus(key), quote_plus(v)));
                }
            }
        }
    }

    if !pairs.is_empty() {
        uri.push('?');
        uri.push_str(&pairs.join("&"));
    }
    uri
}

/// Append a single optional path to a base URI, with no query string
pub fn join_path(base: &str, path: Option<&str>) -> String {
    make_uri(base, [path], &QueryParams::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_params() -> QueryParams {
        QueryParams::new()
    }

    #[test]
    fn test_strips_one_trailing_slash() {
        assert_eq!(make_uri("http://x.org/", [None::<&str>], &no_params()), "http://x.org");
        assert_eq!(make_uri("http://x.org//", [None::<&str>], &no_params()), "http://x.org/");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let uri = make_uri("http://x.org/", [Some("a/b"), Some("c")], &no_params());
        assert_eq!(uri, "http://x.org/a%2Fb/c");

        let uri = make_uri("http://x.org", [Some("/_all_dbs")], &no_params());
        assert_eq!(uri, "http://x.org/_all_dbs");

        let uri = make_uri("http://x.org", [Some(" c ")], &no_params());
        assert_eq!(uri, "http://x.org/%20c%20");
    }

    #[test]
    fn test_non_ascii_segment() {
        let uri = make_uri("http://x.org", [Some("caf\u{e9}")], &no_params());
        assert_eq!(uri, "http://x.org/caf%C3%A9");
    }

    #[test]
    fn test_absent_segments_skipped() {
        let uri = make_uri("http://x.org", [None, Some("doc"), None], &no_params());
        assert_eq!(uri, "http://x.org/doc");
    }

    #[test]
    fn test_repeated_query_params() {
        let mut params = QueryParams::new();
        params.add("tag", ParamValue::from(vec!["a", "b"]));
        params.add("skip", ParamValue::Missing);

        let uri = make_uri("http://x.org", [None::<&str>], &params);
        assert_eq!(uri, "http://x.org?tag=a&tag=b");
    }

    #[test]
    fn test_query_order_and_encoding() {
        let mut params = QueryParams::new();
        params.add("q", ParamValue::from("hello world"));
        params.add("limit", ParamValue::from(10u32));
        params.add("q", ParamValue::from(vec![Some("x&y"), None]));
        params.add("flag", ParamValue::from(None::<String>));

        let uri = make_uri("http://x.org/api", [Some("search")], &params);
        assert_eq!(uri, "http://x.org/api/search?q=hello+world&limit=10&q=x%26y");
    }

    #[test]
    fn test_tilde_and_star_are_escaped() {
        let mut params = QueryParams::new();
        params.add("glob", ParamValue::from("*.rs ~x"));
        params.add("pct", ParamValue::from("100%20"));

        let uri = make_uri("http://x.org", [Some("~user"), Some("a*b")], &params);
        assert_eq!(
            uri,
            "http://x.org/%7Euser/a%2Ab?glob=%2A.rs+%7Ex&pct=100%2520"
        );
    }

    #[test]
    fn test_only_missing_params_means_no_query() {
        let mut params = QueryParams::new();
        params.add("a", ParamValue::Missing);
        params.add("b", ParamValue::Many(vec![None]));

        assert_eq!(make_uri("http://x.org", [None::<&str>], &params), "http://x.org");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("http://x.org/db/", Some("doc")), "http://x.org/db/doc");
        assert_eq!(join_path("http://x.org/db", None), "http://x.org/db");
    }
}

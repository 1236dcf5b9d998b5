//! Minimal `Cookie` header parsing.

use std::borrow::Cow;

/// Find the value of cookie `name` in a raw `Cookie` header.
///
/// Names and values are percent-decoded. When a name appears more than once
/// the last occurrence wins. Empty values count as absent.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| decode(key.trim()) == name)
        .map(|(_, value)| decode(value.trim()).into_owned())
        .last()
        .filter(|value| !value.is_empty())
}

fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_named_cookie_among_others() {
        let header = "theme=dark; accessToken=abc.def.ghi; lang=en";
        assert_eq!(find_cookie(header, "accessToken").as_deref(), Some("abc.def.ghi"));
        assert_eq!(find_cookie(header, "lang").as_deref(), Some("en"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn values_are_percent_decoded() {
        let header = "accessToken=a%2Eb%2Ec";
        assert_eq!(find_cookie(header, "accessToken").as_deref(), Some("a.b.c"));
    }

    #[test]
    fn empty_and_malformed_pairs_are_skipped() {
        assert_eq!(find_cookie("accessToken=", "accessToken"), None);
        assert_eq!(find_cookie("garbage; ;accessToken=t", "accessToken").as_deref(), Some("t"));
        assert_eq!(find_cookie("", "accessToken"), None);
    }

    #[test]
    fn last_duplicate_wins() {
        let header = "accessToken=old; accessToken=new";
        assert_eq!(find_cookie(header, "accessToken").as_deref(), Some("new"));
    }
}

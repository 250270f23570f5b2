//! `Link` header decoding.

use std::sync::LazyLock;

use log::error;
use regex::Regex;
use url::Url;

static LINK_NEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>; rel="next""#).expect("valid link pattern"));

/// Extracts the next page number from one `Link` header value.
///
/// `Ok(0)` when the value has no `next` relation.
pub fn parse_next_page(link: &str) -> Result<u32, String> {
    let Some(captures) = LINK_NEXT.captures(link) else {
        return Ok(0);
    };

    // Relative references are resolved against a placeholder root.
    let root = Url::parse("http://localhost/").map_err(|e| e.to_string())?;
    let url = root
        .join(&captures[1])
        .map_err(|e| format!("invalid url: {}", e))?;

    let page = url
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default();
    if page.is_empty() {
        return Err("page query not defined".to_string());
    }

    page.parse::<u32>()
        .map_err(|e| format!("invalid page query: {}", e))
}

/// Folds every `Link` header value into the next page number, 0 meaning
/// there is no further page. Malformed values are logged and skipped.
pub fn next_page<'a>(links: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut next = 0;
    for link in links {
        match parse_next_page(link) {
            Ok(page) => next = page,
            Err(e) => error!("failed to parse Link header {:?}: {}", link, e),
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_next_page() {
        let link = r#"<https://api.github.com/repositories/1/releases?per_page=2&page=3>; rel="next", <https://api.github.com/repositories/1/releases?per_page=2&page=5>; rel="last""#;
        assert_eq!(parse_next_page(link).unwrap(), 3);
    }

    #[test]
    fn test_parse_next_page_without_next() {
        let link = r#"<https://api.github.com/repositories/1/releases?page=1>; rel="prev""#;
        assert_eq!(parse_next_page(link).unwrap(), 0);
    }

    #[test]
    fn test_parse_next_page_malformed() {
        assert!(parse_next_page(r#"<https://x/releases?per_page=2>; rel="next""#).is_err());
        assert!(parse_next_page(r#"<https://x/releases?page=abc>; rel="next""#).is_err());
        assert!(parse_next_page(r#"<https://x/releases?page=>; rel="next""#).is_err());
    }

    #[test]
    fn test_next_page_skips_malformed_values() {
        let values = [
            r#"<https://x/releases?page=2>; rel="next""#,
            r#"<https://x/releases?page=oops>; rel="next""#,
        ];
        assert_eq!(next_page(values), 2);
        assert_eq!(next_page(std::iter::empty()), 0);
    }
}

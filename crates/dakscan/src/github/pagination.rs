//! Link-header pagination for GitHub list endpoints.

/// Pagination information extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// URL of the next page (from rel="next").
    pub next_url: Option<String>,
    /// The last page number (from rel="last").
    pub last_page: Option<u32>,
}

/// Parse the Link header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/organizations/123/repos?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        match (url, rel) {
            (Some(url), Some("next")) => info.next_url = Some(url.to_string()),
            (Some(url), Some("last")) => info.last_page = extract_page_from_url(url),
            _ => {}
        }
    }

    info
}

/// Extract the page parameter from a URL.
fn extract_page_from_url(url: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("page="))
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_header_full() {
        let header = r#"<https://api.github.com/organizations/5430905/repos?per_page=100&page=2>; rel="next", <https://api.github.com/organizations/5430905/repos?per_page=100&page=3>; rel="last""#;

        let info = parse_link_header(header);
        assert_eq!(
            info.next_url.as_deref(),
            Some("https://api.github.com/organizations/5430905/repos?per_page=100&page=2")
        );
        assert_eq!(info.last_page, Some(3));
    }

    #[test]
    fn test_parse_link_header_last_page_has_no_next() {
        let header = r#"<https://api.github.com/organizations/123/repos?per_page=100&page=1>; rel="first", <https://api.github.com/organizations/123/repos?per_page=100&page=4>; rel="prev""#;

        let info = parse_link_header(header);
        assert_eq!(info.next_url, None);
        assert_eq!(info.last_page, None);
    }

    #[test]
    fn test_parse_link_header_empty() {
        assert_eq!(parse_link_header(""), LinkPagination::default());
    }

    #[test]
    fn test_extract_page_from_url() {
        assert_eq!(
            extract_page_from_url("https://api.github.com/repos?per_page=100&page=3"),
            Some(3)
        );
        assert_eq!(
            extract_page_from_url("https://api.github.com/repos?per_page=100"),
            None
        );
        assert_eq!(extract_page_from_url("https://api.github.com/repos"), None);
    }
}

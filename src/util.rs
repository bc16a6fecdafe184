//! Small helpers shared by the acquirer and the default fetcher.

/// Filename a raw download is saved as: the last segment of the URL path.
///
/// Scheme, authority, query string and fragment are ignored. Falls back to
/// "download" when the path has no usable segment.
pub fn url_filename(url: &str) -> String {
    let clean = url.split(['?', '#']).next().unwrap_or(url);

    // Drop "scheme://authority" so a bare host is never taken as a filename
    let path = match clean.find("://") {
        Some(idx) => {
            let after = &clean[idx + 3..];
            after.find('/').map(|slash| &after[slash..]).unwrap_or("")
        }
        None => clean,
    };

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_filename_basic() {
        assert_eq!(
            url_filename("https://example.com/foo-1.0.tar.gz"),
            "foo-1.0.tar.gz"
        );
        assert_eq!(url_filename("http://example.com/dir/test.js"), "test.js");
    }

    #[test]
    fn test_url_filename_ignores_query_and_fragment() {
        assert_eq!(url_filename("https://example.com/tool?v=1"), "tool");
        assert_eq!(url_filename("https://example.com/tool#frag"), "tool");
        assert_eq!(url_filename("https://example.com/a/tool.exe?x=1#y"), "tool.exe");
    }

    #[test]
    fn test_url_filename_trailing_slash() {
        assert_eq!(url_filename("https://example.com/releases/tool/"), "tool");
    }

    #[test]
    fn test_url_filename_host_only_falls_back() {
        assert_eq!(url_filename("https://example.com"), "download");
        assert_eq!(url_filename("https://example.com/"), "download");
        assert_eq!(url_filename("https://example.com?x=/evil"), "download");
    }

    #[test]
    fn test_url_filename_rejects_dot_segments() {
        assert_eq!(url_filename("https://example.com/a/.."), "download");
    }

    #[test]
    fn test_url_filename_keeps_percent_encoding() {
        assert_eq!(url_filename("https://example.com/my%20tool"), "my%20tool");
    }
}

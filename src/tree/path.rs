//! Tree path utilities
//!
//! A path is an ordered sequence of string labels from the root; the empty
//! sequence denotes the root itself.

/// Owned path of labels, used as the registration key for subscriptions.
pub type TreePath = Vec<String>;

/// Split a dotted key like `"streams.publishes.topic1"` into path labels.
///
/// Empty segments are dropped, so `"a..b"` and `".a.b"` both yield `["a", "b"]`.
pub fn parse(dotted: &str) -> TreePath {
    dotted
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join labels back into a dotted key for display and logging.
pub fn join(path: &[String]) -> String {
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_dots() {
        assert_eq!(
            parse("streams.publishes.topic1"),
            vec!["streams", "publishes", "topic1"]
        );
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        assert_eq!(parse("a..b"), vec!["a", "b"]);
        assert_eq!(parse(".a.b."), vec!["a", "b"]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_join_is_inverse_of_parse() {
        let path = parse("collector.listen-port");
        assert_eq!(join(&path), "collector.listen-port");
    }
}

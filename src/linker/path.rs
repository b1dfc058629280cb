/// Join two URL path segments.
///
/// Exactly one slash at the seam, repeated slashes collapsed, trailing slash
/// dropped. An empty result is the root `/`.
pub fn join_path(left: &str, right: &str) -> String {
    let joined = format!("{}/{}", left.trim_end_matches('/'), right.trim_start_matches('/'));

    let mut collapsed = String::with_capacity(joined.len());
    for ch in joined.chars() {
        if ch == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(ch);
    }

    let trimmed = collapsed.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_basic() {
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("/", "/"), "/");
        assert_eq!(join_path("", "users"), "/users");
        assert_eq!(join_path("/api", "/users/"), "/api/users");
        assert_eq!(join_path("/api/", "{id}"), "/api/{id}");
        assert_eq!(join_path("/users", "/"), "/users");
    }

    #[test]
    fn test_join_collapses_inner_slashes() {
        assert_eq!(join_path("/api//v1/", "//items"), "/api/v1/items");
    }

    #[test]
    fn test_join_never_produces_double_or_trailing_slash() {
        let segments = ["", "/", "//", "a", "/a", "a/", "/a/", "a//b", "/{p1_pk}"];
        for left in segments {
            for right in segments {
                let joined = join_path(left, right);
                assert!(!joined.contains("//"), "{:?} + {:?} = {:?}", left, right, joined);
                assert!(joined == "/" || !joined.ends_with('/'), "{:?} + {:?} = {:?}", left, right, joined);
            }
        }
    }
}

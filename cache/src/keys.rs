use std::fmt;

const PREFIX: &str = "cache";

/// Key of one cached listing: `cache:{user_id}:{segment}`.
///
/// `:` and `%` in the user id are percent-encoded so that a user's
/// namespace prefix never matches another user's keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    user_id: String,
    segment: String,
}

impl CacheKey {
    pub fn new(user_id: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            segment: segment.into(),
        }
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Namespace prefix shared by all keys of a user.
    pub fn user_prefix(user_id: &str) -> String {
        format!("{}:{}:", PREFIX, encode_user(user_id))
    }

    /// Redis `MATCH` pattern selecting the user's namespace.
    pub fn user_pattern(user_id: &str) -> String {
        format!("{}*", escape_glob(&Self::user_prefix(user_id)))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::user_prefix(&self.user_id), self.segment)
    }
}

fn encode_user(user_id: &str) -> String {
    user_id.replace('%', "%25").replace(':', "%3A")
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_user() {
        let key = CacheKey::new("user_42", "ga:properties:accounts/7");
        assert_eq!(key.to_string(), "cache:user_42:ga:properties:accounts/7");
        assert!(key.to_string().starts_with(&CacheKey::user_prefix("user_42")));
        assert!(!key.to_string().starts_with(&CacheKey::user_prefix("user_4")));
    }

    #[test]
    fn colons_in_user_ids_do_not_widen_the_namespace() {
        let nested = CacheKey::new("user:x", "ga:accounts");
        assert_eq!(nested.to_string(), "cache:user%3Ax:ga:accounts");
        assert!(!nested.to_string().starts_with(&CacheKey::user_prefix("user")));
        assert!(nested.to_string().starts_with(&CacheKey::user_prefix("user:x")));
        assert_ne!(
            CacheKey::user_prefix("a%3Ab"),
            CacheKey::user_prefix("a:b")
        );
    }

    #[test]
    fn pattern_escapes_glob_characters() {
        assert_eq!(CacheKey::user_pattern("u*1"), "cache:u\\*1:*");
    }
}

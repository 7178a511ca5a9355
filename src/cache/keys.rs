//! # 缓存键命名规范
//!
//! 所有插件写入的键都带有插件命名空间前缀：`{namespace}:{key}`。
//! 命名空间中的 `%` 和 `:` 会被转义为 `%25` / `%3A`，
//! 所以插件 `a` 的键 `b:c` 与插件 `a:b` 的键 `c` 不会落到同一个存储键上。

use crate::error::{CacheError, CacheResult};

/// 命名空间与键之间的分隔符
pub const NAMESPACE_SEPARATOR: char = ':';

/// memcache 协议允许的最大键长度
pub const MAX_KEY_LENGTH: usize = 250;

/// 转义命名空间，使其不含分隔符
#[must_use]
pub fn escape_namespace(namespace: &str) -> String {
    namespace.replace('%', "%25").replace(':', "%3A")
}

/// 生成带命名空间的键
#[must_use]
pub fn namespaced(namespace: &str, key: &str) -> String {
    format!("{}{key}", namespace_prefix(namespace))
}

/// 命名空间前缀，用于批量匹配
#[must_use]
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}{NAMESPACE_SEPARATOR}", escape_namespace(namespace))
}

/// Redis `KEYS` 模式：匹配命名空间下的全部键
#[must_use]
pub fn redis_namespace_pattern(namespace: &str) -> String {
    let mut pattern = String::new();
    for c in namespace_prefix(namespace).chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

/// Redis 中记录命名空间成员的 set 键
#[must_use]
pub fn redis_namespace_set(namespace: &str) -> String {
    format!("namespace{NAMESPACE_SEPARATOR}{}", escape_namespace(namespace))
}

/// 从带命名空间的键中取回原始键
#[must_use]
pub fn strip_namespace<'a>(namespace: &str, full_key: &'a str) -> Option<&'a str> {
    full_key.strip_prefix(namespace_prefix(namespace).as_str())
}

/// 校验键是否满足 memcache 协议限制
pub fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::operation("缓存键不能为空"));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::operation(format!(
            "缓存键过长 ({} > {MAX_KEY_LENGTH}): {key}",
            key.len()
        )));
    }

    if key.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(CacheError::operation(format!(
            "缓存键包含空白或控制字符: {key:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_key() {
        assert_eq!(namespaced("catalog", "entity:1"), "catalog:entity:1");
        assert_eq!(namespace_prefix("catalog"), "catalog:");
        assert_eq!(redis_namespace_set("catalog"), "namespace:catalog");
    }

    #[test]
    fn test_separator_in_namespace_is_escaped() {
        assert_eq!(namespaced("a:b", "c"), "a%3Ab:c");
        assert_ne!(namespaced("a", "b:c"), namespaced("a:b", "c"));
        assert!(!namespaced("a:b", "c").starts_with(&namespace_prefix("a")));
        assert_ne!(namespaced("a%3Ab", "c"), namespaced("a:b", "c"));
        assert_eq!(redis_namespace_set("a:b"), "namespace:a%3Ab");
    }

    #[test]
    fn test_redis_pattern_escapes_glob_characters() {
        assert_eq!(redis_namespace_pattern("catalog"), "catalog:*");
        assert_eq!(redis_namespace_pattern("a*[b]?"), r"a\*\[b\]\?:*");
    }

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("catalog", "catalog:a:b"), Some("a:b"));
        assert_eq!(strip_namespace("catalog", "catalogx:a"), None);
        assert_eq!(strip_namespace("catalog", "search:a"), None);
        assert_eq!(strip_namespace("a", "a%3Ab:c"), None);
        assert_eq!(strip_namespace("a:b", "a%3Ab:c"), Some("c"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("catalog:entity").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key("line\nbreak").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }
}

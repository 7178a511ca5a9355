//! # 数据库配置

use serde::{Deserialize, Serialize};

/// 内存 SQLite 连接串
pub const SQLITE_MEMORY: &str = "sqlite::memory:";

/// `backend.database` 配置段
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// 数据库驱动，目前只支持 sqlite
    pub client: String,
    /// 连接串；`:memory:` 会被规范化为内存 SQLite
    pub connection: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            client: "sqlite".to_string(),
            connection: SQLITE_MEMORY.to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// 内存数据库配置
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 规范化后的连接 URL
    #[must_use]
    pub fn url(&self) -> String {
        match self.connection.as_str() {
            ":memory:" | SQLITE_MEMORY => SQLITE_MEMORY.to_string(),
            other if other.starts_with("sqlite:") => other.to_string(),
            other => format!("sqlite://{other}?mode=rwc"),
        }
    }

    /// 是否为内存数据库
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url() == SQLITE_MEMORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_connection_is_normalized() {
        let config = DatabaseConfig {
            connection: ":memory:".to_string(),
            ..Default::default()
        };
        assert_eq!(config.url(), SQLITE_MEMORY);
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_file_connection_gets_sqlite_scheme() {
        let config = DatabaseConfig {
            connection: "./data/catalog.db".to_string(),
            ..Default::default()
        };
        assert_eq!(config.url(), "sqlite://./data/catalog.db?mode=rwc");
        assert!(!config.is_in_memory());
    }
}

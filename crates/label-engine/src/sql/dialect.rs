//! SQL 方言
//!
//! 不同数据库的正则运算符与 LIKE 转义规则不同，通过 `SqlDialect` 插拔。

use crate::error::LabelError;
use std::fmt;
use std::str::FromStr;

/// SQL 方言渲染策略
pub trait SqlDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// 渲染正则匹配，`pattern` 已是转义后的字符串字面量
    fn regex_match(&self, column: &str, pattern: &str, negated: bool) -> String;

    /// LIKE 使用的转义字符
    fn like_escape(&self) -> char {
        '\\'
    }

    /// 渲染字符串字面量
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// 渲染 LIKE 条件，`pattern` 已包含通配符
    fn like(&self, column: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        let escape = self.like_escape();
        let escape_literal = self.quote_literal(&escape.to_string());
        format!(
            "{} {} {} ESCAPE {}",
            column,
            op,
            self.quote_literal(pattern),
            escape_literal
        )
    }
}

/// 通用方言，正则使用 `REGEXP_LIKE`
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl SqlDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn regex_match(&self, column: &str, pattern: &str, negated: bool) -> String {
        let call = format!("REGEXP_LIKE({}, {})", column, pattern);
        if negated {
            format!("NOT {}", call)
        } else {
            call
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn regex_match(&self, column: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT REGEXP" } else { "REGEXP" };
        format!("{} {} {}", column, op, pattern)
    }

    // MySQL 字符串字面量中反斜杠本身是转义符
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn regex_match(&self, column: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "!~" } else { "~" };
        format!("{} {} {}", column, op, pattern)
    }
}

/// SQLite 需要宿主注册 `regexp()` 函数
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn regex_match(&self, column: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT REGEXP" } else { "REGEXP" };
        format!("{} {} {}", column, op, pattern)
    }
}

/// 内置方言
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialectKind {
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
}

impl DialectKind {
    pub fn build(&self) -> Box<dyn SqlDialect> {
        match self {
            Self::Generic => Box::new(GenericDialect),
            Self::MySql => Box::new(MySqlDialect),
            Self::Postgres => Box::new(PostgresDialect),
            Self::Sqlite => Box::new(SqliteDialect),
        }
    }
}

impl FromStr for DialectKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(LabelError::InvalidDialect {
                token: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.build().name())
    }
}

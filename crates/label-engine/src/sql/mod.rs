//! SQL 生成
//!
//! 将规则集编译为 SQL 条件表达式，字段名称按字段标识配置替换为列名。

mod compiler;
mod dialect;

pub use compiler::{SqlCompiler, SqlPredicate};
pub use dialect::{
    DialectKind, GenericDialect, MySqlDialect, PostgresDialect, SqlDialect, SqliteDialect,
};

use crate::error::{LabelError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// 字段标识配置中的一行
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierRow {
    #[serde(rename = "字段名", alias = "数据字段名称")]
    pub field: String,
    #[serde(rename = "字段标识")]
    pub identifier: String,
}

/// 字段名称 -> SQL 列标识
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    columns: BTreeMap<String, String>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.columns.insert(field.into(), column.into());
    }

    /// 查找列标识
    ///
    /// 未配置或配置为空白时返回 `MissingColumnMapping`；
    /// 标识只允许字母、数字、`_` 与 `.`，否则返回 `InvalidColumnIdentifier`。
    pub fn column(&self, field: &str) -> Result<&str> {
        let column = self
            .columns
            .get(field)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LabelError::MissingColumnMapping {
                field: field.to_string(),
            })?;

        if !is_valid_identifier(column) {
            return Err(LabelError::InvalidColumnIdentifier {
                field: field.to_string(),
                identifier: column.to_string(),
            });
        }

        Ok(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 从 JSON 解析：`{"字段名": "列名"}` 对象或 `[{"字段名": .., "字段标识": ..}]` 行数组
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Object(BTreeMap<String, String>),
            Rows(Vec<IdentifierRow>),
        }

        let map: Self = match serde_json::from_str::<Shape>(json)? {
            Shape::Object(columns) => columns.into_iter().collect(),
            Shape::Rows(rows) => rows.into_iter().collect(),
        };
        Ok(map)
    }
}

/// `schema.table.column` 形式，每段非空
fn is_valid_identifier(identifier: &str) -> bool {
    identifier
        .split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IdentifierMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (field, column) in iter {
            map.insert(field, column);
        }
        map
    }
}

impl FromIterator<IdentifierRow> for IdentifierMap {
    fn from_iter<T: IntoIterator<Item = IdentifierRow>>(iter: T) -> Self {
        iter.into_iter()
            .filter(|row| !row.field.trim().is_empty())
            .map(|row| (row.field.trim().to_string(), row.identifier))
            .collect()
    }
}

//! 标注引擎领域模型

use crate::error::Result;
use crate::ingest::RuleRow;
use crate::operators::{ConditionKind, Logic};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 字段映射：规则中的字段名称 -> 记录中的字段标识
pub type FieldMapping = BTreeMap<String, String>;

/// 筛选子句
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub condition: ConditionKind,
    #[serde(default)]
    pub keyword: String,
}

impl Clause {
    pub fn new(field: impl Into<String>, condition: ConditionKind, keyword: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            condition,
            keyword: keyword.into(),
        }
    }

    /// 空条件子句不构成任何约束
    pub fn is_unconstrained(&self) -> bool {
        self.condition == ConditionKind::Noop
    }
}

/// 标注规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub clause1: Clause,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub clause2: Option<Clause>,
    pub label: String,
}

impl Rule {
    /// 单条件规则
    pub fn single(clause: Clause, label: impl Into<String>) -> Self {
        Self {
            clause1: clause,
            logic: Logic::None,
            clause2: None,
            label: label.into(),
        }
    }

    pub fn and(first: Clause, second: Clause, label: impl Into<String>) -> Self {
        Self::combined(first, Logic::And, second, label)
    }

    pub fn or(first: Clause, second: Clause, label: impl Into<String>) -> Self {
        Self::combined(first, Logic::Or, second, label)
    }

    fn combined(first: Clause, logic: Logic, second: Clause, label: impl Into<String>) -> Self {
        Self {
            clause1: first,
            logic,
            clause2: Some(second),
            label: label.into(),
        }
    }

    /// 参与求值的第二子句，`logic` 为 `None` 时忽略
    pub fn effective_clause2(&self) -> Option<&Clause> {
        match self.logic {
            Logic::None => None,
            Logic::And | Logic::Or => self.clause2.as_ref(),
        }
    }
}

/// 有序规则集，靠前的规则优先
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// 从规则表行构建，遇到第一条无效行即失败
    pub fn from_rows(rows: Vec<RuleRow>) -> Result<Self> {
        let rules = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_rule(index + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// 从 JSON 规则表（行对象数组）构建
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<RuleRow> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 标准化后的记录：字段名称 -> 去除首尾空白的文本值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段，值会去除首尾空白
    pub fn insert(&mut self, field: impl Into<String>, value: impl AsRef<str>) {
        self.fields
            .insert(field.into(), value.as_ref().trim().to_string());
    }

    /// 读取字段值，字段不存在时返回空字符串
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: AsRef<str>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

//! 筛选条件与关联条件定义

use crate::error::LabelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 筛选条件
///
/// 与规则表中 `筛选条件` 列的下拉选项一一对应，`Noop` 对应空选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConditionKind {
    /// 空条件，恒为真
    Noop,

    // 相等比较
    Equals,
    NotEquals,

    // 空值检查
    IsEmpty,
    NotEmpty,

    // 大小比较
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // 字符串包含
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,

    // 正则
    RegexMatch,
    RegexNotMatch,
}

impl ConditionKind {
    /// 全部条件，顺序与规则表下拉选项一致
    pub const ALL: [ConditionKind; 17] = [
        Self::Noop,
        Self::Equals,
        Self::NotEquals,
        Self::IsEmpty,
        Self::NotEmpty,
        Self::Greater,
        Self::GreaterEqual,
        Self::Less,
        Self::LessEqual,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::NotStartsWith,
        Self::EndsWith,
        Self::NotEndsWith,
        Self::RegexMatch,
        Self::RegexNotMatch,
    ];

    /// 规则表中使用的中文选项
    pub fn token(&self) -> &'static str {
        match self {
            Self::Noop => "",
            Self::Equals => "等于",
            Self::NotEquals => "不等于",
            Self::IsEmpty => "为空",
            Self::NotEmpty => "不为空",
            Self::Greater => "大于",
            Self::GreaterEqual => "大于等于",
            Self::Less => "小于",
            Self::LessEqual => "小于等于",
            Self::Contains => "包含",
            Self::NotContains => "不包含",
            Self::StartsWith => "开头是",
            Self::NotStartsWith => "开头不是",
            Self::EndsWith => "结尾是",
            Self::NotEndsWith => "结尾不是",
            Self::RegexMatch => "正则匹配",
            Self::RegexNotMatch => "正则不匹配",
        }
    }

    /// 英文名称，供 JSON 规则和命令行使用
    pub fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::IsEmpty => "is_empty",
            Self::NotEmpty => "not_empty",
            Self::Greater => "greater",
            Self::GreaterEqual => "greater_equal",
            Self::Less => "less",
            Self::LessEqual => "less_equal",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::NotStartsWith => "not_starts_with",
            Self::EndsWith => "ends_with",
            Self::NotEndsWith => "not_ends_with",
            Self::RegexMatch => "regex_match",
            Self::RegexNotMatch => "regex_not_match",
        }
    }

    /// 否定形式的条件（不等于、不包含等）
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            Self::NotEquals
                | Self::NotEmpty
                | Self::NotContains
                | Self::NotStartsWith
                | Self::NotEndsWith
                | Self::RegexNotMatch
        )
    }

    /// 关键字是否按分隔符拆分为多个候选项
    pub fn uses_alternatives(&self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::Contains
                | Self::NotContains
                | Self::StartsWith
                | Self::NotStartsWith
                | Self::EndsWith
                | Self::NotEndsWith
        )
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::RegexMatch | Self::RegexNotMatch)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::Greater | Self::GreaterEqual | Self::Less | Self::LessEqual
        )
    }
}

impl FromStr for ConditionKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.token() == token || kind.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| LabelError::InvalidCondition {
                token: token.to_string(),
            })
    }
}

impl TryFrom<String> for ConditionKind {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        kind.token().to_string()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => write!(f, "(无条件)"),
            other => write!(f, "{}", other.token()),
        }
    }
}

/// 关联条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Logic {
    /// 仅使用第一个条件
    #[default]
    None,
    And,
    Or,
}

impl Logic {
    pub fn token(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::And => "且",
            Self::Or => "或",
        }
    }
}

impl FromStr for Logic {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::None),
            "且" => Ok(Self::And),
            "或" => Ok(Self::Or),
            other if other.eq_ignore_ascii_case("and") => Ok(Self::And),
            other if other.eq_ignore_ascii_case("or") => Ok(Self::Or),
            other => Err(LabelError::InvalidLogic {
                token: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Logic {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Logic> for String {
    fn from(logic: Logic) -> Self {
        logic.token().to_string()
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

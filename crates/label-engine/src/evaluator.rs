//! 条件评估器
//!
//! 实现各筛选条件的求值逻辑。字段值来自表格类数据源，统一按去除首尾空白的文本处理。

use crate::error::{LabelError, Result};
use crate::operators::ConditionKind;
use regex::Regex;
use std::cmp::Ordering;

/// 关键字多选项分隔符
pub const KEYWORD_DELIMITERS: [char; 2] = ['；', ';'];

/// 预处理后的关键字
#[derive(Debug, Clone)]
pub struct Keyword {
    raw: String,
    alternatives: Vec<String>,
    pattern: Option<Regex>,
}

impl Keyword {
    /// 按条件类型预处理关键字
    ///
    /// 正则条件在此编译，失败返回 `InvalidPattern`。正则关键字保留首尾空白。
    pub fn compile(condition: ConditionKind, raw: &str) -> Result<Self> {
        let raw = if condition.is_regex() {
            raw.to_string()
        } else {
            raw.trim().to_string()
        };

        let alternatives = if condition.uses_alternatives() {
            split_alternatives(&raw)
        } else {
            Vec::new()
        };

        let pattern = if condition.is_regex() {
            Some(compile_pattern(&raw)?)
        } else {
            None
        };

        Ok(Self {
            raw,
            alternatives,
            pattern,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

/// 拆分多选项关键字
///
/// 空选项会被丢弃；整体为空时返回单个空选项。
pub fn split_alternatives(raw: &str) -> Vec<String> {
    let alternatives: Vec<String> = raw
        .split(KEYWORD_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if alternatives.is_empty() {
        vec![String::new()]
    } else {
        alternatives
    }
}

/// 编译正则关键字
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| LabelError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `value` - 记录中的字段值
    /// * `condition` - 筛选条件
    /// * `keyword` - 规则中的关键字，可包含多个以 `；` 分隔的候选项
    pub fn evaluate(value: &str, condition: ConditionKind, keyword: &str) -> Result<bool> {
        let keyword = Keyword::compile(condition, keyword)?;
        Ok(Self::evaluate_keyword(value, condition, &keyword))
    }

    /// 使用预处理后的关键字评估条件
    pub fn evaluate_keyword(value: &str, condition: ConditionKind, keyword: &Keyword) -> bool {
        let value = value.trim();

        match condition {
            ConditionKind::Noop => true,
            ConditionKind::IsEmpty => value.is_empty(),
            ConditionKind::NotEmpty => !value.is_empty(),
            ConditionKind::Equals => Self::any(keyword, |alt| value == alt),
            ConditionKind::NotEquals => !Self::any(keyword, |alt| value == alt),
            ConditionKind::Contains => Self::any(keyword, |alt| value.contains(alt)),
            ConditionKind::NotContains => !Self::any(keyword, |alt| value.contains(alt)),
            ConditionKind::StartsWith => Self::any(keyword, |alt| value.starts_with(alt)),
            ConditionKind::NotStartsWith => !Self::any(keyword, |alt| value.starts_with(alt)),
            ConditionKind::EndsWith => Self::any(keyword, |alt| value.ends_with(alt)),
            ConditionKind::NotEndsWith => !Self::any(keyword, |alt| value.ends_with(alt)),
            ConditionKind::Greater => Self::compare(value, keyword.raw()).is_gt(),
            ConditionKind::GreaterEqual => Self::compare(value, keyword.raw()).is_ge(),
            ConditionKind::Less => Self::compare(value, keyword.raw()).is_lt(),
            ConditionKind::LessEqual => Self::compare(value, keyword.raw()).is_le(),
            ConditionKind::RegexMatch => Self::regex_match(value, keyword),
            ConditionKind::RegexNotMatch => !Self::regex_match(value, keyword),
        }
    }

    /// 任一候选项满足即为命中
    fn any<F>(keyword: &Keyword, test: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        keyword.alternatives().iter().any(|alt| test(alt))
    }

    /// 先按数值比较，任一方无法解析为有限数值时退回字典序比较
    pub fn compare(value: &str, keyword: &str) -> Ordering {
        let value = value.trim();
        let keyword = keyword.trim();

        match (parse_number(value), parse_number(keyword)) {
            // 有限数值之间 partial_cmp 总有结果，且 -0 与 0 相等
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => value.cmp(keyword),
        }
    }

    fn regex_match(value: &str, keyword: &Keyword) -> bool {
        match &keyword.pattern {
            Some(regex) => regex.is_match(value),
            // Keyword::compile 对正则条件总会生成 pattern
            None => false,
        }
    }
}

/// 解析有限数值，NaN 与无穷大视为非数值
pub fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

//! 规则匹配器
//!
//! 按规则顺序对记录求值，依据匹配策略返回标签，可选记录评估追踪。

use crate::compiler::{CompiledRule, CompiledRuleSet};
use crate::error::LabelError;
use crate::models::Record;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 默认的多标签分隔符
pub const DEFAULT_LABEL_SEPARATOR: &str = "；";

/// 匹配策略
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// 返回第一条命中规则的标签
    #[default]
    FirstMatch,
    /// 返回所有命中规则的标签（按规则顺序去重后拼接）
    AllMatches { separator: String },
}

impl MatchPolicy {
    pub fn all_matches() -> Self {
        Self::AllMatches {
            separator: DEFAULT_LABEL_SEPARATOR.to_string(),
        }
    }

    fn stops_at_first(&self) -> bool {
        matches!(self, Self::FirstMatch)
    }
}

impl FromStr for MatchPolicy {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_match" | "first" => Ok(Self::FirstMatch),
            "all_matches" | "all" => Ok(Self::all_matches()),
            _ => Err(LabelError::InvalidPolicy {
                token: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => write!(f, "first_match"),
            Self::AllMatches { .. } => write!(f, "all_matches"),
        }
    }
}

/// 匹配结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// 输出标签，没有命中时为 `None`
    pub label: Option<String>,
    /// 命中规则的下标
    pub matched_rules: Vec<usize>,
    pub evaluation_trace: Vec<String>,
}

/// 规则匹配器
///
/// 持有只读的编译规则集，可通过 `clone` 在多个线程中使用。
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Arc<CompiledRuleSet>,
    policy: MatchPolicy,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleMatcher {
    pub fn new(rules: Arc<CompiledRuleSet>) -> Self {
        Self {
            rules,
            policy: MatchPolicy::default(),
            trace_enabled: false,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// 返回记录的标签
    pub fn match_record(&self, record: &Record) -> Option<String> {
        self.execute(record).label
    }

    /// 执行匹配
    pub fn execute(&self, record: &Record) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        for rule in self.rules.iter() {
            if !self.evaluate_rule(rule, record, &mut outcome) {
                continue;
            }

            outcome.matched_rules.push(rule.index);
            if self.policy.stops_at_first() {
                if self.trace_enabled {
                    outcome
                        .evaluation_trace
                        .push(format!("rules[{}]: 首条命中，停止匹配", rule.index));
                }
                break;
            }
        }

        outcome.label = self.resolve_label(&outcome.matched_rules);
        outcome
    }

    fn evaluate_rule(&self, rule: &CompiledRule, record: &Record, outcome: &mut MatchOutcome) -> bool {
        let matched = rule.is_match(record);

        if self.trace_enabled {
            let clause1 = &rule.clause1.clause;
            let mut line = format!(
                "rules[{}]: {} {} '{}' => {}",
                rule.index,
                clause1.field,
                clause1.condition,
                clause1.keyword,
                rule.clause1.evaluate(record)
            );
            if let Some(compiled) = &rule.clause2 {
                let clause2 = &compiled.clause;
                line.push_str(&format!(
                    " {} {} {} '{}' => {}",
                    rule.logic,
                    clause2.field,
                    clause2.condition,
                    clause2.keyword,
                    compiled.evaluate(record)
                ));
            }
            line.push_str(if matched { " MATCHED" } else { " NOT_MATCHED" });
            outcome.evaluation_trace.push(line);
        }

        matched
    }

    fn resolve_label(&self, matched: &[usize]) -> Option<String> {
        let mut labels: Vec<&str> = Vec::new();
        for &index in matched {
            let label = self.rules.rules[index].label.as_str();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        if labels.is_empty() {
            return None;
        }

        match &self.policy {
            MatchPolicy::FirstMatch => Some(labels[0].to_string()),
            MatchPolicy::AllMatches { separator } => Some(labels.join(separator)),
        }
    }
}

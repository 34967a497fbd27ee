//! 规则编译器
//!
//! 校验规则集并预处理关键字（多选项拆分、正则预编译），生成可在多线程间共享的只读执行结构。

use crate::error::{LabelError, Result};
use crate::evaluator::{ConditionEvaluator, Keyword};
use crate::models::{Clause, Record, Rule, RuleSet};
use crate::operators::Logic;
use std::collections::BTreeSet;

/// 编译后的子句
#[derive(Debug, Clone)]
pub struct CompiledClause {
    pub clause: Clause,
    keyword: Keyword,
}

impl CompiledClause {
    fn compile(clause: Clause) -> Result<Self> {
        let keyword = Keyword::compile(clause.condition, &clause.keyword)?;
        Ok(Self { clause, keyword })
    }

    /// 对记录求值，缺失字段按空字符串处理
    pub fn evaluate(&self, record: &Record) -> bool {
        let value = record.get(&self.clause.field);
        ConditionEvaluator::evaluate_keyword(value, self.clause.condition, &self.keyword)
    }

    pub fn keyword(&self) -> &Keyword {
        &self.keyword
    }
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 规则在规则集中的位置（从 0 开始）
    pub index: usize,
    pub clause1: CompiledClause,
    pub logic: Logic,
    /// 仅在 `logic` 为 AND/OR 时保留
    pub clause2: Option<CompiledClause>,
    pub label: String,
}

impl CompiledRule {
    /// 规则是否命中
    ///
    /// 先求值第一子句；AND/OR 时再求值第二子句，缺失的第二子句视为恒真。
    pub fn is_match(&self, record: &Record) -> bool {
        let first = self.clause1.evaluate(record);
        match self.logic {
            Logic::None => first,
            Logic::And => first && self.clause2_matches(record),
            Logic::Or => first || self.clause2_matches(record),
        }
    }

    fn clause2_matches(&self, record: &Record) -> bool {
        self.clause2
            .as_ref()
            .is_none_or(|clause| clause.evaluate(record))
    }
}

/// 编译后的规则集
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    /// 原始规则集
    pub source: RuleSet,
    pub rules: Vec<CompiledRule>,
    /// 规则中引用的所有字段名称
    pub required_fields: BTreeSet<String>,
    /// 编译版本号
    pub compile_version: u64,
}

impl CompiledRuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 从 JSON 规则表编译
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledRuleSet> {
        let rules = RuleSet::from_json(json)?;
        self.compile(rules)
    }

    /// 编译规则集
    pub fn compile(&mut self, rules: RuleSet) -> Result<CompiledRuleSet> {
        let compiled = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| self.compile_rule(index, rule))
            .collect::<Result<Vec<_>>>()?;

        let required_fields = self.extract_fields(&rules);

        self.compile_version += 1;

        Ok(CompiledRuleSet {
            source: rules,
            rules: compiled,
            required_fields,
            compile_version: self.compile_version,
        })
    }

    fn compile_rule(&self, index: usize, rule: &Rule) -> Result<CompiledRule> {
        self.validate_rule(index, rule)?;

        let clause1 = CompiledClause::compile(rule.clause1.clone())?;
        let clause2 = rule
            .effective_clause2()
            .cloned()
            .map(CompiledClause::compile)
            .transpose()?;

        Ok(CompiledRule {
            index,
            clause1,
            logic: rule.logic,
            clause2,
            label: rule.label.clone(),
        })
    }

    /// 校验规则结构，直接构造的规则与规则表行遵循同样的约束
    fn validate_rule(&self, index: usize, rule: &Rule) -> Result<()> {
        let row = index + 1;

        if rule.label.trim().is_empty() {
            return Err(LabelError::InvalidRule {
                row,
                reason: "类别标签不能为空".to_string(),
            });
        }

        let clauses = std::iter::once(&rule.clause1).chain(rule.effective_clause2());
        for clause in clauses {
            if clause.field.trim().is_empty() && !clause.is_unconstrained() {
                return Err(LabelError::InvalidRule {
                    row,
                    reason: format!("筛选条件 '{}' 缺少筛选字段", clause.condition),
                });
            }
        }

        Ok(())
    }

    /// 提取规则中需要读取的字段
    fn extract_fields(&self, rules: &RuleSet) -> BTreeSet<String> {
        rules
            .iter()
            .flat_map(|rule| std::iter::once(&rule.clause1).chain(rule.effective_clause2()))
            .filter(|clause| !clause.is_unconstrained())
            .map(|clause| clause.field.clone())
            .collect()
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

//! SimpleLabel 规则标注引擎
//!
//! 根据用户编写的筛选规则为表格记录打标签，支持：
//! - 规则表行解析为强类型规则
//! - 关键字预编译（多选项拆分、正则预编译）
//! - 首条命中 / 全部命中两种匹配策略
//! - 将同一套规则编译为 SQL 条件表达式

pub mod adapter;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod ingest;
pub mod labeler;
pub mod matcher;
pub mod models;
pub mod operators;
pub mod sql;

pub use adapter::{
    normalize, AttributeRecordSource, MappingRecordSource, RawRecord, RecordInput, RecordSource,
};
pub use compiler::{CompiledClause, CompiledRule, CompiledRuleSet, RuleCompiler};
pub use error::{LabelError, Result};
pub use evaluator::{ConditionEvaluator, Keyword};
pub use ingest::{rule_template, RuleRow};
pub use labeler::{LabeledRecord, Labeler, LabelingSummary};
pub use matcher::{MatchOutcome, MatchPolicy, RuleMatcher};
pub use models::{Clause, FieldMapping, Record, Rule, RuleSet};
pub use operators::{ConditionKind, Logic};
pub use sql::{DialectKind, IdentifierMap, SqlCompiler, SqlDialect, SqlPredicate};

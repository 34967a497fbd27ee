//! 批量标注
//!
//! 对数据文件中的每一行执行标准化与规则匹配，输出带标签的行并统计结果。

use crate::adapter::{type_name, RawRecord};
use crate::error::{LabelError, Result};
use crate::matcher::RuleMatcher;
use crate::models::{FieldMapping, Record};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 单行标注结果
#[derive(Debug, Clone, Serialize)]
pub struct LabeledRecord {
    /// 数据行序号（从 0 开始）
    pub row: usize,
    pub label: Option<String>,
    pub matched_rules: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

/// 标注统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelingSummary {
    pub total: usize,
    pub labeled: usize,
    pub unlabeled: usize,
    /// 标签 -> 行数
    pub label_counts: BTreeMap<String, usize>,
    pub elapsed_ms: u64,
}

/// 批量标注器
pub struct Labeler {
    matcher: RuleMatcher,
    field_mapping: FieldMapping,
}

impl Labeler {
    pub fn new(matcher: RuleMatcher, field_mapping: FieldMapping) -> Self {
        Self {
            matcher,
            field_mapping,
        }
    }

    /// 标注单行原始数据
    pub fn label_row(&self, row: usize, raw: RawRecord) -> LabeledRecord {
        let record = Record::from_raw(&raw, &self.field_mapping);
        let outcome = self.matcher.execute(&record);
        debug!(row, label = ?outcome.label, "数据行标注完成");

        LabeledRecord {
            row,
            label: outcome.label,
            matched_rules: outcome.matched_rules,
            evaluation_trace: outcome.evaluation_trace,
        }
    }

    /// 标注全部数据行，每行必须是 JSON 对象
    #[instrument(skip(self, rows), fields(rules = self.matcher.rules().len(), policy = %self.matcher.policy()))]
    pub fn label_rows(&self, rows: Vec<Value>) -> Result<(Vec<LabeledRecord>, LabelingSummary)> {
        let start = Instant::now();
        self.warn_unmapped_fields();

        let mut results = Vec::with_capacity(rows.len());
        let mut summary = LabelingSummary::default();

        for (index, row) in rows.into_iter().enumerate() {
            let raw = match row {
                Value::Object(map) => map,
                other => {
                    warn!(row = index, "数据行不是对象");
                    return Err(LabelError::UnsupportedInput(format!(
                        "第 {} 行数据应为对象，实际为 {}",
                        index + 1,
                        type_name(&other)
                    )));
                }
            };

            let labeled = self.label_row(index, raw);
            summary.total += 1;
            match &labeled.label {
                Some(label) => {
                    summary.labeled += 1;
                    *summary.label_counts.entry(label.clone()).or_default() += 1;
                }
                None => summary.unlabeled += 1,
            }
            results.push(labeled);
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            total = summary.total,
            labeled = summary.labeled,
            unlabeled = summary.unlabeled,
            elapsed_ms = summary.elapsed_ms,
            "批量标注完成"
        );

        Ok((results, summary))
    }

    /// 规则引用了字段映射中没有的字段时给出提示，这些子句会按空值求值
    fn warn_unmapped_fields(&self) {
        for field in &self.matcher.rules().required_fields {
            if !self.field_mapping.contains_key(field) {
                warn!(field = %field, "规则字段未配置字段映射，将按空值处理");
            }
        }
    }
}

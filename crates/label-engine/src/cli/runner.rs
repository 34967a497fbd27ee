//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑，命令行参数优先于配置文件。

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{info, warn};

use simplelabel_shared::config::AppConfig;

use crate::adapter::{parse_field_mapping, type_name};
use crate::compiler::RuleCompiler;
use crate::ingest::{RuleRow, rule_template};
use crate::labeler::{LabeledRecord, Labeler};
use crate::matcher::{MatchPolicy, RuleMatcher};
use crate::models::RuleSet;
use crate::sql::{DialectKind, IdentifierMap, SqlCompiler};

/// 带追踪输出时附加的列名
const TRACE_COLUMN: &str = "评估追踪";

/// 命令执行器
pub struct CommandRunner {
    config: AppConfig,
}

impl CommandRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 执行 template 命令
    pub fn run_template(&self, output: Option<&Path>) -> Result<()> {
        let template = serde_json::to_string_pretty(&rule_template())?;
        write_output(output, &template)?;
        info!(headers = RuleRow::HEADERS.len(), "规则模板已生成");
        Ok(())
    }

    /// 执行 check 命令，返回规则数量
    pub fn run_check(&self, rules: &Path) -> Result<usize> {
        let rule_set = read_rule_set(rules)?;
        let compiled = RuleCompiler::new()
            .compile(rule_set)
            .with_context(|| format!("编译规则表失败: {}", rules.display()))?;

        let fields: Vec<&str> = compiled.required_fields.iter().map(String::as_str).collect();
        info!(rules = compiled.len(), fields = ?fields, "规则表校验通过");
        println!("规则数量: {}", compiled.len());
        println!("引用字段: {}", fields.join(", "));

        Ok(compiled.len())
    }

    /// 执行 label 命令
    pub fn run_label(
        &self,
        rules: &Path,
        data: &Path,
        mapping: &Path,
        output: Option<&Path>,
        policy: Option<&str>,
        trace: bool,
    ) -> Result<()> {
        let rule_set = read_rule_set(rules)?;
        let compiled = RuleCompiler::new()
            .compile(rule_set)
            .with_context(|| format!("编译规则表失败: {}", rules.display()))?;

        let field_mapping = parse_field_mapping(&read_json(mapping)?)
            .with_context(|| format!("字段映射无效: {}", mapping.display()))?;

        let policy = self.resolve_policy(policy)?;
        let mut matcher = RuleMatcher::new(Arc::new(compiled)).with_policy(policy);
        if trace {
            matcher = matcher.with_trace();
        }

        let rows = match read_json(data)? {
            Value::Array(rows) => rows,
            other => {
                return Err(anyhow!(
                    "数据文件应为 JSON 数组: {} ({})",
                    data.display(),
                    type_name(&other)
                ));
            }
        };

        let labeler = Labeler::new(matcher, field_mapping);
        let (results, summary) = labeler.label_rows(rows.clone())?;

        let labeled_rows: Vec<Value> = rows
            .into_iter()
            .zip(results)
            .map(|(row, result)| self.append_label(row, result))
            .collect();

        write_output(output, &serde_json::to_string_pretty(&labeled_rows)?)?;
        info!(
            total = summary.total,
            labeled = summary.labeled,
            unlabeled = summary.unlabeled,
            labels = ?summary.label_counts,
            "标注结果已输出"
        );

        Ok(())
    }

    /// 执行 sql 命令
    pub fn run_sql(
        &self,
        rules: &Path,
        identifiers: &Path,
        dialect: Option<&str>,
        joined: Option<bool>,
        output: Option<&Path>,
    ) -> Result<()> {
        let sql_config = &self.config.sql;
        let dialect: DialectKind = dialect.unwrap_or(sql_config.dialect.as_str()).parse()?;
        let joined = joined.unwrap_or(sql_config.joined);

        let rule_set = read_rule_set(rules)?;
        let identifiers = IdentifierMap::from_json(&read_text(identifiers)?)
            .with_context(|| format!("字段标识文件无效: {}", identifiers.display()))?;

        let compiler = SqlCompiler::for_dialect(dialect);
        let sql = if joined {
            compiler.compile_case(&rule_set, &identifiers, sql_config.else_label.as_deref())?
        } else {
            compiler
                .compile(&rule_set, &identifiers)?
                .iter()
                .map(|p| p.annotated())
                .collect::<Vec<_>>()
                .join("\n")
        };

        write_output(output, &sql)?;
        info!(rules = rule_set.len(), dialect = %dialect, joined, "SQL 条件已生成");

        Ok(())
    }

    fn resolve_policy(&self, policy: Option<&str>) -> Result<MatchPolicy> {
        let policy: MatchPolicy = policy
            .unwrap_or(self.config.labeling.policy.as_str())
            .parse()?;

        Ok(match policy {
            MatchPolicy::AllMatches { .. } => MatchPolicy::AllMatches {
                separator: self.config.labeling.separator.clone(),
            },
            other => other,
        })
    }

    /// 在原始数据行上追加标签列
    fn append_label(&self, row: Value, result: LabeledRecord) -> Value {
        let labeling = &self.config.labeling;
        let mut row = match row {
            Value::Object(map) => map,
            // label_rows 已拒绝非对象行
            other => return other,
        };

        let label = result.label.or_else(|| labeling.unlabeled_label.clone());
        row.insert(
            labeling.label_column.clone(),
            label.map(Value::String).unwrap_or(Value::Null),
        );
        if !result.evaluation_trace.is_empty() {
            row.insert(
                TRACE_COLUMN.to_string(),
                Value::Array(result.evaluation_trace.into_iter().map(Value::String).collect()),
            );
        }

        Value::Object(row)
    }
}

/// 读取规则表，接受行数组或 `template` 命令输出的 `{"rules": [...]}`
fn read_rule_set(path: &Path) -> Result<RuleSet> {
    let rows = match read_json(path)? {
        Value::Object(mut map) => map
            .remove("rules")
            .ok_or_else(|| anyhow!("规则文件缺少 rules 字段: {}", path.display()))?,
        other => other,
    };

    let rows: Vec<RuleRow> = serde_json::from_value(rows)
        .with_context(|| format!("规则表格式错误: {}", path.display()))?;
    if rows.is_empty() {
        warn!(path = %path.display(), "规则表为空");
    }

    RuleSet::from_rows(rows).with_context(|| format!("规则表无效: {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("读取文件失败: {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    serde_json::from_str(&read_text(path)?)
        .with_context(|| format!("解析 JSON 失败: {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", content))
                .with_context(|| format!("写入文件失败: {}", path.display()))?;
            info!(path = %path.display(), "结果已写入文件");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", content)?;
        }
    }
    Ok(())
}

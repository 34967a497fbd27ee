//! 规则表解析
//!
//! 规则表为固定列的表格（上传的规则文件或表单录入），每一行对应一条规则。

use crate::error::{LabelError, Result};
use crate::models::{Clause, Rule};
use crate::operators::{ConditionKind, Logic};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// 规则表行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    #[serde(rename = "筛选字段1", default, deserialize_with = "cell")]
    pub field1: String,
    #[serde(rename = "筛选条件1", default, deserialize_with = "cell")]
    pub condition1: String,
    #[serde(rename = "关键字1", default, deserialize_with = "cell")]
    pub keyword1: String,
    #[serde(rename = "关联条件", default, deserialize_with = "cell")]
    pub logic: String,
    #[serde(
        rename = "（可选）筛选字段2",
        alias = "筛选字段2",
        default,
        deserialize_with = "cell"
    )]
    pub field2: String,
    #[serde(
        rename = "（可选）筛选条件2",
        alias = "筛选条件2",
        default,
        deserialize_with = "cell"
    )]
    pub condition2: String,
    #[serde(
        rename = "（可选）关键字2",
        alias = "关键字2",
        default,
        deserialize_with = "cell"
    )]
    pub keyword2: String,
    #[serde(rename = "类别标签", alias = "账单类别", default, deserialize_with = "cell")]
    pub label: String,
}

impl RuleRow {
    /// 规则表表头
    pub const HEADERS: [&'static str; 8] = [
        "筛选字段1",
        "筛选条件1",
        "关键字1",
        "关联条件",
        "（可选）筛选字段2",
        "（可选）筛选条件2",
        "（可选）关键字2",
        "类别标签",
    ];

    /// 转换为规则
    ///
    /// `row` 为从 1 开始的行号，仅用于错误信息。
    pub fn into_rule(self, row: usize) -> Result<Rule> {
        let label = self.label.trim().to_string();
        if label.is_empty() {
            return Err(LabelError::InvalidRule {
                row,
                reason: "类别标签不能为空".to_string(),
            });
        }

        let clause1 = build_clause(row, &self.field1, &self.condition1, &self.keyword1)?;
        let logic: Logic = self.logic.parse()?;

        let clause2 = if [&self.field2, &self.condition2, &self.keyword2]
            .iter()
            .all(|value| value.trim().is_empty())
        {
            None
        } else {
            Some(build_clause(row, &self.field2, &self.condition2, &self.keyword2)?)
        };

        Ok(Rule {
            clause1,
            logic,
            clause2,
            label,
        })
    }
}

impl From<&Rule> for RuleRow {
    fn from(rule: &Rule) -> Self {
        let (field2, condition2, keyword2) = match &rule.clause2 {
            Some(c) => (c.field.clone(), c.condition.token().to_string(), c.keyword.clone()),
            None => Default::default(),
        };

        Self {
            field1: rule.clause1.field.clone(),
            condition1: rule.clause1.condition.token().to_string(),
            keyword1: rule.clause1.keyword.clone(),
            logic: rule.logic.token().to_string(),
            field2,
            condition2,
            keyword2,
            label: rule.label.clone(),
        }
    }
}

fn build_clause(row: usize, field: &str, condition: &str, keyword: &str) -> Result<Clause> {
    let condition: ConditionKind = condition.parse()?;
    let field = field.trim();

    if field.is_empty() && condition != ConditionKind::Noop {
        return Err(LabelError::InvalidRule {
            row,
            reason: format!("筛选条件 '{}' 缺少筛选字段", condition),
        });
    }

    Ok(Clause::new(field, condition, keyword))
}

/// 单元格统一转为文本：表格导出的数字、布尔值按字面量处理，空值视为空字符串
fn cell<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

/// 规则模板：表头与一条示例规则
pub fn rule_template() -> Value {
    let sample = RuleRow {
        field1: "动账摘要".to_string(),
        condition1: ConditionKind::Contains.token().to_string(),
        keyword1: "预扣费；操作费；配送费；拦截费".to_string(),
        logic: Logic::And.token().to_string(),
        field2: "金额".to_string(),
        condition2: ConditionKind::Greater.token().to_string(),
        keyword2: "0".to_string(),
        label: "偏远地区物流费服务费".to_string(),
    };

    json!({
        "headers": RuleRow::HEADERS,
        "conditions": ConditionKind::ALL.iter().map(|c| c.token()).collect::<Vec<_>>(),
        "logics": [Logic::None.token(), Logic::And.token(), Logic::Or.token()],
        "rules": [sample],
    })
}

//! SQL 条件编译器

use super::dialect::{DialectKind, SqlDialect};
use super::IdentifierMap;
use crate::error::Result;
use crate::evaluator::{compile_pattern, parse_number, split_alternatives};
use crate::models::{Clause, Rule, RuleSet};
use crate::operators::{ConditionKind, Logic};
use serde::Serialize;

/// 恒真表达式，用于空条件子句
const ALWAYS_TRUE: &str = "1 = 1";

/// 单条规则的 SQL 条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlPredicate {
    pub predicate: String,
    pub label: String,
}

impl SqlPredicate {
    /// 渲染为带标签注释的 SQL 片段
    ///
    /// 标签中的换行会被替换为空格，注释不会跨行。
    pub fn annotated(&self) -> String {
        let label: String = self
            .label
            .chars()
            .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
            .collect();
        format!("-- {}\n{}", label, self.predicate)
    }
}

/// SQL 条件编译器
pub struct SqlCompiler {
    dialect: Box<dyn SqlDialect>,
}

impl SqlCompiler {
    pub fn new(dialect: Box<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    pub fn for_dialect(kind: DialectKind) -> Self {
        Self::new(kind.build())
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    /// 按规则顺序生成 (条件, 标签)
    pub fn compile(&self, rules: &RuleSet, identifiers: &IdentifierMap) -> Result<Vec<SqlPredicate>> {
        rules
            .iter()
            .map(|rule| {
                Ok(SqlPredicate {
                    predicate: self.render_rule(rule, identifiers)?,
                    label: rule.label.clone(),
                })
            })
            .collect()
    }

    /// 生成 `CASE WHEN ... END` 表达式，规则顺序即优先级
    ///
    /// 规则集为空时直接返回 ELSE 值（未提供时为 `NULL`）。
    pub fn compile_case(
        &self,
        rules: &RuleSet,
        identifiers: &IdentifierMap,
        else_label: Option<&str>,
    ) -> Result<String> {
        let predicates = self.compile(rules, identifiers)?;
        let else_value = else_label.map(|label| self.dialect.quote_literal(label));

        if predicates.is_empty() {
            return Ok(else_value.unwrap_or_else(|| "NULL".to_string()));
        }

        let mut sql = String::from("CASE");
        for p in &predicates {
            sql.push_str(&format!(
                "\n  WHEN {} THEN {}",
                p.predicate,
                self.dialect.quote_literal(&p.label)
            ));
        }
        if let Some(value) = else_value {
            sql.push_str(&format!("\n  ELSE {}", value));
        }
        sql.push_str("\nEND");

        Ok(sql)
    }

    /// 渲染单条规则
    pub fn render_rule(&self, rule: &Rule, identifiers: &IdentifierMap) -> Result<String> {
        let first = self.render_clause(&rule.clause1, identifiers)?;

        let connective = match rule.logic {
            Logic::None => return Ok(first),
            Logic::And => "AND",
            Logic::Or => "OR",
        };

        let second = match &rule.clause2 {
            Some(clause) => self.render_clause(clause, identifiers)?,
            None => ALWAYS_TRUE.to_string(),
        };

        Ok(format!("({}) {} ({})", first, connective, second))
    }

    /// 渲染单个子句
    pub fn render_clause(&self, clause: &Clause, identifiers: &IdentifierMap) -> Result<String> {
        if clause.is_unconstrained() {
            return Ok(ALWAYS_TRUE.to_string());
        }

        let column = identifiers.column(&clause.field)?;
        // 正则关键字原样保留
        let keyword = if clause.condition.is_regex() {
            clause.keyword.as_str()
        } else {
            clause.keyword.trim()
        };
        let negated = clause.condition.is_negated();

        let sql = match clause.condition {
            ConditionKind::Noop => ALWAYS_TRUE.to_string(),
            ConditionKind::IsEmpty => format!("({0} IS NULL OR TRIM({0}) = '')", column),
            ConditionKind::NotEmpty => format!("({0} IS NOT NULL AND TRIM({0}) <> '')", column),
            ConditionKind::Equals | ConditionKind::NotEquals => {
                let op = if negated { "<>" } else { "=" };
                self.join_alternatives(keyword, negated, |alt| {
                    format!("{} {} {}", column, op, self.dialect.quote_literal(alt))
                })
            }
            ConditionKind::Greater
            | ConditionKind::GreaterEqual
            | ConditionKind::Less
            | ConditionKind::LessEqual => {
                format!(
                    "{} {} {}",
                    column,
                    ordering_operator(clause.condition),
                    self.ordering_operand(keyword)
                )
            }
            ConditionKind::Contains | ConditionKind::NotContains => {
                self.join_alternatives(keyword, negated, |alt| {
                    let pattern = format!("%{}%", self.escape_like(alt));
                    self.dialect.like(column, &pattern, negated)
                })
            }
            ConditionKind::StartsWith | ConditionKind::NotStartsWith => {
                self.join_alternatives(keyword, negated, |alt| {
                    let pattern = format!("{}%", self.escape_like(alt));
                    self.dialect.like(column, &pattern, negated)
                })
            }
            ConditionKind::EndsWith | ConditionKind::NotEndsWith => {
                self.join_alternatives(keyword, negated, |alt| {
                    let pattern = format!("%{}", self.escape_like(alt));
                    self.dialect.like(column, &pattern, negated)
                })
            }
            ConditionKind::RegexMatch | ConditionKind::RegexNotMatch => {
                compile_pattern(keyword)?;
                self.dialect
                    .regex_match(column, &self.dialect.quote_literal(keyword), negated)
            }
        };

        Ok(sql)
    }

    /// 多选项：肯定条件用 OR 连接，否定条件用 AND 连接
    fn join_alternatives<F>(&self, keyword: &str, negated: bool, render: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let parts: Vec<String> = split_alternatives(keyword)
            .iter()
            .map(|alt| render(alt))
            .collect();

        if parts.len() == 1 {
            return parts.into_iter().next().unwrap_or_default();
        }

        let joiner = if negated { " AND " } else { " OR " };
        format!("({})", parts.join(joiner))
    }

    fn escape_like(&self, value: &str) -> String {
        let escape = self.dialect.like_escape();
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            if c == '%' || c == '_' || c == escape {
                escaped.push(escape);
            }
            escaped.push(c);
        }
        escaped
    }

    fn ordering_operand(&self, keyword: &str) -> String {
        match parse_number(keyword) {
            Some(_) => keyword.to_string(),
            None => self.dialect.quote_literal(keyword),
        }
    }
}

impl Default for SqlCompiler {
    fn default() -> Self {
        Self::for_dialect(DialectKind::default())
    }
}

fn ordering_operator(condition: ConditionKind) -> &'static str {
    match condition {
        ConditionKind::Greater => ">",
        ConditionKind::GreaterEqual => ">=",
        ConditionKind::Less => "<",
        _ => "<=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelError;

    fn identifiers() -> IdentifierMap {
        [("摘要", "summary"), ("金额", "amount"), ("单号", "order_no")]
            .into_iter()
            .collect()
    }

    fn render(condition: ConditionKind, keyword: &str) -> String {
        SqlCompiler::for_dialect(DialectKind::Postgres)
            .render_clause(&Clause::new("摘要", condition, keyword), &identifiers())
            .unwrap()
    }

    #[test]
    fn test_equals() {
        assert_eq!(render(ConditionKind::Equals, "it's"), "summary = 'it''s'");
        assert_eq!(
            render(ConditionKind::Equals, "A；B"),
            "(summary = 'A' OR summary = 'B')"
        );
        assert_eq!(
            render(ConditionKind::NotEquals, "A；B"),
            "(summary <> 'A' AND summary <> 'B')"
        );
    }

    #[test]
    fn test_emptiness() {
        assert_eq!(
            render(ConditionKind::IsEmpty, ""),
            "(summary IS NULL OR TRIM(summary) = '')"
        );
        assert_eq!(
            render(ConditionKind::NotEmpty, "ignored"),
            "(summary IS NOT NULL AND TRIM(summary) <> '')"
        );
    }

    #[test]
    fn test_ordering_numeric_and_text() {
        assert_eq!(render(ConditionKind::Greater, " 10 "), "summary > 10");
        assert_eq!(render(ConditionKind::LessEqual, "abc"), "summary <= 'abc'");
    }

    #[test]
    fn test_like_variants() {
        assert_eq!(
            render(ConditionKind::Contains, "预扣费；操作费"),
            "(summary LIKE '%预扣费%' ESCAPE '\\' OR summary LIKE '%操作费%' ESCAPE '\\')"
        );
        assert_eq!(
            render(ConditionKind::NotStartsWith, "RF"),
            "summary NOT LIKE 'RF%' ESCAPE '\\'"
        );
        assert_eq!(
            render(ConditionKind::EndsWith, "100%"),
            "summary LIKE '%100\\%' ESCAPE '\\'"
        );
        assert_eq!(
            render(ConditionKind::NotContains, "a_b；c"),
            "(summary NOT LIKE '%a\\_b%' ESCAPE '\\' AND summary NOT LIKE '%c%' ESCAPE '\\')"
        );
    }

    #[test]
    fn test_annotated_label_stays_in_comment() {
        let predicate = SqlPredicate {
            predicate: "summary = 'x'".to_string(),
            label: "L\nDELETE FROM t\r\n".to_string(),
        };
        let sql = predicate.annotated();

        assert_eq!(sql, "-- L DELETE FROM t  \nsummary = 'x'");
        assert!(sql.lines().all(|line| line.starts_with("-- ") || line == "summary = 'x'"));
    }

    #[test]
    fn test_regex_keeps_surrounding_whitespace() {
        assert_eq!(render(ConditionKind::RegexMatch, " 费$"), "summary ~ ' 费$'");
        assert_eq!(render(ConditionKind::Equals, " 费 "), "summary = '费'");
    }

    #[test]
    fn test_regex_rendering() {
        assert_eq!(render(ConditionKind::RegexMatch, r"^RF\d+$"), r"summary ~ '^RF\d+$'");
        assert_eq!(render(ConditionKind::RegexNotMatch, "a;b"), "summary !~ 'a;b'");

        let err = SqlCompiler::default()
            .render_clause(
                &Clause::new("摘要", ConditionKind::RegexMatch, "[bad"),
                &identifiers(),
            )
            .unwrap_err();
        assert!(matches!(err, LabelError::InvalidPattern { .. }));
    }

    #[test]
    fn test_noop_clause_needs_no_mapping() {
        let clause = Clause::new("", ConditionKind::Noop, "");
        assert_eq!(
            SqlCompiler::default().render_clause(&clause, &IdentifierMap::new()).unwrap(),
            "1 = 1"
        );
    }

    #[test]
    fn test_rule_connectives() {
        let compiler = SqlCompiler::default();
        let rule = Rule::and(
            Clause::new("摘要", ConditionKind::Equals, "退款"),
            Clause::new("金额", ConditionKind::Less, "0"),
            "退款",
        );
        assert_eq!(
            compiler.render_rule(&rule, &identifiers()).unwrap(),
            "(summary = '退款') AND (amount < 0)"
        );

        let mut single = rule.clone();
        single.logic = Logic::None;
        assert_eq!(
            compiler.render_rule(&single, &identifiers()).unwrap(),
            "summary = '退款'"
        );

        let mut missing = rule;
        missing.logic = Logic::Or;
        missing.clause2 = None;
        assert_eq!(
            compiler.render_rule(&missing, &identifiers()).unwrap(),
            "(summary = '退款') OR (1 = 1)"
        );
    }

    #[test]
    fn test_missing_column_mapping() {
        let rules = RuleSet::new(vec![Rule::single(
            Clause::new("备注", ConditionKind::IsEmpty, ""),
            "x",
        )]);

        let err = SqlCompiler::default().compile(&rules, &identifiers()).unwrap_err();
        assert!(matches!(err, LabelError::MissingColumnMapping { ref field } if field == "备注"));
    }

    #[test]
    fn test_compile_case() {
        let rules = RuleSet::new(vec![
            Rule::single(Clause::new("摘要", ConditionKind::Contains, "预扣费"), "物流费"),
            Rule::single(Clause::new("单号", ConditionKind::StartsWith, "RF"), "退款"),
        ]);

        let sql = SqlCompiler::for_dialect(DialectKind::Sqlite)
            .compile_case(&rules, &identifiers(), Some("未分类"))
            .unwrap();

        assert_eq!(
            sql,
            "CASE\n  WHEN summary LIKE '%预扣费%' ESCAPE '\\' THEN '物流费'\n  WHEN order_no LIKE 'RF%' ESCAPE '\\' THEN '退款'\n  ELSE '未分类'\nEND"
        );
    }

    #[test]
    fn test_compile_case_empty_rules() {
        let compiler = SqlCompiler::default();
        let empty = RuleSet::default();
        assert_eq!(compiler.compile_case(&empty, &identifiers(), None).unwrap(), "NULL");
        assert_eq!(
            compiler.compile_case(&empty, &identifiers(), Some("x")).unwrap(),
            "'x'"
        );
    }
}

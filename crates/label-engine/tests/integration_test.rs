//! 标注引擎集成测试
//!
//! 测试规则表解析、编译、匹配与 SQL 生成的完整流程。

use serde_json::json;
use simplelabel::{
    normalize, Clause, ConditionEvaluator, ConditionKind, IdentifierMap, LabelError, Logic,
    MatchPolicy, Record, RecordInput, Rule, RuleCompiler, RuleMatcher, RuleSet, SqlCompiler,
};
use simplelabel::sql::DialectKind;
use std::sync::Arc;
use std::thread;

/// 账单记录：摘要为预扣费，类别为偏远地区物流费服务费
fn create_bill_record() -> Record {
    let input = RecordInput::try_from(json!({
        "record": {"summary": "预扣费", "type": "偏远地区物流费服务费"},
        "field_mapping": {"（可选）筛选字段2": "summary", "账单类别": "type"}
    }))
    .unwrap();
    normalize(&input).unwrap()
}

fn create_matcher(rules: RuleSet) -> RuleMatcher {
    let compiled = RuleCompiler::new().compile(rules).unwrap();
    RuleMatcher::new(Arc::new(compiled))
}

/// 规则表：覆盖单子句、且、或与正则
fn create_rule_table() -> serde_json::Value {
    json!([
        {
            "筛选字段1": "动账摘要", "筛选条件1": "包含", "关键字1": "预扣费；操作费",
            "关联条件": "且",
            "（可选）筛选字段2": "金额", "（可选）筛选条件2": "大于", "（可选）关键字2": 0,
            "类别标签": "物流费"
        },
        {
            "筛选字段1": "动账摘要", "筛选条件1": "正则匹配", "关键字1": "^退(款|货)",
            "关联条件": "或",
            "（可选）筛选字段2": "金额", "（可选）筛选条件2": "小于", "（可选）关键字2": "0",
            "类别标签": "退款"
        },
        {
            "筛选字段1": "备注", "筛选条件1": "为空", "关键字1": "",
            "类别标签": "无备注"
        }
    ])
}

#[test]
fn test_round_trip_scenario() {
    let record = create_bill_record();
    let rule = Rule::single(
        Clause::new("（可选）筛选字段2", ConditionKind::Contains, "预扣费；操作费"),
        "偏远地区物流费服务费",
    );

    let matcher = create_matcher(RuleSet::new(vec![rule]));
    assert_eq!(
        matcher.match_record(&record).as_deref(),
        Some("偏远地区物流费服务费")
    );
}

#[test]
fn test_no_match_scenario() {
    let record = create_bill_record();
    let rule = Rule::single(
        Clause::new("（可选）筛选字段2", ConditionKind::Equals, "不存在"),
        "偏远地区物流费服务费",
    );

    let matcher = create_matcher(RuleSet::new(vec![rule]));
    assert_eq!(matcher.match_record(&record), None);
}

#[test]
fn test_rule_table_workflow() {
    let rules = RuleSet::from_json(&create_rule_table().to_string()).unwrap();
    assert_eq!(rules.len(), 3);
    assert!(rules.rules()[2].clause2.is_none());

    let matcher = create_matcher(rules);
    let record = |summary: &str, amount: &str, remark: &str| -> Record {
        [("动账摘要", summary), ("金额", amount), ("备注", remark)]
            .into_iter()
            .collect()
    };

    assert_eq!(
        matcher.match_record(&record("操作费", "12", "x")).as_deref(),
        Some("物流费")
    );
    // 金额不满足且条件，落到后续规则
    assert_eq!(
        matcher.match_record(&record("操作费", "-1", "x")).as_deref(),
        Some("退款")
    );
    assert_eq!(
        matcher.match_record(&record("退货", "5", "x")).as_deref(),
        Some("退款")
    );
    assert_eq!(
        matcher.match_record(&record("其他", "5", "  ")).as_deref(),
        Some("无备注")
    );
    assert_eq!(matcher.match_record(&record("其他", "5", "有")), None);
}

#[test]
fn test_first_match_wins_and_all_matches() {
    let rules = RuleSet::new(vec![
        Rule::single(Clause::new("摘要", ConditionKind::StartsWith, "预扣"), "甲"),
        Rule::single(Clause::new("摘要", ConditionKind::EndsWith, "费"), "乙"),
        Rule::single(Clause::new("摘要", ConditionKind::Contains, "扣"), "甲"),
    ]);
    let record: Record = [("摘要", "预扣费")].into_iter().collect();

    let matcher = create_matcher(rules);
    assert_eq!(matcher.match_record(&record).as_deref(), Some("甲"));

    let all = matcher.clone().with_policy(MatchPolicy::all_matches());
    let outcome = all.execute(&record);
    assert_eq!(outcome.label.as_deref(), Some("甲；乙"));
    assert_eq!(outcome.matched_rules, vec![0, 1, 2]);
}

#[test]
fn test_match_is_deterministic() {
    let rules = RuleSet::from_json(&create_rule_table().to_string()).unwrap();
    let matcher = create_matcher(rules);
    let record: Record = [("动账摘要", "预扣费"), ("金额", "3")].into_iter().collect();

    let first = matcher.match_record(&record);
    for _ in 0..100 {
        assert_eq!(matcher.match_record(&record), first);
    }
}

#[test]
fn test_concurrent_matching() {
    let rules = RuleSet::from_json(&create_rule_table().to_string()).unwrap();
    let matcher = create_matcher(rules);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let matcher = matcher.clone();
            thread::spawn(move || {
                let amount = if i % 2 == 0 { "10" } else { "-10" };
                let record: Record = [("动账摘要", "操作费"), ("金额", amount), ("备注", "x")]
                    .into_iter()
                    .collect();
                (i, matcher.match_record(&record))
            })
        })
        .collect();

    for handle in handles {
        let (i, label) = handle.join().unwrap();
        let expected = if i % 2 == 0 { "物流费" } else { "退款" };
        assert_eq!(label.as_deref(), Some(expected));
    }
}

#[test]
fn test_emptiness_and_alternation_properties() {
    let record: Record = [("备注", "   ")].into_iter().collect();
    assert!(ConditionEvaluator::evaluate(record.get("缺失"), ConditionKind::IsEmpty, "").unwrap());
    assert!(ConditionEvaluator::evaluate(record.get("备注"), ConditionKind::IsEmpty, "").unwrap());
    assert!(!ConditionEvaluator::evaluate(record.get("缺失"), ConditionKind::NotEmpty, "").unwrap());

    let kw = "A；B；C";
    assert!(ConditionEvaluator::evaluate("xxBxx", ConditionKind::Contains, kw).unwrap());
    assert!(!ConditionEvaluator::evaluate("xxBxx", ConditionKind::NotContains, kw).unwrap());
    assert!(ConditionEvaluator::evaluate("xyz", ConditionKind::NotContains, kw).unwrap());
}

#[test]
fn test_numeric_fallback() {
    assert!(ConditionEvaluator::evaluate("10", ConditionKind::Greater, "9").unwrap());
    assert!(!ConditionEvaluator::evaluate("abc", ConditionKind::Greater, "abd").unwrap());
}

#[test]
fn test_invalid_rules_fail_fast() {
    let bad_condition = json!([{"筛选字段1": "摘要", "筛选条件1": "近似", "关键字1": "x", "类别标签": "a"}]);
    assert!(matches!(
        RuleSet::from_json(&bad_condition.to_string()),
        Err(LabelError::InvalidCondition { .. })
    ));

    let bad_logic = json!([{
        "筛选字段1": "摘要", "筛选条件1": "等于", "关键字1": "x",
        "关联条件": "异或", "类别标签": "a"
    }]);
    assert!(matches!(
        RuleSet::from_json(&bad_logic.to_string()),
        Err(LabelError::InvalidLogic { .. })
    ));

    let bad_regex = RuleSet::new(vec![Rule::single(
        Clause::new("摘要", ConditionKind::RegexMatch, "(未闭合"),
        "a",
    )]);
    assert!(matches!(
        RuleCompiler::new().compile(bad_regex),
        Err(LabelError::InvalidPattern { .. })
    ));
}

#[test]
fn test_sql_generation() {
    let rules = RuleSet::from_json(&create_rule_table().to_string()).unwrap();
    let identifiers: IdentifierMap = [("动账摘要", "summary"), ("金额", "amount"), ("备注", "remark")]
        .into_iter()
        .collect();
    let compiler = SqlCompiler::for_dialect(DialectKind::Postgres);

    let first = compiler.compile(&rules, &identifiers).unwrap();
    let second = compiler.compile(&rules, &identifiers).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first[1].predicate, "(summary ~ '^退(款|货)') OR (amount < 0)");
    assert_eq!(first[2].predicate, "(remark IS NULL OR TRIM(remark) = '')");

    let case = compiler
        .compile_case(&rules, &identifiers, Some("其他"))
        .unwrap();
    let order: Vec<_> = ["'物流费'", "'退款'", "'无备注'", "ELSE '其他'"]
        .iter()
        .map(|needle| case.find(needle).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_sql_missing_column_mapping() {
    let rules = RuleSet::from_json(&create_rule_table().to_string()).unwrap();
    let identifiers: IdentifierMap = [("动账摘要", "summary"), ("金额", "amount")]
        .into_iter()
        .collect();

    let err = SqlCompiler::default().compile(&rules, &identifiers).unwrap_err();
    match err {
        LabelError::MissingColumnMapping { field } => assert_eq!(field, "备注"),
        other => panic!("预期 MissingColumnMapping，实际为 {:?}", other),
    }
}

#[test]
fn test_logic_none_ignores_second_clause() {
    let mut rule = Rule::and(
        Clause::new("摘要", ConditionKind::Equals, "a"),
        Clause::new("摘要", ConditionKind::Equals, "b"),
        "标签",
    );
    rule.logic = Logic::None;

    let matcher = create_matcher(RuleSet::new(vec![rule]));
    let record: Record = [("摘要", "a")].into_iter().collect();
    assert_eq!(matcher.match_record(&record).as_deref(), Some("标签"));
}

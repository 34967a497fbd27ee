//! 规则匹配性能基准测试
//!
//! 测试覆盖：
//! - 规则数量增长时首条命中与全部命中的开销
//! - 批量标注吞吐

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use simplelabel::{
    Clause, ConditionKind, FieldMapping, Labeler, MatchPolicy, Record, Rule, RuleCompiler,
    RuleMatcher, RuleSet,
};
use std::hint::black_box;
use std::sync::Arc;

/// 创建 n 条规则，只有最后一条能命中
fn create_rule_set(rule_count: usize) -> RuleSet {
    (0..rule_count)
        .map(|i| {
            let keyword = if i + 1 == rule_count {
                "预扣费".to_string()
            } else {
                format!("费用{}；杂费{}", i, i)
            };
            Rule::and(
                Clause::new("动账摘要", ConditionKind::Contains, keyword),
                Clause::new("金额", ConditionKind::Greater, "0"),
                format!("标签{}", i),
            )
        })
        .collect()
}

fn create_matcher(rule_count: usize, policy: MatchPolicy) -> RuleMatcher {
    let compiled = RuleCompiler::new()
        .compile(create_rule_set(rule_count))
        .expect("规则编译失败");
    RuleMatcher::new(Arc::new(compiled)).with_policy(policy)
}

fn bench_rule_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_scaling");
    let record: Record = [("动账摘要", "偏远地区预扣费"), ("金额", "12.5")]
        .into_iter()
        .collect();

    for rule_count in [1usize, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*rule_count as u64));

        let first = create_matcher(*rule_count, MatchPolicy::FirstMatch);
        group.bench_with_input(
            BenchmarkId::new("first_match", rule_count),
            rule_count,
            |b, _| b.iter(|| first.match_record(black_box(&record))),
        );

        let all = create_matcher(*rule_count, MatchPolicy::all_matches());
        group.bench_with_input(
            BenchmarkId::new("all_matches", rule_count),
            rule_count,
            |b, _| b.iter(|| all.match_record(black_box(&record))),
        );
    }

    group.finish();
}

fn bench_batch_labeling(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_labeling");
    let mapping: FieldMapping = [("动账摘要", "summary"), ("金额", "amount")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let labeler = Labeler::new(create_matcher(50, MatchPolicy::FirstMatch), mapping);

    for row_count in [100usize, 1000, 10000].iter() {
        let rows: Vec<Value> = (0..*row_count)
            .map(|i| json!({"summary": if i % 3 == 0 { "预扣费" } else { "其他" }, "amount": i}))
            .collect();

        group.throughput(Throughput::Elements(*row_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(row_count), &rows, |b, rows| {
            b.iter(|| labeler.label_rows(black_box(rows.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rule_scaling, bench_batch_labeling);

criterion_main!(benches);

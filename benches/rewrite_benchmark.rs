use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use std::sync::Arc;
use virtdblib::config::RewriterConfig;
use virtdblib::constants::Nullable;
use virtdblib::engine::objects::types::{DataType, Value};
use virtdblib::engine::objects::{
    Attribute, Command, CompareOperator, Criteria, Expression, FromClause, GroupSymbol, Query,
    Select, SetCriteria, Table,
};
use virtdblib::engine::{BasicMetadata, ConstantEvaluator, Engine};

fn engine() -> Engine {
    let metadata = BasicMetadata::new().with_group(Table::new(
        "t",
        vec![
            Attribute::new("a", DataType::Integer, Nullable::Null),
            Attribute::new("b", DataType::Integer, Nullable::NotNull),
        ],
    ));
    Engine::new(
        Arc::new(metadata),
        Arc::new(ConstantEvaluator::new()),
        RewriterConfig::default(),
    )
}

/// A WHERE clause of `conjuncts` foldable and invertible predicates.
fn query(conjuncts: usize) -> Command {
    let a = Expression::element(Some("t"), "a", DataType::Integer);
    let b = Expression::element(Some("t"), "b", DataType::Integer);
    let int = |i: usize| Expression::constant(Value::Integer(i as i32));
    let criteria = (0..conjuncts)
        .map(|i| match i % 3 {
            0 => Criteria::compare(int(i), CompareOperator::Eq, int(i)),
            1 => Criteria::compare(
                Expression::function("+", vec![a.clone(), int(1)], DataType::Integer),
                CompareOperator::Gt,
                int(i),
            ),
            _ => Criteria::In(SetCriteria {
                expression: b.clone(),
                values: vec![int(i), int(i), Expression::null(DataType::Integer)],
                negated: false,
            }),
        })
        .collect();
    Command::Query(Query {
        select: Select::new(vec![a.clone(), b]),
        from: vec![FromClause::Table(GroupSymbol::new("t"))],
        criteria: Some(Criteria::and(criteria)),
        ..Default::default()
    })
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let engine = engine();

    let mut group = c.benchmark_group("rewrite_where");
    for conjuncts in [10, 100].iter() {
        let command = query(*conjuncts);
        group.bench_with_input(
            BenchmarkId::from_parameter(conjuncts),
            &command,
            |b, command| b.iter(|| engine.rewrite(command.clone())),
        );
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

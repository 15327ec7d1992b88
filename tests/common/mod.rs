use std::sync::Arc;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use virtdblib::config::RewriterConfig;
use virtdblib::constants::Nullable;
use virtdblib::engine::objects::types::{DataType, Value};
use virtdblib::engine::objects::{
    Attribute, Command, Criteria, Expression, FromClause, GroupSymbol, Query, Select, Table,
};
use virtdblib::engine::{BasicMetadata, ConstantEvaluator, Engine};

/// Columns of the test group `t`.
const COLUMNS: &[(&str, DataType, Nullable)] = &[
    ("a", DataType::Integer, Nullable::Null),
    ("b", DataType::Integer, Nullable::NotNull),
    ("s", DataType::String, Nullable::Null),
    ("n", DataType::String, Nullable::NotNull),
    ("x", DataType::Integer, Nullable::Null),
];

pub fn _create_engine() -> Engine {
    //Only the first test in a binary gets to install the logger
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);

    let attributes = COLUMNS
        .iter()
        .map(|(name, data_type, nullable)| Attribute::new(name, *data_type, *nullable))
        .collect();
    let metadata = BasicMetadata::new().with_group(Table::new("t", attributes));
    Engine::new(
        Arc::new(metadata),
        Arc::new(ConstantEvaluator::new()),
        RewriterConfig::default(),
    )
}

pub fn _column(name: &str) -> Expression {
    let data_type = COLUMNS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, t, _)| *t)
        .unwrap_or(DataType::Object);
    Expression::element(Some("t"), name, data_type)
}

pub fn _int(i: i32) -> Expression {
    Expression::constant(Value::Integer(i))
}

pub fn _string(s: &str) -> Expression {
    Expression::constant(Value::String(s.to_string()))
}

pub fn _select(symbols: Vec<Expression>, criteria: Option<Criteria>) -> Query {
    Query {
        select: Select::new(symbols),
        from: vec![FromClause::Table(GroupSymbol::new("t"))],
        criteria,
        ..Default::default()
    }
}

/// Rewrites twice, the second pass must not change anything.
pub fn _rewrite_stable(engine: &Engine, command: Command) -> Result<Command, Box<dyn std::error::Error>> {
    let once = engine.rewrite(command)?;
    let twice = engine.rewrite(once.clone())?;
    assert_eq!(once, twice, "second rewrite changed {}", once);
    Ok(once)
}

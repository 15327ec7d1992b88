mod common;

use virtdblib::engine::objects::types::{DataType, Value};
use virtdblib::engine::objects::{
    Command, CompareOperator, Criteria, Expression, SearchedCaseExpression,
};
use virtdblib::engine::EngineError;
use virtdblib::engine::RewriterError;

use common::{_column, _create_engine, _int, _rewrite_stable, _select, _string};

fn rewrite_symbol(symbol: Expression) -> Result<String, Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let query = _select(vec![symbol], None);
    Ok(_rewrite_stable(&engine, Command::Query(query))?.to_string())
}

#[test]
fn constant_folding() -> Result<(), Box<dyn std::error::Error>> {
    let sum = Expression::function("+", vec![_int(2), _int(3)], DataType::Integer);
    assert_eq!(rewrite_symbol(sum)?, "SELECT 5 FROM t");

    let convert = Expression::convert(_column("s"), DataType::String);
    assert_eq!(rewrite_symbol(convert)?, "SELECT t.s FROM t");

    let null_arg = Expression::function(
        "+",
        vec![_column("a"), Expression::null(DataType::Integer)],
        DataType::Integer,
    );
    assert_eq!(rewrite_symbol(null_arg)?, "SELECT null FROM t");
    Ok(())
}

#[test]
fn case_folding() -> Result<(), Box<dyn std::error::Error>> {
    let first_true = Expression::SearchedCase(SearchedCaseExpression {
        whens: vec![
            Criteria::compare(_int(1), CompareOperator::Eq, _int(1)),
            Criteria::compare(_int(1), CompareOperator::Eq, _int(2)),
        ],
        thens: vec![_string("a"), _string("b")],
        else_expression: None,
        data_type: DataType::String,
    });
    assert_eq!(rewrite_symbol(first_true)?, "SELECT 'a' FROM t");

    let same_result = Expression::SearchedCase(SearchedCaseExpression {
        whens: vec![Criteria::compare(_column("a"), CompareOperator::Eq, _int(1))],
        thens: vec![_string("x")],
        else_expression: Some(Box::new(_string("x"))),
        data_type: DataType::String,
    });
    assert_eq!(rewrite_symbol(same_result)?, "SELECT 'x' FROM t");
    Ok(())
}

#[test]
fn decode_string() -> Result<(), Box<dyn std::error::Error>> {
    let decode = Expression::function(
        "DECODESTRING",
        vec![_column("x"), _string("1,one,2,two,three")],
        DataType::String,
    );
    assert_eq!(
        rewrite_symbol(decode)?,
        "SELECT CASE WHEN t.x = 1 THEN 'one' WHEN t.x = 2 THEN 'two' ELSE 'three' END FROM t"
    );
    Ok(())
}

#[test]
fn evaluation_failures_name_the_function() {
    let engine = _create_engine();
    let divide = Expression::function("/", vec![_int(1), _int(0)], DataType::Integer);
    let query = _select(vec![divide], None);
    match engine.rewrite(Command::Query(query)) {
        Err(EngineError::RewriterError(RewriterError::FunctionEvaluation { function, .. })) => {
            assert_eq!(function, "/")
        }
        other => panic!("Expected a function evaluation failure, got {:?}", other),
    }
}

#[test]
fn oversized_folds_are_errors() {
    let engine = _create_engine();
    let long_max = Expression::constant(Value::Long(i64::MAX));
    let repeat = Expression::function("REPEAT", vec![_string("ab"), long_max.clone()], DataType::String);
    match engine.rewrite(Command::Query(_select(vec![repeat], None))) {
        Err(EngineError::RewriterError(RewriterError::FunctionEvaluation { function, .. })) => {
            assert_eq!(function, "REPEAT")
        }
        other => panic!("Expected a function evaluation failure, got {:?}", other),
    }

    let substring = Expression::function(
        "SUBSTRING",
        vec![_string("abc"), _int(2), long_max],
        DataType::String,
    );
    let rewritten = engine.rewrite(Command::Query(_select(vec![substring], None)));
    assert_eq!(
        rewritten.map(|c| c.to_string()).ok(),
        Some("SELECT 'bc' FROM t".to_string())
    );
}

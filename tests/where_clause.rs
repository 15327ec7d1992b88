mod common;

use virtdblib::engine::objects::types::DataType;
use virtdblib::engine::objects::{
    BetweenCriteria, Command, CompareOperator, Criteria, Expression, GroupSymbol, MatchCriteria,
    Query, SetCriteria,
};

use common::{_column, _create_engine, _int, _rewrite_stable, _select, _string};

fn rewrite_where(criteria: Criteria) -> Result<String, Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let query = _select(vec![_column("a")], Some(criteria));
    Ok(_rewrite_stable(&engine, Command::Query(query))?.to_string())
}

fn a_is_one() -> Criteria {
    Criteria::compare(_column("a"), CompareOperator::Eq, _int(1))
}

#[test]
fn true_and_in_list() -> Result<(), Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let a_plus_one = Expression::function("+", vec![_column("a"), _int(1)], DataType::Integer);
    let criteria = Criteria::and(vec![
        Criteria::compare(_int(1), CompareOperator::Eq, _int(1)),
        Criteria::In(SetCriteria {
            expression: _column("b"),
            values: vec![_int(5)],
            negated: false,
        }),
    ]);
    let query = _select(vec![_column("a"), a_plus_one], Some(criteria));

    let rewritten = _rewrite_stable(&engine, Command::Query(query))?;
    assert_eq!(
        rewritten.to_string(),
        "SELECT t.a, (t.a + 1) FROM t WHERE t.b = 5"
    );
    Ok(())
}

#[test]
fn boolean_identities() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(
        rewrite_where(Criteria::and(vec![Criteria::True, a_is_one()]))?,
        "SELECT t.a FROM t WHERE t.a = 1"
    );
    assert_eq!(
        rewrite_where(Criteria::and(vec![Criteria::False, a_is_one()]))?,
        "SELECT t.a FROM t WHERE 1 = 0"
    );
    assert_eq!(
        rewrite_where(Criteria::or(vec![Criteria::True, a_is_one()]))?,
        "SELECT t.a FROM t"
    );
    assert_eq!(
        rewrite_where(Criteria::or(vec![Criteria::False, a_is_one()]))?,
        "SELECT t.a FROM t WHERE t.a = 1"
    );
    assert_eq!(
        rewrite_where(Criteria::not(Criteria::True))?,
        "SELECT t.a FROM t WHERE 1 = 0"
    );
    // NOT UNKNOWN is still UNKNOWN, which a filter drops
    assert_eq!(
        rewrite_where(Criteria::or(vec![
            Criteria::not(Criteria::Unknown),
            a_is_one()
        ]))?,
        "SELECT t.a FROM t WHERE t.a = 1"
    );
    Ok(())
}

#[test]
fn between_expands() -> Result<(), Box<dyn std::error::Error>> {
    let between = |negated| {
        Criteria::Between(BetweenCriteria {
            expression: _column("a"),
            lower: _int(1),
            upper: _int(5),
            negated,
        })
    };
    assert_eq!(
        rewrite_where(between(false))?,
        "SELECT t.a FROM t WHERE t.a >= 1 AND t.a <= 5"
    );
    assert_eq!(
        rewrite_where(between(true))?,
        "SELECT t.a FROM t WHERE t.a < 1 OR t.a > 5"
    );
    Ok(())
}

#[test]
fn like_without_wildcards() -> Result<(), Box<dyn std::error::Error>> {
    let like = |column: &str, pattern: &str| {
        Criteria::Like(MatchCriteria {
            left: _column(column),
            right: _string(pattern),
            escape: None,
            negated: false,
        })
    };
    assert_eq!(
        rewrite_where(like("s", "abc"))?,
        "SELECT t.a FROM t WHERE t.s = 'abc'"
    );
    assert_eq!(rewrite_where(like("n", "%"))?, "SELECT t.a FROM t");
    Ok(())
}

#[test]
fn in_lists() -> Result<(), Box<dyn std::error::Error>> {
    let only_null = Criteria::In(SetCriteria {
        expression: _column("a"),
        values: vec![Expression::null(DataType::Integer)],
        negated: false,
    });
    assert_eq!(rewrite_where(only_null)?, "SELECT t.a FROM t WHERE 1 = 0");
    Ok(())
}

#[test]
fn functions_move_off_the_column() -> Result<(), Box<dyn std::error::Error>> {
    let plus = Criteria::compare(
        Expression::function("+", vec![_column("a"), _int(1)], DataType::Integer),
        CompareOperator::Eq,
        _int(5),
    );
    assert_eq!(rewrite_where(plus)?, "SELECT t.a FROM t WHERE t.a = 4");

    let convert = Criteria::compare(
        Expression::convert(_column("a"), DataType::String),
        CompareOperator::Eq,
        _string("5"),
    );
    assert_eq!(rewrite_where(convert)?, "SELECT t.a FROM t WHERE t.a = 5");
    Ok(())
}

#[test]
fn delete_without_filter() -> Result<(), Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let delete = Command::Delete(virtdblib::engine::objects::Delete {
        group: GroupSymbol::new("t"),
        criteria: Some(Criteria::compare(_int(2), CompareOperator::Gt, _int(1))),
        options: Default::default(),
    });
    assert_eq!(_rewrite_stable(&engine, delete)?.to_string(), "DELETE FROM t");

    let query = Query {
        having: Some(Criteria::True),
        group_by: vec![_column("a")],
        .._select(vec![_column("a")], None)
    };
    assert_eq!(
        _rewrite_stable(&engine, Command::Query(query))?.to_string(),
        "SELECT t.a FROM t GROUP BY t.a"
    );
    Ok(())
}

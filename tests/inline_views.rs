mod common;

use virtdblib::engine::objects::types::DataType;
use virtdblib::engine::objects::{Command, Expression, OrderBy, OrderByItem, Query};

use common::{_column, _create_engine, _int, _rewrite_stable, _select};

fn a_plus_one() -> Expression {
    Expression::function("+", vec![_column("a"), _int(1)], DataType::Integer)
}

#[test]
fn group_by_expression() -> Result<(), Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let query = Query {
        group_by: vec![a_plus_one()],
        .._select(vec![_column("a")], None)
    };
    let rewritten = _rewrite_stable(&engine, Command::Query(query))?;
    assert_eq!(
        rewritten.to_string(),
        "SELECT X__1.a FROM (SELECT t.a, (t.a + 1) AS EXPR0 FROM t) AS X__1 GROUP BY X__1.EXPR0"
    );
    Ok(())
}

#[test]
fn group_by_expression_with_order_by() -> Result<(), Box<dyn std::error::Error>> {
    let engine = _create_engine();
    let query = Query {
        group_by: vec![a_plus_one()],
        order_by: Some(OrderBy {
            items: vec![OrderByItem::new(
                Expression::element(None, "k", DataType::Integer),
                false,
            )],
        }),
        .._select(vec![Expression::alias("k", a_plus_one())], None)
    };
    let rewritten = _rewrite_stable(&engine, Command::Query(query))?;
    assert_eq!(
        rewritten.to_string(),
        "SELECT X__1.EXPR0 AS k FROM (SELECT t.a, (t.a + 1) AS EXPR0 FROM t) AS X__1 \
         GROUP BY X__1.EXPR0 ORDER BY k DESC"
    );
    match rewritten {
        Command::Query(q) => {
            let positions: Vec<Option<usize>> = q
                .order_by
                .iter()
                .flat_map(|o| o.items.iter().map(|i| i.position))
                .collect();
            assert_eq!(positions, vec![Some(0)]);
        }
        c => panic!("Expected a query, got {}", c),
    }
    Ok(())
}

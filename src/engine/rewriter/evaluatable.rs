//! Decides, without evaluating anything, whether a subtree can be folded to a constant.
use crate::constants::{builtin_function, function_alias, FunctionFlags};
use crate::engine::objects::{Criteria, Expression};

/// No columns, variables, parameters, aggregates, subqueries or non deterministic functions.
pub fn is_fully_evaluable(expression: &Expression) -> bool {
    match expression {
        Expression::Constant(_) => true,
        Expression::Element(_)
        | Expression::Variable(_)
        | Expression::Reference(_)
        | Expression::Aggregate(_)
        | Expression::ScalarSubquery(_) => false,
        Expression::Alias(a) => is_fully_evaluable(&a.expression),
        Expression::Function(f) => {
            let name = function_alias(&f.name).unwrap_or(f.name.as_str());
            let foldable = match builtin_function(name) {
                Some(flags) => !flags.intersects(FunctionFlags::NONDETERMINISTIC | FunctionFlags::MACRO),
                None => false,
            };
            foldable && f.args.iter().all(is_fully_evaluable)
        }
        Expression::Case(c) => {
            is_fully_evaluable(&c.expression)
                && c.whens.iter().all(is_fully_evaluable)
                && c.thens.iter().all(is_fully_evaluable)
                && c.else_expression.as_deref().map(is_fully_evaluable).unwrap_or(true)
        }
        Expression::SearchedCase(c) => {
            c.whens.iter().all(is_fully_evaluable_criteria)
                && c.thens.iter().all(is_fully_evaluable)
                && c.else_expression.as_deref().map(is_fully_evaluable).unwrap_or(true)
        }
    }
}

pub fn is_fully_evaluable_criteria(criteria: &Criteria) -> bool {
    match criteria {
        Criteria::True | Criteria::False | Criteria::Unknown => true,
        Criteria::Compound(c) => c.criteria.iter().all(is_fully_evaluable_criteria),
        Criteria::Not(c) => is_fully_evaluable_criteria(c),
        Criteria::Exists(_)
        | Criteria::SubqueryCompare(_)
        | Criteria::SubqueryIn(_)
        | Criteria::Has(_)
        | Criteria::Translate(_) => false,
        c => c.expressions().into_iter().all(is_fully_evaluable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::objects::types::{DataType, Value};
    use crate::engine::objects::CompareOperator;

    #[test]
    fn test_classification() {
        let one = Expression::constant(Value::Integer(1));
        let column = Expression::element(Some("t"), "a", DataType::Integer);
        let sum = Expression::function("+", vec![one.clone(), one.clone()], DataType::Integer);
        assert!(is_fully_evaluable(&sum));
        assert!(!is_fully_evaluable(&Expression::function(
            "+",
            vec![one.clone(), column.clone()],
            DataType::Integer
        )));
        assert!(!is_fully_evaluable(&Expression::function("NOW", vec![], DataType::Timestamp)));
        assert!(!is_fully_evaluable(&Expression::function("MY_UDF", vec![one.clone()], DataType::Integer)));
        assert!(is_fully_evaluable(&Expression::function("lower", vec![], DataType::String)));

        assert!(is_fully_evaluable_criteria(&Criteria::compare(
            sum,
            CompareOperator::Eq,
            one.clone()
        )));
        assert!(!is_fully_evaluable_criteria(&Criteria::is_null(column, false)));
    }
}

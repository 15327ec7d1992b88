//! Scalar expression rewriting, children first.
use super::evaluatable::is_fully_evaluable;
use super::{ProcedureContext, Rewriter, RewriterError};
use crate::constants::{builtin_function, function_alias, FunctionFlags};
use crate::engine::objects::types::{DataType, Value};
use crate::engine::objects::{
    AggregateKind, AggregateSymbol, AliasSymbol, CaseExpression, CompareOperator, Criteria,
    Expression, Function, ScalarSubquery, SearchedCaseExpression,
};

impl<'a> Rewriter<'a> {
    pub(crate) fn rewrite_expression(
        &self,
        expression: Expression,
        ctx: &ProcedureContext,
    ) -> Result<Expression, RewriterError> {
        match expression {
            Expression::Constant(_) | Expression::Element(_) | Expression::Reference(_) => {
                Ok(expression)
            }
            Expression::Variable(v) => match ctx.lookup(&v.name) {
                Some(bound) => Ok(self.retype(bound.clone(), v.data_type)),
                None => Ok(Expression::Variable(v)),
            },
            Expression::Alias(a) => Ok(Expression::Alias(AliasSymbol {
                name: a.name,
                expression: Box::new(self.rewrite_expression(*a.expression, ctx)?),
            })),
            Expression::Function(f) => self.rewrite_function(f, ctx),
            Expression::Case(c) => self.rewrite_case(c, ctx),
            Expression::SearchedCase(c) => self.rewrite_searched_case(c, ctx),
            Expression::Aggregate(a) => {
                let arg = match a.arg {
                    Some(arg) => Some(Box::new(self.rewrite_expression(*arg, ctx)?)),
                    None => None,
                };
                Ok(Expression::Aggregate(AggregateSymbol { arg, ..a }))
            }
            Expression::ScalarSubquery(s) => Ok(Expression::ScalarSubquery(ScalarSubquery {
                command: Box::new(self.rewrite_command(*s.command, ctx)?),
                data_type: s.data_type,
            })),
        }
    }

    fn rewrite_function(
        &self,
        mut function: Function,
        ctx: &ProcedureContext,
    ) -> Result<Expression, RewriterError> {
        if let Some(canonical) = function_alias(&function.name) {
            function.name = canonical.to_string();
        }
        function.args = function
            .args
            .into_iter()
            .map(|a| self.rewrite_expression(a, ctx))
            .collect::<Result<Vec<Expression>, RewriterError>>()?;

        if let Some(expanded) = self.expand_macro(&function)? {
            trace!("Expanded {} to {}", function, expanded);
            return self.rewrite_expression(expanded, ctx);
        }

        let known = builtin_function(&function.name).is_some();
        if known
            && !self.config.is_null_dependent(&function.name)
            && function.args.iter().any(|a| a.is_null_constant())
        {
            return Ok(Expression::null(function.data_type));
        }

        if function.is_named("CONVERT") && function.args.len() == 2 {
            if function.args[0].data_type() == function.data_type {
                return Ok(function.args.remove(0));
            }
        }

        let expression = Expression::Function(function);
        if !is_fully_evaluable(&expression) {
            return Ok(expression);
        }
        self.fold(&expression)
            .map_err(|source| self.function_error(&expression, source))
    }

    fn function_error(
        &self,
        expression: &Expression,
        source: crate::engine::evaluator::EvaluationError,
    ) -> RewriterError {
        let function = match expression.as_function() {
            Some(f) => f,
            None => return RewriterError::Evaluation(expression.to_string(), source),
        };
        let conversion = builtin_function(&function.name)
            .map(|flags| flags.contains(FunctionFlags::CONVERSION))
            .unwrap_or(false);
        match function.args.first() {
            Some(first) if conversion => RewriterError::Conversion {
                function: function.name.clone(),
                from: first.data_type(),
                to: function.data_type,
                source,
            },
            _ => RewriterError::FunctionEvaluation {
                function: function.name.clone(),
                types: function
                    .args
                    .iter()
                    .map(|a| a.data_type().to_string())
                    .collect::<Vec<String>>()
                    .join(", "),
                source,
            },
        }
    }

    /// A simple CASE becomes a searched CASE with one equality per branch.
    fn rewrite_case(
        &self,
        case: CaseExpression,
        ctx: &ProcedureContext,
    ) -> Result<Expression, RewriterError> {
        let operand = *case.expression;
        let whens = case
            .whens
            .into_iter()
            .map(|w| Criteria::compare(operand.clone(), CompareOperator::Eq, w))
            .collect();
        self.rewrite_searched_case(
            SearchedCaseExpression {
                whens,
                thens: case.thens,
                else_expression: case.else_expression,
                data_type: case.data_type,
            },
            ctx,
        )
    }

    fn rewrite_searched_case(
        &self,
        case: SearchedCaseExpression,
        ctx: &ProcedureContext,
    ) -> Result<Expression, RewriterError> {
        let data_type = case.data_type;
        let mut whens = vec![];
        let mut thens = vec![];
        let mut else_expression = case.else_expression.map(|e| *e);

        for (when, then) in case.whens.into_iter().zip(case.thens.into_iter()) {
            match self.rewrite_criteria(when, ctx, false)? {
                Criteria::True => {
                    // everything after an always taken branch is unreachable
                    else_expression = Some(then);
                    break;
                }
                Criteria::False | Criteria::Unknown => {}
                when => {
                    whens.push(when);
                    thens.push(self.rewrite_expression(then, ctx)?);
                }
            }
        }

        let else_expression = match else_expression {
            Some(e) => self.rewrite_expression(e, ctx)?,
            None => Expression::null(data_type),
        };

        if whens.is_empty() || thens.iter().all(|t| *t == else_expression) {
            return Ok(self.retype(else_expression, data_type));
        }

        let else_expression = if else_expression.is_null_constant() {
            None
        } else {
            Some(Box::new(else_expression))
        };
        let expression = Expression::SearchedCase(SearchedCaseExpression {
            whens,
            thens,
            else_expression,
            data_type,
        });
        if is_fully_evaluable(&expression) {
            return self
                .fold(&expression)
                .map_err(|e| RewriterError::Evaluation(expression.to_string(), e));
        }
        Ok(expression)
    }

    /// MIN, MAX and AVG of a non null constant over a non empty group are that constant.
    pub(crate) fn demote_aggregate(&self, expression: &Expression) -> Option<Expression> {
        let aggregate = match expression {
            Expression::Aggregate(a) => a,
            _ => return None,
        };
        if !matches!(
            aggregate.kind,
            AggregateKind::Min | AggregateKind::Max | AggregateKind::Avg
        ) {
            return None;
        }
        match aggregate.arg.as_deref() {
            Some(Expression::Constant(c)) if !c.is_null() => {
                let value = c.value.convert(aggregate.data_type).ok()?;
                trace!("Demoted {} to {}", expression, value);
                Some(Expression::typed_constant(value, aggregate.data_type))
            }
            _ => None,
        }
    }
}

/// The constant DECODE compares against, `null` or an empty token means IS NULL.
pub(crate) fn is_null_token(token: &str) -> bool {
    token.is_empty() || token.eq_ignore_ascii_case("null")
}

pub(crate) fn string_constant(expression: &Expression) -> Option<&str> {
    match expression {
        Expression::Constant(c) => match &c.value {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn empty_string() -> Expression {
    Expression::typed_constant(Value::String(String::new()), DataType::String)
}

#[cfg(test)]
mod tests {
    use super::super::super::evaluator::ConstantEvaluator;
    use super::super::super::metadata::BasicMetadata;
    use super::*;
    use crate::config::RewriterConfig;
    use crate::engine::objects::{Command, FromClause, GroupSymbol, Query, Select};

    fn int(i: i32) -> Expression {
        Expression::constant(Value::Integer(i))
    }

    fn string(s: &str) -> Expression {
        Expression::constant(Value::String(s.to_string()))
    }

    fn rewrite(expression: Expression) -> Result<Expression, RewriterError> {
        let metadata = BasicMetadata::new();
        let evaluator = ConstantEvaluator::new();
        let config = RewriterConfig::default();
        let rewriter = Rewriter::new(&metadata, &evaluator, &config);
        rewriter.rewrite_expression(expression, &ProcedureContext::new())
    }

    #[test]
    fn test_fold() -> Result<(), Box<dyn std::error::Error>> {
        let sum = Expression::function("+", vec![int(2), int(3)], DataType::Integer);
        assert_eq!(rewrite(sum)?, int(5));
        Ok(())
    }

    #[test]
    fn test_fold_failure_names_the_function() {
        let div = Expression::function("/", vec![int(2), int(0)], DataType::Integer);
        match rewrite(div) {
            Err(RewriterError::FunctionEvaluation { function, types, .. }) => {
                assert_eq!(function, "/");
                assert_eq!(types, "integer, integer");
            }
            other => panic!("unexpected {:?}", other),
        }

        let conv = Expression::convert(string("x"), DataType::Integer);
        match rewrite(conv) {
            Err(RewriterError::Conversion { from, to, .. }) => {
                assert_eq!(from, DataType::String);
                assert_eq!(to, DataType::Integer);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scalar_subquery_is_rewritten() -> Result<(), Box<dyn std::error::Error>> {
        let inner = Query {
            select: Select::new(vec![Expression::function(
                "+",
                vec![int(2), int(3)],
                DataType::Integer,
            )]),
            from: vec![FromClause::Table(GroupSymbol::new("t"))],
            ..Default::default()
        };
        let scalar = Expression::ScalarSubquery(ScalarSubquery {
            command: Box::new(Command::Query(inner)),
            data_type: DataType::Integer,
        });
        match rewrite(scalar)? {
            Expression::ScalarSubquery(s) => assert_eq!(s.command.to_string(), "SELECT 5 FROM t"),
            e => panic!("Expected a scalar subquery, got {}", e),
        }
        Ok(())
    }

    #[test]
    fn test_redundant_convert() -> Result<(), Box<dyn std::error::Error>> {
        let column = Expression::element(Some("t"), "s", DataType::String);
        let conv = Expression::convert(column.clone(), DataType::String);
        assert_eq!(rewrite(conv)?, column);
        Ok(())
    }

    #[test]
    fn test_null_short_circuit() -> Result<(), Box<dyn std::error::Error>> {
        let column = Expression::element(Some("t"), "s", DataType::String);
        let concat = Expression::function(
            "||",
            vec![column.clone(), Expression::null(DataType::String)],
            DataType::String,
        );
        assert_eq!(rewrite(concat)?, Expression::null(DataType::String));

        let ifnull = Expression::function(
            "nvl",
            vec![Expression::null(DataType::String), column.clone()],
            DataType::String,
        );
        assert_eq!(rewrite(ifnull)?.to_string(), "IFNULL(null, t.s)");

        // unknown functions might handle nulls themselves
        let udf = Expression::function(
            "MY_UDF",
            vec![Expression::null(DataType::String)],
            DataType::String,
        );
        assert!(rewrite(udf)?.as_function().is_some());
        Ok(())
    }

    #[test]
    fn test_case_folding() -> Result<(), Box<dyn std::error::Error>> {
        let case = Expression::SearchedCase(SearchedCaseExpression {
            whens: vec![
                Criteria::compare(int(1), CompareOperator::Eq, int(1)),
                Criteria::compare(int(1), CompareOperator::Eq, int(2)),
            ],
            thens: vec![string("a"), string("b")],
            else_expression: None,
            data_type: DataType::String,
        });
        assert_eq!(rewrite(case)?, string("a"));

        let column = Expression::element(Some("t"), "a", DataType::Integer);
        let same = Expression::SearchedCase(SearchedCaseExpression {
            whens: vec![Criteria::compare(column.clone(), CompareOperator::Gt, int(1))],
            thens: vec![string("x")],
            else_expression: Some(Box::new(string("x"))),
            data_type: DataType::String,
        });
        assert_eq!(rewrite(same)?, string("x"));

        let partial = Expression::SearchedCase(SearchedCaseExpression {
            whens: vec![
                Criteria::compare(column.clone(), CompareOperator::Gt, int(1)),
                Criteria::compare(int(2), CompareOperator::Eq, int(2)),
                Criteria::compare(column.clone(), CompareOperator::Lt, int(0)),
            ],
            thens: vec![string("x"), string("y"), string("z")],
            else_expression: None,
            data_type: DataType::String,
        });
        assert_eq!(
            rewrite(partial)?.to_string(),
            "CASE WHEN t.a > 1 THEN 'x' ELSE 'y' END"
        );
        Ok(())
    }

    #[test]
    fn test_simple_case() -> Result<(), Box<dyn std::error::Error>> {
        let column = Expression::element(Some("t"), "a", DataType::Integer);
        let case = Expression::Case(CaseExpression {
            expression: Box::new(column),
            whens: vec![int(1), Expression::null(DataType::Integer)],
            thens: vec![string("one"), string("none")],
            else_expression: None,
            data_type: DataType::String,
        });
        assert_eq!(rewrite(case)?.to_string(), "CASE WHEN t.a = 1 THEN 'one' END");
        Ok(())
    }

    #[test]
    fn test_variables_bind() -> Result<(), Box<dyn std::error::Error>> {
        let metadata = BasicMetadata::new();
        let evaluator = ConstantEvaluator::new();
        let config = RewriterConfig::default();
        let rewriter = Rewriter::new(&metadata, &evaluator, &config);
        let mut ctx = ProcedureContext::new();
        ctx.bind("x", int(4));
        let expr = Expression::function(
            "*",
            vec![
                Expression::Variable(crate::engine::objects::Variable::new("x", DataType::Integer)),
                int(2),
            ],
            DataType::Integer,
        );
        assert_eq!(rewriter.rewrite_expression(expr, &ctx)?, int(8));
        Ok(())
    }
}

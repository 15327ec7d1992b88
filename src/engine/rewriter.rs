//! The rewriter takes a resolved command and algebraically normalizes it before planning.
//! Every declared type survives the rewrite, only shapes and values change.
use std::collections::HashMap;
use thiserror::Error;

use super::evaluator::{EvaluationError, Evaluator};
use super::metadata::{Metadata, TempMetadata};
use super::objects::types::{DataType, Value};
use super::objects::{Command, Constant, Criteria, Expression};
use crate::config::RewriterConfig;

mod command;
mod compare;
mod criteria;
mod evaluatable;
pub use evaluatable::is_fully_evaluable;
pub use evaluatable::is_fully_evaluable_criteria;
mod expression;
mod functions;
mod has_translate;
mod inline_view;
mod order_by;
mod procedure;

pub struct Rewriter<'a> {
    metadata: TempMetadata<'a>,
    evaluator: &'a dyn Evaluator,
    config: &'a RewriterConfig,
}

/// Variable bindings and user criteria visible to the procedure body being rewritten.
#[derive(Clone, Debug, Default)]
pub struct ProcedureContext {
    variables: HashMap<String, Expression>,
    user_criteria: Option<Criteria>,
}

impl ProcedureContext {
    pub fn new() -> ProcedureContext {
        ProcedureContext::default()
    }

    pub fn with_user_criteria(user_criteria: Option<Criteria>) -> ProcedureContext {
        ProcedureContext {
            variables: HashMap::new(),
            user_criteria,
        }
    }

    pub fn bind(&mut self, name: &str, value: Expression) {
        self.variables.insert(name.to_ascii_uppercase(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Expression> {
        self.variables.get(&name.to_ascii_uppercase())
    }

    pub fn user_criteria(&self) -> Option<&Criteria> {
        self.user_criteria.as_ref()
    }
}

impl<'a> Rewriter<'a> {
    pub fn new(
        metadata: &'a dyn Metadata,
        evaluator: &'a dyn Evaluator,
        config: &'a RewriterConfig,
    ) -> Rewriter<'a> {
        Rewriter {
            metadata: TempMetadata::new(metadata),
            evaluator,
            config,
        }
    }

    pub fn rewrite(&self, command: Command) -> Result<Command, RewriterError> {
        self.rewrite_command(command, &ProcedureContext::new())
    }

    /// Gives a replacement expression the declared type of the node it replaces.
    fn retype(&self, expression: Expression, data_type: DataType) -> Expression {
        if expression.data_type() == data_type || data_type == DataType::Null {
            return expression;
        }
        match expression {
            Expression::Constant(c) => match c.value.convert(data_type) {
                Ok(value) => Expression::Constant(Constant::typed(value, data_type)),
                Err(_) => Expression::convert(Expression::Constant(c), data_type),
            },
            e => Expression::convert(e, data_type),
        }
    }

    /// False only when the expression provably never yields null.
    fn may_be_null(&self, expression: &Expression) -> bool {
        match expression.unaliased() {
            Expression::Constant(c) => c.is_null(),
            Expression::Element(e) => match &e.group {
                Some(group) => self.metadata.nullability(group, &e.name).may_be_null(),
                None => true,
            },
            _ => true,
        }
    }

    /// Folds a fully evaluable expression into a constant of its declared type.
    fn fold(&self, expression: &Expression) -> Result<Expression, EvaluationError> {
        let data_type = expression.data_type();
        let value = self.evaluator.evaluate(expression)?;
        trace!("Folded {} to {}", expression, value);
        let value = match value {
            Value::Null => Value::Null,
            v if v.data_type() == data_type => v,
            v => v.convert(data_type)?,
        };
        Ok(Expression::Constant(Constant::typed(value, data_type)))
    }
}

#[derive(Debug, Error)]
pub enum RewriterError {
    #[error("Infinite loop detected, WHILE ({0}) is always true")]
    InfiniteLoop(String),
    #[error("Procedure {0} parameter {1} is not nullable but was passed null")]
    NullParameter(String, String),
    #[error("Unable to evaluate {function}({types}): {source}")]
    FunctionEvaluation {
        function: String,
        types: String,
        source: EvaluationError,
    },
    #[error("Unable to evaluate {function} converting {from} to {to}: {source}")]
    Conversion {
        function: String,
        from: DataType,
        to: DataType,
        source: EvaluationError,
    },
    #[error("No conversion exists from {0} to {1} for {2}")]
    UnsupportedConversion(DataType, DataType, String),
    #[error("Invalid decode argument {0}")]
    InvalidDecode(String),
    #[error("Unable to evaluate {0}: {1}")]
    Evaluation(String, EvaluationError),
    #[error("Unable to evaluate criteria {0}: {1}")]
    CriteriaEvaluation(String, EvaluationError),
}

#[cfg(test)]
mod tests {
    use super::super::evaluator::ConstantEvaluator;
    use super::super::metadata::BasicMetadata;
    use super::*;

    #[test]
    fn test_context_lookup() {
        let mut ctx = ProcedureContext::new();
        ctx.bind("proc.x", Expression::constant(Value::Integer(1)));
        assert!(ctx.lookup("PROC.X").is_some());
        assert!(ctx.lookup("y").is_none());
        assert!(ctx.user_criteria().is_none());
    }

    #[test]
    fn test_retype() {
        let metadata = BasicMetadata::new();
        let evaluator = ConstantEvaluator::new();
        let config = RewriterConfig::default();
        let rewriter = Rewriter::new(&metadata, &evaluator, &config);

        let retyped = rewriter.retype(Expression::constant(Value::Integer(1)), DataType::Long);
        assert_eq!(retyped, Expression::typed_constant(Value::Long(1), DataType::Long));

        let column = Expression::element(Some("t"), "a", DataType::Integer);
        assert_eq!(
            rewriter.retype(column, DataType::String).to_string(),
            "CONVERT(t.a, string)"
        );
    }
}

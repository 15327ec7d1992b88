//! Stored procedure calls and virtual procedure bodies. Each statement rewrites to zero or
//! more statements, so dead branches disappear from the enclosing block.
use super::{ProcedureContext, Rewriter, RewriterError};
use crate::constants::Nullable;
use crate::engine::metadata::Metadata;
use crate::engine::objects::types::{DataType, Value};
use crate::engine::objects::{
    AssignmentStatement, AssignmentValue, Block, Command, Criteria, DeclareStatement, Expression,
    IfStatement, LoopStatement, Statement, StoredProcedure, WhileStatement,
};

impl<'a> Rewriter<'a> {
    pub(super) fn rewrite_procedure(
        &self,
        mut procedure: StoredProcedure,
        ctx: &ProcedureContext,
    ) -> Result<Command, RewriterError> {
        for param in procedure.params.iter_mut() {
            if !param.direction.is_input() {
                continue;
            }
            if let Some(e) = param.expression.take() {
                let rewritten = self.rewrite_expression(e, ctx)?;
                param.expression = Some(self.retype(rewritten, param.data_type));
            }
        }
        procedure.params.sort_by_key(|p| p.index);
        procedure.display_named = false;

        let body = match procedure.body.take() {
            Some(b) => b,
            None => return Ok(Command::StoredProcedure(procedure)),
        };

        let mut inner = ProcedureContext::with_user_criteria(procedure.user_criteria.clone());
        let mut bound: Vec<&str> = vec![];
        for param in procedure.params.iter().filter(|p| p.direction.is_input()) {
            let value = match &param.expression {
                Some(e) if e.is_constant() => e,
                _ => continue,
            };
            let qualified = format!("{}.{}", procedure.name, param.name);
            if body.assigns(&param.name) || body.assigns(&qualified) {
                continue;
            }
            inner.bind(&param.name, value.clone());
            inner.bind(&qualified, value.clone());
            bound.push(&param.name);
        }

        let body = self.rewrite_block(body, &inner)?;
        if let Some(command) = self.unwrap_procedure(&procedure, &body, &bound)? {
            return Ok(command);
        }
        procedure.body = Some(body);
        Ok(Command::StoredProcedure(procedure))
    }

    /// The one command a procedure forwards to, when the call can be replaced by it.
    fn unwrap_procedure(
        &self,
        procedure: &StoredProcedure,
        body: &Block,
        bound: &[&str],
    ) -> Result<Option<Command>, RewriterError> {
        if !self.config.unwrap_procedures || procedure.relational {
            return Ok(None);
        }
        let command = match body.statements.as_slice() {
            [Statement::Command(c)] if !matches!(**c, Command::Dynamic(_)) => c,
            _ => return Ok(None),
        };

        let inputs: Vec<_> = procedure
            .params
            .iter()
            .filter(|p| p.direction.is_input())
            .collect();
        for param in &inputs {
            let is_null = param
                .expression
                .as_ref()
                .map(|e| e.is_null_constant())
                .unwrap_or(false);
            if is_null && self.metadata.nullability(&procedure.name, &param.name) == Nullable::NotNull
            {
                return Err(RewriterError::NullParameter(
                    procedure.name.clone(),
                    param.name.clone(),
                ));
            }
        }
        if !inputs.iter().all(|p| bound.contains(&p.name.as_str())) {
            debug!("Keeping the call to {}, not every input is a bound constant", procedure.name);
            return Ok(None);
        }

        let mut command = (**command).clone();
        if let Some(options) = command.options_mut() {
            options.merge(&procedure.options);
        }
        debug!("Unwrapped procedure {} into {}", procedure.name, command);
        Ok(Some(command))
    }

    fn rewrite_block(&self, block: Block, ctx: &ProcedureContext) -> Result<Block, RewriterError> {
        let mut statements = vec![];
        for statement in block.statements {
            statements.extend(self.rewrite_statement(statement, ctx)?);
        }
        Ok(Block::new(statements))
    }

    fn rewrite_statement(
        &self,
        statement: Statement,
        ctx: &ProcedureContext,
    ) -> Result<Vec<Statement>, RewriterError> {
        match statement {
            Statement::If(i) => self.rewrite_if(i, ctx),
            Statement::While(w) => {
                let original = w.condition.to_string();
                match self.rewrite_criteria(w.condition, ctx, false)? {
                    Criteria::True => Err(RewriterError::InfiniteLoop(original)),
                    Criteria::False | Criteria::Unknown => {
                        debug!("Removing WHILE ({}), it never runs", original);
                        Ok(vec![])
                    }
                    condition => {
                        let block = self.rewrite_block(w.block, ctx)?;
                        if block.is_empty() {
                            debug!("Removing WHILE ({}), its body is empty", condition);
                            return Ok(vec![]);
                        }
                        Ok(vec![Statement::While(WhileStatement { condition, block })])
                    }
                }
            }
            Statement::Loop(l) => {
                let command = self.rewrite_command(*l.command, ctx)?;
                let block = self.rewrite_block(l.block, ctx)?;
                if block.is_empty() {
                    debug!("Removing LOOP ON {}, its body is empty", l.cursor);
                    return Ok(vec![]);
                }
                Ok(vec![Statement::Loop(LoopStatement {
                    command: Box::new(command),
                    cursor: l.cursor,
                    block,
                })])
            }
            Statement::Assignment(a) => {
                let value = self.rewrite_assignment_value(a.value, a.variable.data_type, ctx)?;
                Ok(vec![Statement::Assignment(AssignmentStatement {
                    variable: a.variable,
                    value,
                })])
            }
            Statement::Declare(d) => {
                let value = match d.value {
                    Some(v) => Some(self.rewrite_assignment_value(v, d.variable.data_type, ctx)?),
                    None => None,
                };
                Ok(vec![Statement::Declare(DeclareStatement {
                    variable: d.variable,
                    value,
                })])
            }
            Statement::Command(c) => match self.rewrite_command(*c, ctx)? {
                Command::Update(u) if u.changes.is_empty() => {
                    debug!("Removing UPDATE {} with nothing to set", u.group);
                    Ok(vec![])
                }
                c => Ok(vec![Statement::Command(Box::new(c))]),
            },
            Statement::Error(e) => Ok(vec![Statement::Error(self.rewrite_expression(e, ctx)?)]),
            Statement::Break | Statement::Continue => Ok(vec![statement]),
        }
    }

    fn rewrite_if(
        &self,
        statement: IfStatement,
        ctx: &ProcedureContext,
    ) -> Result<Vec<Statement>, RewriterError> {
        match self.rewrite_criteria(statement.condition, ctx, false)? {
            Criteria::True => {
                debug!("IF is always true, keeping its block");
                Ok(self.rewrite_block(statement.if_block, ctx)?.statements)
            }
            Criteria::False | Criteria::Unknown => {
                debug!("IF is never true, keeping its ELSE");
                match statement.else_block {
                    Some(b) => Ok(self.rewrite_block(b, ctx)?.statements),
                    None => Ok(vec![]),
                }
            }
            condition => {
                let if_block = self.rewrite_block(statement.if_block, ctx)?;
                let else_block = match statement.else_block {
                    Some(b) => Some(self.rewrite_block(b, ctx)?).filter(|b| !b.is_empty()),
                    None => None,
                };
                Ok(vec![Statement::If(IfStatement {
                    condition,
                    if_block,
                    else_block,
                })])
            }
        }
    }

    /// An UPDATE that sets nothing changes no rows.
    fn rewrite_assignment_value(
        &self,
        value: AssignmentValue,
        data_type: DataType,
        ctx: &ProcedureContext,
    ) -> Result<AssignmentValue, RewriterError> {
        match value {
            AssignmentValue::Expression(e) => {
                Ok(AssignmentValue::Expression(self.rewrite_expression(e, ctx)?))
            }
            AssignmentValue::Command(c) => match self.rewrite_command(*c, ctx)? {
                Command::Update(u) if u.changes.is_empty() => {
                    debug!("UPDATE {} sets nothing, its count is 0", u.group);
                    Ok(AssignmentValue::Expression(self.retype(
                        Expression::constant(Value::Integer(0)),
                        data_type,
                    )))
                }
                c => Ok(AssignmentValue::Command(Box::new(c))),
            },
        }
    }
}

//! Virtual procedure bodies.
use std::fmt::{self, Display, Formatter};

use super::{Command, Criteria, Expression, Variable};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Block {
        Block { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssignmentValue {
    Expression(Expression),
    Command(Box<Command>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStatement {
    pub condition: Criteria,
    pub if_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStatement {
    pub condition: Criteria,
    pub block: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopStatement {
    pub command: Box<Command>,
    pub cursor: String,
    pub block: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentStatement {
    pub variable: Variable,
    pub value: AssignmentValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclareStatement {
    pub variable: Variable,
    pub value: Option<AssignmentValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    If(IfStatement),
    While(WhileStatement),
    Loop(LoopStatement),
    Assignment(AssignmentStatement),
    Declare(DeclareStatement),
    Command(Box<Command>),
    Error(Expression),
    Break,
    Continue,
}

impl Statement {
    /// Whether this statement or anything nested in it assigns the named variable.
    pub fn assigns(&self, name: &str) -> bool {
        match self {
            Statement::Assignment(a) => a.variable.name.eq_ignore_ascii_case(name),
            Statement::Declare(d) => d.variable.name.eq_ignore_ascii_case(name),
            Statement::If(i) => {
                i.if_block.assigns(name)
                    || i.else_block.as_ref().map(|b| b.assigns(name)).unwrap_or(false)
            }
            Statement::While(w) => w.block.assigns(name),
            Statement::Loop(l) => l.block.assigns(name),
            _ => false,
        }
    }
}

impl Block {
    pub fn assigns(&self, name: &str) -> bool {
        self.statements.iter().any(|s| s.assigns(name))
    }
}

impl Display for AssignmentValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentValue::Expression(e) => write!(f, "{}", e),
            AssignmentValue::Command(c) => write!(f, "({})", c),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN")?;
        for s in &self.statements {
            write!(f, " {}", s)?;
        }
        write!(f, " END")
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::If(i) => {
                write!(f, "IF({}) {}", i.condition, i.if_block)?;
                if let Some(e) = &i.else_block {
                    write!(f, " ELSE {}", e)?;
                }
                Ok(())
            }
            Statement::While(w) => write!(f, "WHILE({}) {}", w.condition, w.block),
            Statement::Loop(l) => write!(f, "LOOP ON ({}) AS {} {}", l.command, l.cursor, l.block),
            Statement::Assignment(a) => write!(f, "{} = {};", a.variable.name, a.value),
            Statement::Declare(d) => {
                write!(f, "DECLARE {} {}", d.variable.data_type, d.variable.name)?;
                if let Some(v) = &d.value {
                    write!(f, " = {}", v)?;
                }
                write!(f, ";")
            }
            Statement::Command(c) => write!(f, "{};", c),
            Statement::Error(e) => write!(f, "ERROR {};", e),
            Statement::Break => write!(f, "BREAK;"),
            Statement::Continue => write!(f, "CONTINUE;"),
        }
    }
}

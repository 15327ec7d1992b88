//! Scalar expressions of a resolved command. Every node carries its declared type.
use std::fmt::{self, Display, Formatter};

use super::types::{DataType, Value};
use super::{Command, Criteria};

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Constant(Constant),
    Element(ElementSymbol),
    Variable(Variable),
    Reference(Reference),
    Function(Function),
    Case(CaseExpression),
    SearchedCase(SearchedCaseExpression),
    Aggregate(AggregateSymbol),
    ScalarSubquery(ScalarSubquery),
    Alias(AliasSymbol),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub value: Value,
    pub data_type: DataType,
}

impl Constant {
    pub fn new(value: Value) -> Constant {
        let data_type = value.data_type();
        Constant { value, data_type }
    }

    pub fn typed(value: Value, data_type: DataType) -> Constant {
        Constant { value, data_type }
    }

    pub fn null(data_type: DataType) -> Constant {
        Constant {
            value: Value::Null,
            data_type,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// A column of a group (table, view or inline view).
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSymbol {
    pub group: Option<String>,
    pub name: String,
    pub data_type: DataType,
}

impl ElementSymbol {
    pub fn new(group: Option<&str>, name: &str, data_type: DataType) -> ElementSymbol {
        ElementSymbol {
            group: group.map(str::to_string),
            name: name.to_string(),
            data_type,
        }
    }

    /// Case insensitive match, the groups only have to agree when both sides name one.
    pub fn matches(&self, other: &ElementSymbol) -> bool {
        if !self.name.eq_ignore_ascii_case(&other.name) {
            return false;
        }
        match (&self.group, &other.group) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (_, _) => true,
        }
    }
}

/// A procedural variable or procedure parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
}

impl Variable {
    pub fn new(name: &str, data_type: DataType) -> Variable {
        Variable {
            name: name.to_string(),
            data_type,
        }
    }
}

/// A positional bind parameter, never known at rewrite time.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub index: usize,
    pub data_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
    pub data_type: DataType,
}

impl Function {
    pub fn new(name: &str, args: Vec<Expression>, data_type: DataType) -> Function {
        Function {
            name: name.to_string(),
            args,
            data_type,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseExpression {
    pub expression: Box<Expression>,
    pub whens: Vec<Expression>,
    pub thens: Vec<Expression>,
    pub else_expression: Option<Box<Expression>>,
    pub data_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchedCaseExpression {
    pub whens: Vec<Criteria>,
    pub thens: Vec<Expression>,
    pub else_expression: Option<Box<Expression>>,
    pub data_type: DataType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    StdDev,
    Every,
    Any,
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Avg => "AVG",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
            AggregateKind::StdDev => "STDDEV",
            AggregateKind::Every => "EVERY",
            AggregateKind::Any => "ANY",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateSymbol {
    pub kind: AggregateKind,
    /// None only for COUNT(*)
    pub arg: Option<Box<Expression>>,
    pub distinct: bool,
    pub data_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarSubquery {
    pub command: Box<Command>,
    pub data_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AliasSymbol {
    pub name: String,
    pub expression: Box<Expression>,
}

impl Expression {
    pub fn constant(value: Value) -> Expression {
        Expression::Constant(Constant::new(value))
    }

    pub fn typed_constant(value: Value, data_type: DataType) -> Expression {
        Expression::Constant(Constant::typed(value, data_type))
    }

    pub fn null(data_type: DataType) -> Expression {
        Expression::Constant(Constant::null(data_type))
    }

    pub fn element(group: Option<&str>, name: &str, data_type: DataType) -> Expression {
        Expression::Element(ElementSymbol::new(group, name, data_type))
    }

    pub fn function(name: &str, args: Vec<Expression>, data_type: DataType) -> Expression {
        Expression::Function(Function::new(name, args, data_type))
    }

    pub fn alias(name: &str, expression: Expression) -> Expression {
        Expression::Alias(AliasSymbol {
            name: name.to_string(),
            expression: Box::new(expression),
        })
    }

    /// CONVERT(expression, target) typed as the target
    pub fn convert(expression: Expression, target: DataType) -> Expression {
        Expression::function(
            "CONVERT",
            vec![
                expression,
                Expression::constant(Value::String(target.name().to_string())),
            ],
            target,
        )
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Expression::Constant(c) => c.data_type,
            Expression::Element(e) => e.data_type,
            Expression::Variable(v) => v.data_type,
            Expression::Reference(r) => r.data_type,
            Expression::Function(f) => f.data_type,
            Expression::Case(c) => c.data_type,
            Expression::SearchedCase(c) => c.data_type,
            Expression::Aggregate(a) => a.data_type,
            Expression::ScalarSubquery(s) => s.data_type,
            Expression::Alias(a) => a.expression.data_type(),
        }
    }

    /// The name this expression projects under, if it has one of its own.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Expression::Element(e) => Some(e.name.as_str()),
            Expression::Variable(v) => Some(v.name.as_str()),
            Expression::Alias(a) => Some(a.name.as_str()),
            _ => None,
        }
    }

    pub fn unaliased(&self) -> &Expression {
        match self {
            Expression::Alias(a) => a.expression.unaliased(),
            e => e,
        }
    }

    pub fn into_unaliased(self) -> Expression {
        match self {
            Expression::Alias(a) => a.expression.into_unaliased(),
            e => e,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant(_))
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expression::Constant(c) if c.is_null())
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Expression::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Constant> for Expression {
    fn from(c: Constant) -> Self {
        Expression::Constant(c)
    }
}

impl From<ElementSymbol> for Expression {
    fn from(e: ElementSymbol) -> Self {
        Expression::Element(e)
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Null => write!(f, "null"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Date(_) => write!(f, "{{d'{}'}}", self.value),
            Value::Time(_) => write!(f, "{{t'{}'}}", self.value),
            Value::Timestamp(_) => write!(f, "{{ts'{}'}}", self.value),
            Value::Object(o) => write!(f, "'{}'", o),
            v => write!(f, "{}", v),
        }
    }
}

impl Display for ElementSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(g) => write!(f, "{}.{}", g, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let infix = matches!(self.name.as_str(), "+" | "-" | "*" | "/" | "||");
        if infix && self.args.len() == 2 {
            return write!(f, "({} {} {})", self.args[0], self.name, self.args[1]);
        }
        if (self.is_named("CONVERT") || self.is_named("CAST")) && self.args.len() == 2 {
            if let Expression::Constant(Constant {
                value: Value::String(target),
                ..
            }) = &self.args[1]
            {
                return write!(f, "{}({}, {})", self.name, self.args[0], target);
            }
        }
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args)?;
        write!(f, ")")
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Element(e) => write!(f, "{}", e),
            Expression::Variable(v) => write!(f, "{}", v.name),
            Expression::Reference(_) => write!(f, "?"),
            Expression::Function(func) => write!(f, "{}", func),
            Expression::Case(c) => {
                write!(f, "CASE {}", c.expression)?;
                for (w, t) in c.whens.iter().zip(c.thens.iter()) {
                    write!(f, " WHEN {} THEN {}", w, t)?;
                }
                if let Some(e) = &c.else_expression {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            Expression::SearchedCase(c) => {
                write!(f, "CASE")?;
                for (w, t) in c.whens.iter().zip(c.thens.iter()) {
                    write!(f, " WHEN {} THEN {}", w, t)?;
                }
                if let Some(e) = &c.else_expression {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            Expression::Aggregate(a) => {
                write!(f, "{}(", a.kind.name())?;
                if a.distinct {
                    write!(f, "DISTINCT ")?;
                }
                match &a.arg {
                    Some(arg) => write!(f, "{})", arg),
                    None => write!(f, "*)"),
                }
            }
            Expression::ScalarSubquery(s) => write!(f, "({})", s.command),
            Expression::Alias(a) => write!(f, "{} AS {}", a.expression, a.name),
        }
    }
}

pub(crate) fn display_list<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let expr = Expression::function(
            "+",
            vec![
                Expression::element(Some("t"), "a", DataType::Integer),
                Expression::constant(Value::Integer(1)),
            ],
            DataType::Integer,
        );
        assert_eq!(expr.to_string(), "(t.a + 1)");

        let conv = Expression::convert(
            Expression::constant(Value::String("it's".to_string())),
            DataType::Integer,
        );
        assert_eq!(conv.to_string(), "CONVERT('it''s', integer)");
    }

    #[test]
    fn test_element_matching() {
        let qualified = ElementSymbol::new(Some("g"), "E1", DataType::String);
        let bare = ElementSymbol::new(None, "e1", DataType::String);
        let other = ElementSymbol::new(Some("h"), "e1", DataType::String);
        assert!(qualified.matches(&bare));
        assert!(!qualified.matches(&other));
    }

    #[test]
    fn test_output_names() {
        let aliased = Expression::alias("x", Expression::constant(Value::Integer(1)));
        assert_eq!(aliased.output_name(), Some("x"));
        assert_eq!(aliased.data_type(), DataType::Integer);
        assert!(aliased.unaliased().is_constant());
    }
}

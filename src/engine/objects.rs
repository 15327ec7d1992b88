mod command;
pub use command::Command;
pub use command::CommandOptions;
pub use command::Delete;
pub use command::DynamicCommand;
pub use command::FromClause;
pub use command::GroupSymbol;
pub use command::Insert;
pub use command::InsertSource;
pub use command::JoinPredicate;
pub use command::JoinType;
pub use command::Limit;
pub use command::OrderBy;
pub use command::OrderByItem;
pub use command::ParameterDirection;
pub use command::ProcedureParameter;
pub use command::Query;
pub use command::Select;
pub use command::SetClause;
pub use command::SetOperation;
pub use command::SetQuery;
pub use command::StoredProcedure;
pub use command::SubqueryFromClause;
pub use command::Update;

mod criteria;
pub use criteria::BetweenCriteria;
pub use criteria::CompareCriteria;
pub use criteria::CompareOperator;
pub use criteria::CompoundCriteria;
pub use criteria::CompoundOperator;
pub use criteria::Criteria;
pub use criteria::CriteriaSelector;
pub use criteria::ExistsCriteria;
pub use criteria::IsNullCriteria;
pub use criteria::MatchCriteria;
pub use criteria::Quantifier;
pub use criteria::SelectorType;
pub use criteria::SetCriteria;
pub use criteria::SubqueryCompareCriteria;
pub use criteria::SubquerySetCriteria;
pub use criteria::TranslateCriteria;

mod expression;
pub use expression::AggregateKind;
pub use expression::AggregateSymbol;
pub use expression::AliasSymbol;
pub use expression::CaseExpression;
pub use expression::Constant;
pub use expression::ElementSymbol;
pub use expression::Expression;
pub use expression::Function;
pub use expression::Reference;
pub use expression::ScalarSubquery;
pub use expression::SearchedCaseExpression;
pub use expression::Variable;

mod statement;
pub use statement::AssignmentStatement;
pub use statement::AssignmentValue;
pub use statement::Block;
pub use statement::DeclareStatement;
pub use statement::IfStatement;
pub use statement::LoopStatement;
pub use statement::Statement;
pub use statement::WhileStatement;

pub mod types;

mod visitor;

mod attribute;
pub use attribute::Attribute;

mod table;
pub use table::Table;
pub use table::TableError;

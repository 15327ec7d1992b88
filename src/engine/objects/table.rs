//! Definition of a group as metadata knows it: a table, a view, an inline view or a procedure.
use thiserror::Error;

use super::{Attribute, ElementSymbol};

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Table {
    pub fn new(name: &str, attributes: Vec<Attribute>) -> Table {
        Table {
            name: name.to_string(),
            attributes,
        }
    }

    pub fn get_column_index(&self, name: &str) -> Result<usize, TableError> {
        self.attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TableError::ColumnDoesNotExist(name.to_string()))
    }

    pub fn get_column(&self, name: &str) -> Result<&Attribute, TableError> {
        let index = self.get_column_index(name)?;
        Ok(&self.attributes[index])
    }

    /// The columns as symbols qualified by `group`.
    pub fn elements(&self, group: &str) -> Vec<ElementSymbol> {
        self.attributes
            .iter()
            .map(|a| ElementSymbol::new(Some(group), &a.name, a.data_type))
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column named {0} does not exist")]
    ColumnDoesNotExist(String),
}

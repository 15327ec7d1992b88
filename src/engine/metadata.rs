//! Lookups the rewriter needs about groups and their elements. The resolver supplies
//! the real implementation, `BasicMetadata` is an in memory one.
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use super::objects::types::DataType;
use super::objects::{ElementSymbol, Table};
use crate::constants::Nullable;

pub trait Metadata {
    /// Definition of a group, None if it isn't known.
    fn group(&self, group: &str) -> Option<Arc<Table>>;

    fn element_type(&self, group: &str, element: &str) -> Option<DataType> {
        let table = self.group(group)?;
        let column = table.get_column(element).ok()?;
        Some(column.data_type)
    }

    fn nullability(&self, group: &str, element: &str) -> Nullable {
        match self.group(group) {
            Some(table) => match table.get_column(element) {
                Ok(column) => column.nullable,
                Err(_) => Nullable::Unknown,
            },
            None => Nullable::Unknown,
        }
    }

    fn group_elements(&self, group: &str) -> Vec<ElementSymbol> {
        match self.group(group) {
            Some(table) => table.elements(group),
            None => vec![],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BasicMetadata {
    groups: HashMap<String, Arc<Table>>,
}

impl BasicMetadata {
    pub fn new() -> BasicMetadata {
        BasicMetadata::default()
    }

    pub fn add_group(&mut self, table: Table) {
        self.groups
            .insert(table.name.to_ascii_uppercase(), Arc::new(table));
    }

    pub fn with_group(mut self, table: Table) -> BasicMetadata {
        self.add_group(table);
        self
    }
}

impl Metadata for BasicMetadata {
    fn group(&self, group: &str) -> Option<Arc<Table>> {
        self.groups.get(&group.to_ascii_uppercase()).cloned()
    }
}

/// Overlay for groups that only exist during one rewrite, such as synthesized inline views.
pub struct TempMetadata<'a> {
    base: &'a dyn Metadata,
    temp_groups: RefCell<HashMap<String, Arc<Table>>>,
}

impl<'a> TempMetadata<'a> {
    pub fn new(base: &'a dyn Metadata) -> TempMetadata<'a> {
        TempMetadata {
            base,
            temp_groups: RefCell::new(HashMap::new()),
        }
    }

    pub fn add_temp_group(&self, table: Table) {
        trace!("Registering temporary group {}", table.name);
        self.temp_groups
            .borrow_mut()
            .insert(table.name.to_ascii_uppercase(), Arc::new(table));
    }
}

impl<'a> Metadata for TempMetadata<'a> {
    fn group(&self, group: &str) -> Option<Arc<Table>> {
        let temp = self
            .temp_groups
            .borrow()
            .get(&group.to_ascii_uppercase())
            .cloned();
        temp.or_else(|| self.base.group(group))
    }
}

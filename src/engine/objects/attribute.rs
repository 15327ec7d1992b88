//! A column of a group, or a parameter of a procedure.
use crate::constants::Nullable;

use super::types::DataType;

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    pub nullable: Nullable,
}

impl Attribute {
    pub fn new(name: &str, data_type: DataType, nullable: Nullable) -> Attribute {
        Attribute {
            name: name.to_string(),
            data_type,
            nullable,
        }
    }
}

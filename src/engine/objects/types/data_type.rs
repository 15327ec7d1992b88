use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use super::ConversionError;

/// Runtime types of every expression in a resolved command.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataType {
    Null,
    Boolean,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
    String,
    Char,
    Date,
    Time,
    Timestamp,
    Object,
}

impl DataType {
    pub const VALUES: [DataType; 14] = [
        DataType::Null,
        DataType::Boolean,
        DataType::Short,
        DataType::Integer,
        DataType::Long,
        DataType::Float,
        DataType::Double,
        DataType::BigDecimal,
        DataType::String,
        DataType::Char,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
        DataType::Object,
    ];

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Short
                | DataType::Integer
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::BigDecimal
        )
    }

    /// Integer division and multiplication by a constant can't be undone exactly for these.
    pub fn is_integral(&self) -> bool {
        matches!(self, DataType::Short | DataType::Integer | DataType::Long)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }

    /// The numeric types where moving a constant across a comparison is allowed
    pub fn supports_arithmetic_inversion(&self) -> bool {
        matches!(
            self,
            DataType::Integer
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::BigDecimal
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Boolean => "boolean",
            DataType::Short => "short",
            DataType::Integer => "integer",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::BigDecimal => "bigdecimal",
            DataType::String => "string",
            DataType::Char => "char",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Object => "object",
        }
    }
}

impl FromStr for DataType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" => Ok(DataType::Null),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "short" | "smallint" => Ok(DataType::Short),
            "integer" | "int" => Ok(DataType::Integer),
            "long" | "bigint" => Ok(DataType::Long),
            "float" | "real" => Ok(DataType::Float),
            "double" => Ok(DataType::Double),
            "bigdecimal" | "decimal" => Ok(DataType::BigDecimal),
            "string" | "varchar" => Ok(DataType::String),
            "char" => Ok(DataType::Char),
            "date" => Ok(DataType::Date),
            "time" => Ok(DataType::Time),
            "timestamp" => Ok(DataType::Timestamp),
            "object" => Ok(DataType::Object),
            _ => Err(ConversionError::InvalidType(s.to_string())),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        for t in DataType::VALUES.iter() {
            assert_eq!(*t, t.name().parse::<DataType>()?);
        }
        assert_eq!("VARCHAR".parse::<DataType>()?, DataType::String);
        assert!("uuid".parse::<DataType>().is_err());
        Ok(())
    }

    #[test]
    fn test_inversion_types() {
        assert!(DataType::Integer.supports_arithmetic_inversion());
        assert!(DataType::BigDecimal.supports_arithmetic_inversion());
        assert!(!DataType::Short.supports_arithmetic_inversion());
        assert!(!DataType::String.supports_arithmetic_inversion());
    }
}

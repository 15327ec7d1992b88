mod conversion;
pub use conversion::ConversionError;

mod data_type;
pub use data_type::DataType;

pub mod parse_type;

mod value;
pub use value::Value;

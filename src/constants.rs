mod builtin_functions;
pub use builtin_functions::builtin_function;
pub use builtin_functions::function_alias;
pub use builtin_functions::null_dependent_functions;
pub use builtin_functions::FunctionFlags;

mod nullable;
pub use nullable::Nullable;

//! The system function library as the rewriter sees it. Only names and behavioural
//! flags live here, the resolver has already settled argument and return types.
use once_cell::sync::Lazy;
use std::collections::HashMap;

bitflags! {
    pub struct FunctionFlags: u8 {
        /// A null argument does not force a null result
        const NULL_DEPENDENT = 0b00000001;
        /// Must never be folded at rewrite time
        const NONDETERMINISTIC = 0b00000010;
        /// Desugared by the rewriter into other functions
        const MACRO = 0b00000100;
        /// Converts between types, failures name the source and target type
        const CONVERSION = 0b00001000;
    }
}

const FUNCTIONS: &[(&str, FunctionFlags)] = &[
    ("+", FunctionFlags::empty()),
    ("-", FunctionFlags::empty()),
    ("*", FunctionFlags::empty()),
    ("/", FunctionFlags::empty()),
    ("ABS", FunctionFlags::empty()),
    ("CHAR", FunctionFlags::empty()),
    ("CONCAT", FunctionFlags::empty()),
    ("LCASE", FunctionFlags::empty()),
    ("UCASE", FunctionFlags::empty()),
    ("LENGTH", FunctionFlags::empty()),
    ("REPEAT", FunctionFlags::empty()),
    ("LTRIM", FunctionFlags::empty()),
    ("RTRIM", FunctionFlags::empty()),
    ("TRIM", FunctionFlags::empty()),
    ("SUBSTRING", FunctionFlags::empty()),
    ("TIMESTAMPADD", FunctionFlags::empty()),
    ("TIMESTAMPCREATE", FunctionFlags::empty()),
    ("IFNULL", FunctionFlags::NULL_DEPENDENT),
    ("NVL", FunctionFlags::NULL_DEPENDENT),
    (
        "COALESCE",
        FunctionFlags::from_bits_truncate(
            FunctionFlags::NULL_DEPENDENT.bits() | FunctionFlags::MACRO.bits(),
        ),
    ),
    (
        "NULLIF",
        FunctionFlags::from_bits_truncate(
            FunctionFlags::NULL_DEPENDENT.bits() | FunctionFlags::MACRO.bits(),
        ),
    ),
    (
        "CONCAT2",
        FunctionFlags::from_bits_truncate(
            FunctionFlags::NULL_DEPENDENT.bits() | FunctionFlags::MACRO.bits(),
        ),
    ),
    (
        "DECODESTRING",
        FunctionFlags::from_bits_truncate(
            FunctionFlags::NULL_DEPENDENT.bits() | FunctionFlags::MACRO.bits(),
        ),
    ),
    (
        "DECODEINTEGER",
        FunctionFlags::from_bits_truncate(
            FunctionFlags::NULL_DEPENDENT.bits() | FunctionFlags::MACRO.bits(),
        ),
    ),
    ("SPACE", FunctionFlags::MACRO),
    ("FROM_UNIXTIME", FunctionFlags::MACRO),
    ("CONVERT", FunctionFlags::CONVERSION),
    ("CAST", FunctionFlags::CONVERSION),
    ("PARSEDATE", FunctionFlags::CONVERSION),
    ("PARSETIME", FunctionFlags::CONVERSION),
    ("PARSETIMESTAMP", FunctionFlags::CONVERSION),
    ("PARSEINTEGER", FunctionFlags::CONVERSION),
    ("PARSELONG", FunctionFlags::CONVERSION),
    ("PARSEFLOAT", FunctionFlags::CONVERSION),
    ("PARSEDOUBLE", FunctionFlags::CONVERSION),
    ("PARSEBIGDECIMAL", FunctionFlags::CONVERSION),
    ("FORMATDATE", FunctionFlags::CONVERSION),
    ("FORMATTIME", FunctionFlags::CONVERSION),
    ("FORMATTIMESTAMP", FunctionFlags::CONVERSION),
    ("FORMATINTEGER", FunctionFlags::CONVERSION),
    ("FORMATLONG", FunctionFlags::CONVERSION),
    ("FORMATFLOAT", FunctionFlags::CONVERSION),
    ("FORMATDOUBLE", FunctionFlags::CONVERSION),
    ("FORMATBIGDECIMAL", FunctionFlags::CONVERSION),
    ("NOW", FunctionFlags::NONDETERMINISTIC),
    ("CURDATE", FunctionFlags::NONDETERMINISTIC),
    ("CURTIME", FunctionFlags::NONDETERMINISTIC),
    ("RAND", FunctionFlags::NONDETERMINISTIC),
    ("UUID", FunctionFlags::NONDETERMINISTIC),
    ("USER", FunctionFlags::NONDETERMINISTIC),
];

const ALIASES: &[(&str, &str)] = &[
    ("LOWER", "LCASE"),
    ("UPPER", "UCASE"),
    ("CAST", "CONVERT"),
    ("NVL", "IFNULL"),
    ("||", "CONCAT"),
    ("CHR", "CHAR"),
];

static BUILTIN_FUNCTIONS: Lazy<HashMap<&'static str, FunctionFlags>> =
    Lazy::new(|| FUNCTIONS.iter().copied().collect());

static FUNCTION_ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ALIASES.iter().copied().collect());

/// Flags of a system function, None for functions the library doesn't know.
pub fn builtin_function(name: &str) -> Option<FunctionFlags> {
    BUILTIN_FUNCTIONS
        .get(name.to_ascii_uppercase().as_str())
        .copied()
}

/// The canonical name of a legacy function name.
pub fn function_alias(name: &str) -> Option<&'static str> {
    FUNCTION_ALIASES
        .get(name.to_ascii_uppercase().as_str())
        .copied()
}

/// Every library function flagged as null dependent.
pub fn null_dependent_functions() -> impl Iterator<Item = &'static str> {
    FUNCTIONS
        .iter()
        .filter(|(_, flags)| flags.contains(FunctionFlags::NULL_DEPENDENT))
        .map(|(name, _)| *name)
}

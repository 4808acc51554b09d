//! Value objects - immutable types that represent domain concepts

mod code_value;
mod snowflake;

pub use code_value::{CodeValue, CodeValueError};
pub use snowflake::{Snowflake, SnowflakeParseError};

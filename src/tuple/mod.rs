mod data_type;
mod record;
mod schema;
mod value;

pub use data_type::DataType;
pub use record::Record;
pub use schema::{Attribute, Schema, SchemaBuilder};
pub use value::Value;

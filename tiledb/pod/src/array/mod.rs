pub mod attribute;
pub mod dimension;
pub mod domain;
pub mod schema;

pub use attribute::AttributeData;
pub use dimension::DimensionData;
pub use domain::DomainData;
pub use schema::{FieldData, LookupKey, SchemaData};

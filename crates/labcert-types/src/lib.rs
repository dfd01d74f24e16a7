//! LabCert Types - standards, samples, and typed result values
//!
//! Read-only snapshots of what the laboratory data store holds. The store's
//! flat result map is decoded here, once, into [`FieldValue`]s keyed by
//! [`ResultKey`]; the engine never sees untyped values.

#![deny(unsafe_code)]

pub mod sample;
pub mod schema;
pub mod value;

pub use sample::{Sample, SampleStatus};
pub use schema::{FieldSchema, FieldScope, Standard, ValueType};
pub use value::{format_number, FieldValue, RawResults, ResultBag, ResultKey, QUANTITY_KEY};

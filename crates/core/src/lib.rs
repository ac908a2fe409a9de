pub mod document;
pub mod field;
pub mod item;
pub mod vat;

pub use document::DocumentKind;
pub use field::{FieldMap, FieldName, FieldValue};
pub use item::{items_total, LineItem};
pub use vat::VatRate;

pub mod field;
pub mod group;
pub mod options;
pub mod value;

pub use field::{BlurHook, ChangeHook, FieldKind, FieldSpec};
pub use group::{FieldGroup, FormDefinition};
pub use options::{OptionItem, OptionLoader, OptionSource};
pub use value::{FieldValue, Record};

mod builder;
mod condition;
mod error;
mod fact;
mod value;

pub use builder::RuleBuilder;
pub use condition::{Condition, Extractor};
pub use error::RuleError;
pub use fact::{Fact, Object, TypeDef, TypeDefBuilder};
pub use value::Value;

pub(crate) use fact::Getter;

mod evaluate;
mod resolve;
mod serial;
mod types;

pub use resolve::field_cache_entries;
pub use types::{
    Condition, Extractor, Fact, Object, RuleBuilder, RuleError, TypeDef, TypeDefBuilder, Value,
};

//! Evaluation subjects.
//!
//! A [`Fact`] is anything a condition can be evaluated against. Scalars
//! (numbers, strings, booleans, options) present themselves as a [`Value`];
//! host structs additionally expose a [`TypeDef`] describing their named
//! fields so `Condition::field` nodes can resolve fields at evaluation
//! time. The table is declared once per type and kept in a `static`:
//!
//! ```
//! use std::sync::LazyLock;
//! use tenet::{Fact, Object, TypeDef, TypeDefBuilder, Value};
//!
//! struct User {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Fact for User {
//!     fn scalar(&self) -> Option<Value> {
//!         None
//!     }
//!
//!     fn object(&self) -> Option<Object<'_>> {
//!         static DEF: LazyLock<TypeDef> = LazyLock::new(|| {
//!             TypeDefBuilder::new("User")
//!                 .field("name", |u: &User| &u.name)
//!                 .field("age", |u: &User| &u.age)
//!                 .build()
//!         });
//!         Some(Object::new(self, &DEF))
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use super::value::Value;

/// A value a condition evaluates against.
pub trait Fact {
    /// The scalar view of this subject. `Some(Value::Null)` marks a null
    /// scalar; `None` means the subject is a structured object with no
    /// scalar form.
    fn scalar(&self) -> Option<Value>;

    /// The reflection view for host types with named fields. Scalars keep
    /// the default.
    fn object(&self) -> Option<Object<'_>> {
        None
    }
}

impl Fact for i64 {
    fn scalar(&self) -> Option<Value> {
        Some(Value::Int(*self))
    }
}

impl Fact for f64 {
    fn scalar(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }
}

impl Fact for bool {
    fn scalar(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }
}

impl Fact for String {
    fn scalar(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }
}

impl Fact for &str {
    fn scalar(&self) -> Option<Value> {
        Some(Value::String((*self).to_owned()))
    }
}

impl Fact for Value {
    fn scalar(&self) -> Option<Value> {
        Some(self.clone())
    }
}

/// `None` is the null subject; `Some` delegates both views to the inner
/// fact, so a nullable object field keeps its field table when present.
impl<T: Fact> Fact for Option<T> {
    fn scalar(&self) -> Option<Value> {
        match self {
            Some(v) => v.scalar(),
            None => Some(Value::Null),
        }
    }

    fn object(&self) -> Option<Object<'_>> {
        self.as_ref().and_then(Fact::object)
    }
}

/// Borrowed reflection view of a host object: the erased instance paired
/// with its field table.
#[derive(Clone, Copy)]
pub struct Object<'a> {
    instance: &'a dyn Any,
    ty: &'static TypeDef,
}

impl<'a> Object<'a> {
    /// Pairs an instance with its type's field table. Meant to be called
    /// from a `Fact::object` impl with a table kept in a `static`.
    #[must_use]
    pub fn new(instance: &'a dyn Any, ty: &'static TypeDef) -> Self {
        Self { instance, ty }
    }

    /// The qualified name the table was registered under.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.ty.name
    }

    pub(crate) fn instance(&self) -> &'a dyn Any {
        self.instance
    }

    pub(crate) fn ty(&self) -> &'static TypeDef {
        self.ty
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.ty.name)
            .finish_non_exhaustive()
    }
}

/// Type-erased accessor: reads one field (or the base projection) off an
/// instance. `None` when the instance is not of the declaring type.
pub(crate) type Getter = Box<dyn Fn(&dyn Any) -> Option<&dyn Fact> + Send + Sync>;

pub(crate) struct FieldDef {
    name: &'static str,
    get: Getter,
}

impl FieldDef {
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn get(&self) -> &Getter {
        &self.get
    }
}

/// The declared field table of one host type: its qualified name, an
/// accessor per named field, and an optional projection to an embedded
/// base value whose own table continues the ancestor chain.
pub struct TypeDef {
    name: &'static str,
    fields: Vec<FieldDef>,
    base: Option<Getter>,
}

impl TypeDef {
    /// Starts a table for `T`. Equivalent to [`TypeDefBuilder::new`].
    #[must_use]
    pub fn builder<T: Any>(name: &'static str) -> TypeDefBuilder<T> {
        TypeDefBuilder::new(name)
    }

    /// The qualified name the table was registered under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|fd| fd.name == name)
    }

    pub(crate) fn base(&self) -> Option<&Getter> {
        self.base.as_ref()
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(FieldDef::name).collect::<Vec<_>>(),
            )
            .field("has_base", &self.base.is_some())
            .finish()
    }
}

/// Declares the named fields of a host type `T`.
///
/// Getters are plain function pointers from the instance to a borrowed
/// field implementing [`Fact`], so field reads never clone. A later
/// declaration for an already-declared name is shadowed by the first one.
pub struct TypeDefBuilder<T> {
    name: &'static str,
    fields: Vec<FieldDef>,
    base: Option<Getter>,
    _ty: PhantomData<fn(&T)>,
}

impl<T: Any> TypeDefBuilder<T> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            base: None,
            _ty: PhantomData,
        }
    }

    /// Declares a named field.
    #[must_use]
    pub fn field<F: Fact + 'static>(mut self, name: &'static str, get: fn(&T) -> &F) -> Self {
        self.fields.push(FieldDef {
            name,
            get: erase(get),
        });
        self
    }

    /// Declares the embedded base value searched after this type's own
    /// fields, most-derived first.
    #[must_use]
    pub fn base<B: Fact + 'static>(mut self, project: fn(&T) -> &B) -> Self {
        self.base = Some(erase(project));
        self
    }

    #[must_use]
    pub fn build(self) -> TypeDef {
        TypeDef {
            name: self.name,
            fields: self.fields,
            base: self.base,
        }
    }
}

fn erase<T: Any, F: Fact + 'static>(get: fn(&T) -> &F) -> Getter {
    Box::new(move |any: &dyn Any| any.downcast_ref::<T>().map(|t| get(t) as &dyn Fact))
}

//! Property path resolution over records
//!
//! A record exposes named properties through the [`Record`] capability. A
//! property is either a scalar [`Value`] or a nested record, so dot-delimited
//! paths such as `owner.address.city` can be resolved by chaining through the
//! intermediate records.
//!
//! Types usually implement [`Record`] by delegating to a static
//! [`AccessorTable`], a precompiled name → accessor map that can also chain to
//! the tables of embedded "ancestor" structs. Own entries shadow ancestor
//! entries, and nearer ancestors shadow farther ones.

use crate::error::AccessError;
use crate::types::Value;
use indexmap::IndexMap;

/// Result of looking up one property segment
pub enum Property<'a> {
    /// A scalar value
    Value(Value),
    /// A nested record, or `None` when the reference is null
    Nested(Option<&'a dyn Record>),
}

/// Capability for reading named properties off a record instance
pub trait Record {
    /// Name used in diagnostics
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Resolve one property segment by name
    fn property(&self, name: &str) -> Result<Property<'_>, AccessError>;
}

/// Reference to the member a column reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorRef {
    /// A declared field, read by its property name
    Field(String),
    /// A declared no-argument method, invoked by name
    Method(String),
    /// An explicit dot-delimited property path
    Path(String),
}

impl AccessorRef {
    /// Resolve this accessor against one record
    pub fn resolve(&self, record: &dyn Record) -> Result<Value, AccessError> {
        match self {
            AccessorRef::Field(name) | AccessorRef::Path(name) => resolve_path(record, name),
            AccessorRef::Method(name) => match record.property(name)? {
                Property::Value(value) => Ok(value),
                Property::Nested(None) => Ok(Value::Null),
                Property::Nested(Some(_)) => Err(AccessError::NotAValue {
                    segment: name.clone(),
                }),
            },
        }
    }

    /// Member name or path this accessor reads
    pub fn name(&self) -> &str {
        match self {
            AccessorRef::Field(n) | AccessorRef::Method(n) | AccessorRef::Path(n) => n,
        }
    }
}

/// Resolve a dot-delimited property path against a record
///
/// A null final segment yields [`Value::Null`]; a null intermediate segment is
/// an error, as is any missing member or failing accessor.
///
/// # Examples
///
/// ```
/// use record_export::accessor::{resolve_path, Property, Record};
/// use record_export::{AccessError, Value};
///
/// struct Owner;
/// struct Pet { owner: Option<Owner> }
///
/// impl Record for Owner {
///     fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
///         match name {
///             "name" => Ok(Property::Value(Value::from("Ada"))),
///             _ => Err(AccessError::MissingMember {
///                 member: name.to_string(),
///                 type_name: "Owner".to_string(),
///             }),
///         }
///     }
/// }
///
/// impl Record for Pet {
///     fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
///         match name {
///             "owner" => Ok(Property::Nested(self.owner.as_ref().map(|o| o as &dyn Record))),
///             _ => Err(AccessError::MissingMember {
///                 member: name.to_string(),
///                 type_name: "Pet".to_string(),
///             }),
///         }
///     }
/// }
///
/// let pet = Pet { owner: Some(Owner) };
/// assert_eq!(resolve_path(&pet, "owner.name").unwrap().to_string(), "Ada");
///
/// let stray = Pet { owner: None };
/// assert!(resolve_path(&stray, "owner.name").is_err());
/// ```
pub fn resolve_path(record: &dyn Record, path: &str) -> Result<Value, AccessError> {
    let mut current = record;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(AccessError::EmptySegment {
                path: path.to_string(),
            });
        }
        let is_last = segments.peek().is_none();

        match current.property(segment)? {
            Property::Value(value) if is_last => return Ok(value),
            Property::Value(Value::Null) | Property::Nested(None) if !is_last => {
                return Err(AccessError::NullIntermediate {
                    segment: segment.to_string(),
                    path: path.to_string(),
                })
            }
            Property::Value(_) => {
                return Err(AccessError::NotARecord {
                    segment: segment.to_string(),
                    path: path.to_string(),
                })
            }
            Property::Nested(None) => return Ok(Value::Null),
            Property::Nested(Some(_)) if is_last => {
                return Err(AccessError::NotAValue {
                    segment: segment.to_string(),
                })
            }
            Property::Nested(Some(next)) => current = next,
        }
    }

    // `split` always yields at least one segment
    Err(AccessError::EmptySegment {
        path: path.to_string(),
    })
}

type ValueGetter<T> = fn(&T) -> Value;
type TryValueGetter<T> = fn(&T) -> Result<Value, String>;
type NestedGetter<T> = fn(&T) -> Option<&dyn Record>;

enum Getter<T> {
    Value(ValueGetter<T>),
    TryValue(TryValueGetter<T>),
    Nested(NestedGetter<T>),
}

trait AncestorLookup<T>: Send + Sync {
    fn lookup<'a>(&self, instance: &'a T, name: &str)
        -> Option<Result<Property<'a>, AccessError>>;
}

struct Ancestor<T: 'static, P: 'static> {
    project: fn(&T) -> &P,
    table: &'static AccessorTable<P>,
}

impl<T: 'static, P: 'static> AncestorLookup<T> for Ancestor<T, P> {
    fn lookup<'a>(
        &self,
        instance: &'a T,
        name: &str,
    ) -> Option<Result<Property<'a>, AccessError>> {
        self.table.lookup((self.project)(instance), name)
    }
}

/// Precompiled name → accessor table for one record type
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use record_export::accessor::{AccessorTable, Property, Record};
/// use record_export::{AccessError, Value};
///
/// struct Entity { id: i64 }
/// struct User { base: Entity, name: String }
///
/// static ENTITY: LazyLock<AccessorTable<Entity>> = LazyLock::new(|| {
///     AccessorTable::<Entity>::new("Entity").value("id", |e| Value::from(e.id))
/// });
///
/// static USER: LazyLock<AccessorTable<User>> = LazyLock::new(|| {
///     AccessorTable::<User>::new("User")
///         .value("name", |u| Value::from(u.name.as_str()))
///         .with_ancestor(&*ENTITY, |u| &u.base)
/// });
///
/// impl Record for User {
///     fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
///         USER.resolve(self, name)
///     }
/// }
///
/// let user = User { base: Entity { id: 7 }, name: "Ada".into() };
/// assert_eq!(record_export::accessor::resolve_path(&user, "id").unwrap().to_string(), "7");
/// ```
pub struct AccessorTable<T: 'static> {
    type_name: &'static str,
    getters: IndexMap<&'static str, Getter<T>>,
    ancestors: Vec<Box<dyn AncestorLookup<T>>>,
}

impl<T: 'static> AccessorTable<T> {
    /// Create an empty table
    pub fn new(type_name: &'static str) -> Self {
        AccessorTable {
            type_name,
            getters: IndexMap::new(),
            ancestors: Vec::new(),
        }
    }

    /// Register an infallible scalar accessor
    pub fn value(mut self, name: &'static str, getter: ValueGetter<T>) -> Self {
        self.getters.insert(name, Getter::Value(getter));
        self
    }

    /// Register a scalar accessor that may fail
    pub fn try_value(mut self, name: &'static str, getter: TryValueGetter<T>) -> Self {
        self.getters.insert(name, Getter::TryValue(getter));
        self
    }

    /// Register an accessor returning a nested record
    pub fn nested(mut self, name: &'static str, getter: NestedGetter<T>) -> Self {
        self.getters.insert(name, Getter::Nested(getter));
        self
    }

    /// Chain to the table of an embedded ancestor
    ///
    /// Ancestors are searched in the order they are added, after the
    /// table's own entries.
    pub fn with_ancestor<P: 'static>(
        mut self,
        table: &'static AccessorTable<P>,
        project: fn(&T) -> &P,
    ) -> Self {
        self.ancestors.push(Box::new(Ancestor { project, table }));
        self
    }

    /// Type name given at construction
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Names registered directly on this table, in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.getters.keys().copied()
    }

    /// Look a property up, walking ancestors; `None` if no table defines it
    pub fn lookup<'a>(
        &self,
        instance: &'a T,
        name: &str,
    ) -> Option<Result<Property<'a>, AccessError>> {
        if let Some(getter) = self.getters.get(name) {
            return Some(match getter {
                Getter::Value(f) => Ok(Property::Value(f(instance))),
                Getter::TryValue(f) => {
                    f(instance)
                        .map(Property::Value)
                        .map_err(|message| AccessError::Invocation {
                            member: name.to_string(),
                            message,
                        })
                }
                Getter::Nested(f) => Ok(Property::Nested(f(instance))),
            });
        }

        self.ancestors
            .iter()
            .find_map(|ancestor| ancestor.lookup(instance, name))
    }

    /// Look a property up, reporting a missing member as an error
    pub fn resolve<'a>(&self, instance: &'a T, name: &str) -> Result<Property<'a>, AccessError> {
        self.lookup(instance, name)
            .unwrap_or_else(|| {
                Err(AccessError::MissingMember {
                    member: name.to_string(),
                    type_name: self.type_name.to_string(),
                })
            })
    }
}

//! Per-entity schema declarations and the process-wide registry.
//!
//! An [`EntityDescriptor`] whitelists what an entity exposes to untrusted
//! query parameters: directly filterable/sortable fields with their declared
//! types, named custom filter/sort predicates, and navigable relationships.
//! Descriptors are registered once at startup into a [`SchemaRegistry`] and
//! are read-only afterwards, so concurrent request handlers can share the
//! registry behind a plain `&` without locking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Declared type of a directly filterable/sortable field.
///
/// The declared type drives coercion of raw string filter values; a value
/// that cannot be coerced fails with [`Error::TypeCoercion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
	Boolean,
	Integer,
	Float,
	Text,
	Date,
	DateTime,
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			FieldType::Boolean => "boolean",
			FieldType::Integer => "integer",
			FieldType::Float => "float",
			FieldType::Text => "text",
			FieldType::Date => "date",
			FieldType::DateTime => "datetime",
		};
		f.write_str(name)
	}
}

/// A filter value coerced to its field's declared type, ready for an
/// equality clause on the storage query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
	Boolean(bool),
	Integer(i64),
	Float(f64),
	Text(String),
	Date(NaiveDate),
	DateTime(NaiveDateTime),
}

/// A named custom filter predicate: takes the current query and the raw
/// string argument, returns the transformed query.
///
/// The predicate owns interpretation of the argument, including coercion,
/// and may join related entities to filter across relationships. This is the
/// sanctioned escape hatch for cross-entity filters.
pub type FilterFn<Q> = Arc<dyn Fn(Q, &str) -> Result<Q> + Send + Sync>;

/// A named custom sort predicate: takes the current query and the descending
/// flag, returns the transformed query.
pub type SortFn<Q> = Arc<dyn Fn(Q, bool) -> Result<Q> + Send + Sync>;

/// Immutable declaration of what a single entity exposes for querying.
///
/// Built once with the chained `with_*` constructors and handed to
/// [`SchemaRegistry::register`]; never mutated afterwards.
///
/// # Examples
///
/// ```rust,ignore
/// let post = EntityDescriptor::new("post")
///     .with_primary_key("id")
///     .with_field("id", FieldType::Integer)
///     .with_field("title", FieldType::Text)
///     .with_relationship("messages", "message")
///     .with_filter("message_text", |q: Q, text: &str| {
///         Ok(q.join_messages_containing(text))
///     });
/// ```
pub struct EntityDescriptor<Q> {
	name: String,
	fields: BTreeMap<String, FieldType>,
	filter_fns: BTreeMap<String, FilterFn<Q>>,
	sort_fns: BTreeMap<String, SortFn<Q>>,
	relationships: BTreeMap<String, String>,
	primary_key: Option<String>,
}

impl<Q> EntityDescriptor<Q> {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: BTreeMap::new(),
			filter_fns: BTreeMap::new(),
			sort_fns: BTreeMap::new(),
			relationships: BTreeMap::new(),
			primary_key: None,
		}
	}

	/// Declare a field as eligible for direct equality filtering and sorting.
	pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
		self.fields.insert(name.into(), ty);
		self
	}

	/// Register a named custom filter predicate.
	///
	/// Custom predicates shadow a same-named field: predicate lookup takes
	/// priority during composition.
	pub fn with_filter<F>(mut self, name: impl Into<String>, f: F) -> Self
	where
		F: Fn(Q, &str) -> Result<Q> + Send + Sync + 'static,
	{
		self.filter_fns.insert(name.into(), Arc::new(f));
		self
	}

	/// Register a named custom sort predicate.
	pub fn with_sort<F>(mut self, name: impl Into<String>, f: F) -> Self
	where
		F: Fn(Q, bool) -> Result<Q> + Send + Sync + 'static,
	{
		self.sort_fns.insert(name.into(), Arc::new(f));
		self
	}

	/// Declare a relationship navigable for eager loading.
	///
	/// `target` is the name of the target entity as registered in the
	/// [`SchemaRegistry`]. Relationships are directional and may form cycles
	/// across entities; the include resolver only ever follows
	/// caller-supplied paths, so cyclic graphs are legal.
	pub fn with_relationship(
		mut self,
		name: impl Into<String>,
		target: impl Into<String>,
	) -> Self {
		self.relationships.insert(name.into(), target.into());
		self
	}

	/// Declare the primary key field used by by-id lookups.
	///
	/// The named field must also be declared via [`Self::with_field`]; a
	/// primary key naming an undeclared field is treated as absent.
	pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
		self.primary_key = Some(field.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared type of a direct field, if whitelisted.
	pub fn field_type(&self, field: &str) -> Option<FieldType> {
		self.fields.get(field).copied()
	}

	pub fn custom_filter(&self, name: &str) -> Option<&FilterFn<Q>> {
		self.filter_fns.get(name)
	}

	pub fn custom_sort(&self, name: &str) -> Option<&SortFn<Q>> {
		self.sort_fns.get(name)
	}

	/// Target entity name of a declared relationship.
	pub fn relationship_target(&self, name: &str) -> Option<&str> {
		self.relationships.get(name).map(String::as_str)
	}

	pub fn primary_key(&self) -> Option<&str> {
		self.primary_key.as_deref()
	}
}

impl<Q> fmt::Debug for EntityDescriptor<Q> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntityDescriptor")
			.field("name", &self.name)
			.field("fields", &self.fields)
			.field("filter_fns", &self.filter_fns.keys())
			.field("sort_fns", &self.sort_fns.keys())
			.field("relationships", &self.relationships)
			.field("primary_key", &self.primary_key)
			.finish()
	}
}

/// Process-wide map of entity name to [`EntityDescriptor`].
///
/// Registration is the only mutation point and is assumed to complete before
/// request traffic begins; all later access is read-only [`Self::lookup`].
pub struct SchemaRegistry<Q> {
	entities: HashMap<String, EntityDescriptor<Q>>,
}

impl<Q> fmt::Debug for SchemaRegistry<Q> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SchemaRegistry")
			.field("entities", &self.entities.keys())
			.finish()
	}
}

impl<Q> Default for SchemaRegistry<Q> {
	fn default() -> Self {
		Self::new()
	}
}

impl<Q> SchemaRegistry<Q> {
	pub fn new() -> Self {
		Self {
			entities: HashMap::new(),
		}
	}

	/// Register an entity descriptor under its name.
	///
	/// # Errors
	/// [`Error::DuplicateRegistration`] if the name is already taken.
	pub fn register(&mut self, descriptor: EntityDescriptor<Q>) -> Result<()> {
		let name = descriptor.name().to_string();
		if self.entities.contains_key(&name) {
			return Err(Error::DuplicateRegistration(name));
		}
		debug!(entity = %name, "registered entity");
		self.entities.insert(name, descriptor);
		Ok(())
	}

	/// Look up a registered entity by name.
	///
	/// # Errors
	/// [`Error::UnknownEntity`] if the name was never registered.
	pub fn lookup(&self, entity: &str) -> Result<&EntityDescriptor<Q>> {
		self.entities
			.get(entity)
			.ok_or_else(|| Error::UnknownEntity(entity.to_string()))
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}
}

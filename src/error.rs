use thiserror::Error;

use crate::schema::FieldType;

/// Errors surfaced while validating and composing a query.
///
/// Every variant except [`Error::Storage`] is a caller-input validation
/// failure detected synchronously, before any storage call. None of them are
/// retriable. Storage failures raised by a [`crate::paginate::QueryExecutor`]
/// are carried through [`Error::Storage`] untranslated.
#[derive(Debug, Error)]
pub enum Error {
	/// An entity with the same name was already registered.
	#[error("Entity '{0}' is already registered")]
	DuplicateRegistration(String),
	/// Lookup of an entity name absent from the registry.
	#[error("Unknown entity '{0}'")]
	UnknownEntity(String),
	/// A filter key resolves to neither a field nor a custom filter.
	#[error("Unknown filter field or predicate '{0}'")]
	UnknownFilterField(String),
	/// A sort token resolves to neither a field nor a custom sort.
	#[error("Unknown sort field or predicate '{0}'")]
	UnknownSortField(String),
	/// An include segment is not a relationship of the entity it is applied to.
	#[error("Unknown relationship '{0}'")]
	UnknownRelationship(String),
	/// An include path contains an empty segment.
	#[error("Malformed include path '{0}': empty segment")]
	MalformedInclude(String),
	/// A raw filter value cannot be coerced to the field's declared type.
	#[error("Invalid value '{value}' for {expected} field '{field}'")]
	TypeCoercion {
		field: String,
		value: String,
		expected: FieldType,
	},
	/// `page` or `size` is non-numeric or not positive.
	#[error("Invalid pagination parameter: {0}")]
	InvalidPagination(String),
	/// A by-id lookup was requested on an entity without a declared primary key.
	#[error("Entity '{0}' declares no primary key")]
	MissingPrimaryKey(String),
	/// A storage execution failure, propagated unchanged.
	#[error(transparent)]
	Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

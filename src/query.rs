//! The storage-query collaborator surface.
//!
//! The engine never talks to a database itself; it folds validated
//! directives onto an opaque query value supplied by the host. Any type with
//! value semantics that can accept equality clauses, ordering clauses and
//! eager-load edges can be driven by the composer.

use crate::schema::FieldValue;

/// A storage query with copy-on-apply value semantics.
///
/// Every method consumes the receiver and returns a new query; the engine
/// clones the shared base query once per request and never mutates it, so a
/// cached base query can be reused across concurrent requests.
///
/// Implementations are expected to combine successive `filter_*` clauses
/// conjunctively (logical AND) and to append `order_by` clauses after any
/// ordering already present, preserving call order.
pub trait Queryable: Clone {
	/// Add an equality clause on a direct field.
	fn filter_eq(self, field: &str, value: FieldValue) -> Self;

	/// Add a case-insensitive containment clause on a text field.
	///
	/// Only issued for [`crate::schema::FieldType::Text`] fields when
	/// [`crate::params::QueryConfig::text_contains`] is enabled.
	fn filter_contains(self, field: &str, value: &str) -> Self;

	/// Append an ordering clause on a direct field.
	fn order_by(self, field: &str, descending: bool) -> Self;

	/// Add one eager-load instruction for the relationship path rooted at
	/// the queried entity, e.g. `["posts", "area"]`.
	fn eager_load(self, path: &[String]) -> Self;
}

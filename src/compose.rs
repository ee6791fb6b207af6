//! Folding validated filter and sort directives onto a query value.
//!
//! Composition is fail-fast: the first directive that misses the whitelist
//! or refuses coercion aborts the whole request, and the partially composed
//! query is dropped. Lookup order is custom predicate first, then direct
//! field, for both filters and sorts.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::{FilterDirective, QueryConfig, SortDirective};
use crate::query::Queryable;
use crate::schema::{EntityDescriptor, FieldType, FieldValue};

/// Apply filter directives conjunctively, in input order.
///
/// Input order does not change the result set but is preserved for a
/// deterministic generated-query shape.
///
/// # Errors
/// [`Error::UnknownFilterField`] when a key matches neither a custom filter
/// predicate nor a declared field; [`Error::TypeCoercion`] when a direct
/// field value does not parse as the declared type; any error returned by a
/// custom predicate.
pub fn apply_filters<Q: Queryable>(
	query: Q,
	descriptor: &EntityDescriptor<Q>,
	filters: &[FilterDirective],
	config: &QueryConfig,
) -> Result<Q> {
	let mut q = query;
	for directive in filters {
		if let Some(predicate) = descriptor.custom_filter(&directive.key) {
			debug!(entity = descriptor.name(), key = %directive.key, "custom filter");
			q = predicate(q, &directive.value)?;
		} else if let Some(ty) = descriptor.field_type(&directive.key) {
			q = apply_field_filter(q, &directive.key, ty, &directive.value, config)?;
		} else {
			return Err(Error::UnknownFilterField(directive.key.clone()));
		}
	}
	Ok(q)
}

/// Apply sort directives in input order, each appended to the query's
/// ordering clause.
///
/// Without any directive the underlying store's natural order applies,
/// which is implementation-defined and not guaranteed.
///
/// # Errors
/// [`Error::UnknownSortField`] when a name matches neither a custom sort
/// predicate nor a declared field.
pub fn apply_sorts<Q: Queryable>(
	query: Q,
	descriptor: &EntityDescriptor<Q>,
	sorts: &[SortDirective],
) -> Result<Q> {
	let mut q = query;
	for directive in sorts {
		if let Some(predicate) = descriptor.custom_sort(&directive.name) {
			debug!(entity = descriptor.name(), name = %directive.name, "custom sort");
			q = predicate(q, directive.descending)?;
		} else if descriptor.field_type(&directive.name).is_some() {
			q = q.order_by(&directive.name, directive.descending);
		} else {
			return Err(Error::UnknownSortField(directive.name.clone()));
		}
	}
	Ok(q)
}

fn apply_field_filter<Q: Queryable>(
	query: Q,
	field: &str,
	ty: FieldType,
	value: &str,
	config: &QueryConfig,
) -> Result<Q> {
	if ty == FieldType::Text && config.text_contains {
		return Ok(query.filter_contains(field, value));
	}
	Ok(query.filter_eq(field, coerce(field, ty, value)?))
}

/// Coerce a raw string value to a field's declared type.
///
/// Booleans accept only `true`/`false` after trimming; dates are ISO 8601
/// calendar dates, datetimes accept `T` or space separated ISO 8601 without
/// offset.
pub fn coerce(field: &str, ty: FieldType, value: &str) -> Result<FieldValue> {
	let trimmed = value.trim();
	let coerced = match ty {
		FieldType::Boolean => match trimmed {
			"true" => Some(FieldValue::Boolean(true)),
			"false" => Some(FieldValue::Boolean(false)),
			_ => None,
		},
		FieldType::Integer => trimmed.parse::<i64>().ok().map(FieldValue::Integer),
		FieldType::Float => trimmed.parse::<f64>().ok().map(FieldValue::Float),
		FieldType::Text => Some(FieldValue::Text(value.to_string())),
		FieldType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
			.ok()
			.map(FieldValue::Date),
		FieldType::DateTime => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
			.or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
			.ok()
			.map(FieldValue::DateTime),
	};
	coerced.ok_or_else(|| Error::TypeCoercion {
		field: field.to_string(),
		value: value.to_string(),
		expected: ty,
	})
}

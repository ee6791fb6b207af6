//! Facade tying registry, parser, composer and include resolver together.

use tracing::debug;

use crate::compose;
use crate::error::{Error, Result};
use crate::include;
use crate::paginate::PageRequest;
use crate::params::{self, QueryConfig};
use crate::query::Queryable;
use crate::schema::SchemaRegistry;

/// A composed list query plus the pagination window it was asked for.
///
/// Pagination itself is left to [`crate::paginate`] so callers can choose
/// between executing through a [`crate::paginate::QueryExecutor`] and
/// wrapping a pre-materialized result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed<Q> {
	pub query: Q,
	pub page: PageRequest,
}

/// The per-process query engine: an immutable schema registry plus
/// configuration.
///
/// Built once at startup and shared by reference across request handlers;
/// every `compose*` call takes the base query by value and returns a new
/// one, leaving shared state untouched.
#[derive(Debug)]
pub struct QueryEngine<Q> {
	registry: SchemaRegistry<Q>,
	config: QueryConfig,
}

impl<Q: Queryable> QueryEngine<Q> {
	pub fn new(registry: SchemaRegistry<Q>) -> Self {
		Self {
			registry,
			config: QueryConfig::default(),
		}
	}

	pub fn with_config(mut self, config: QueryConfig) -> Self {
		self.config = config;
		self
	}

	pub fn registry(&self) -> &SchemaRegistry<Q> {
		&self.registry
	}

	pub fn config(&self) -> &QueryConfig {
		&self.config
	}

	/// Compose a list query for `entity` from raw query parameters.
	///
	/// Runs parse, include resolution, filters and sorts in that order and
	/// returns the new query together with the validated pagination window.
	/// The base query is consumed; clone it first if it is shared.
	pub fn compose(
		&self,
		base: Q,
		entity: &str,
		raw_params: &[(String, String)],
	) -> Result<Composed<Q>> {
		let descriptor = self.registry.lookup(entity)?;
		let parsed = params::parse(raw_params, &self.config)?;

		let tree = include::resolve(&self.registry, descriptor, &parsed.includes)?;
		let mut query = include::apply(base, &tree);
		query = compose::apply_filters(query, descriptor, &parsed.filters, &self.config)?;
		query = compose::apply_sorts(query, descriptor, &parsed.sorts)?;

		debug!(
			entity,
			filters = parsed.filters.len(),
			sorts = parsed.sorts.len(),
			includes = parsed.includes.len(),
			page = parsed.page.number,
			size = parsed.page.size,
			"composed list query"
		);
		Ok(Composed {
			query,
			page: parsed.page,
		})
	}

	/// Compose a detail query: the entity's primary key equals `id`, with
	/// any requested includes applied.
	///
	/// Only the `include` parameter is honored; detail lookups ignore
	/// filter, sort and pagination parameters.
	///
	/// # Errors
	/// [`Error::MissingPrimaryKey`] if the descriptor declares no primary
	/// key (or one naming an undeclared field); [`Error::TypeCoercion`] if
	/// `id` does not parse as the key's declared type.
	pub fn compose_by_id(
		&self,
		base: Q,
		entity: &str,
		id: &str,
		raw_params: &[(String, String)],
	) -> Result<Q> {
		let descriptor = self.registry.lookup(entity)?;
		let parsed = params::parse(raw_params, &self.config)?;

		let pk = descriptor
			.primary_key()
			.ok_or_else(|| Error::MissingPrimaryKey(entity.to_string()))?;
		let ty = descriptor
			.field_type(pk)
			.ok_or_else(|| Error::MissingPrimaryKey(entity.to_string()))?;

		let tree = include::resolve(&self.registry, descriptor, &parsed.includes)?;
		let query = include::apply(base, &tree);
		let value = compose::coerce(pk, ty, id)?;

		debug!(entity, id, "composed detail query");
		Ok(query.filter_eq(pk, value))
	}
}

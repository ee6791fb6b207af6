//! # solo-query
//!
//! Dynamic query composition, eager loading and pagination for REST-style
//! list and detail endpoints.
//!
//! The engine turns untrusted, string-encoded query parameters into typed
//! directives, validates them against a per-entity whitelist and folds them
//! onto an immutable base query value. It knows nothing about any concrete
//! store: the host supplies a query value implementing [`Queryable`] and an
//! executor implementing [`QueryExecutor`].
//!
//! ## Pipeline
//!
//! - **[`schema`]**: per-entity whitelists of fields, named custom
//!   filter/sort predicates and relationships, registered once at startup.
//! - **[`params`]**: pure syntax, turning raw parameters into ordered typed
//!   directives with no registry access.
//! - **[`compose`]**: directive validation and copy-on-apply folding onto
//!   the query.
//! - **[`include`]**: dotted relationship paths to a deduplicated
//!   eager-load tree, cycle-safe by construction.
//! - **[`paginate`]**: offset/limit windows, totals and the uniform page
//!   envelope.
//! - **[`engine`]**: the [`QueryEngine`] facade running the whole pipeline.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     EntityDescriptor::new("user")
//!         .with_primary_key("id")
//!         .with_field("id", FieldType::Integer)
//!         .with_field("name", FieldType::Text)
//!         .with_relationship("posts", "post"),
//! )?;
//! registry.register(
//!     EntityDescriptor::new("post").with_relationship("area", "area"),
//! )?;
//!
//! let engine = QueryEngine::new(registry);
//!
//! // ?name=John&sort=-name&include=posts.area&page=3&size=10
//! let composed = engine.compose(base_query.clone(), "user", &raw_params)?;
//! let page = paginate_query(&executor, composed.query, &composed.page).await?;
//! ```

pub mod compose;
pub mod engine;
pub mod error;
pub mod include;
pub mod paginate;
pub mod params;
pub mod query;
pub mod schema;

pub use engine::{Composed, QueryEngine};
pub use error::{Error, Result};
pub use include::{LoadNode, LoadTree};
pub use paginate::{
	Page, PageRequest, QueryExecutor, paginate_all, paginate_query, paginate_records,
};
pub use params::{FilterDirective, IncludePath, ParsedQuery, QueryConfig, SortDirective};
pub use query::Queryable;
pub use schema::{EntityDescriptor, FieldType, FieldValue, FilterFn, SchemaRegistry, SortFn};

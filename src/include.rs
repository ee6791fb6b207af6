//! Expansion of dotted include paths into a deduplicated eager-load tree.
//!
//! The resolver only ever walks the literal, caller-supplied paths, never
//! the schema graph itself: recursion is bounded by path length, so schemas
//! with self- or mutually-referencing relationships are legal and need no
//! cycle detection.

use crate::error::{Error, Result};
use crate::params::IncludePath;
use crate::query::Queryable;
use crate::schema::{EntityDescriptor, SchemaRegistry};

/// One relationship edge of the eager-load plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadNode {
	relation: String,
	entity: String,
	children: Vec<LoadNode>,
}

impl LoadNode {
	/// The relationship name this edge follows.
	pub fn relation(&self) -> &str {
		&self.relation
	}

	/// The target entity the edge lands on.
	pub fn entity(&self) -> &str {
		&self.entity
	}

	pub fn children(&self) -> &[LoadNode] {
		&self.children
	}
}

/// The deduplicated eager-load plan of one request.
///
/// Paths sharing a prefix share the corresponding nodes: there is at most
/// one node per relationship name at each depth reached via a given path.
/// Sibling and child order follows path declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadTree {
	roots: Vec<LoadNode>,
}

impl LoadTree {
	pub fn roots(&self) -> &[LoadNode] {
		&self.roots
	}

	pub fn is_empty(&self) -> bool {
		self.roots.is_empty()
	}
}

/// Expand include paths into a [`LoadTree`] rooted at `descriptor`.
///
/// Each segment is validated against the relationships of the entity
/// reached by the previous segment, and the target entity of every
/// traversed relationship must itself be registered.
///
/// # Errors
/// [`Error::UnknownRelationship`] for a segment the current entity does not
/// declare; [`Error::UnknownEntity`] for a relationship target missing from
/// the registry.
pub fn resolve<'a, Q>(
	registry: &'a SchemaRegistry<Q>,
	descriptor: &'a EntityDescriptor<Q>,
	includes: &[IncludePath],
) -> Result<LoadTree> {
	let mut roots: Vec<LoadNode> = Vec::new();
	for path in includes {
		let mut nodes = &mut roots;
		let mut current = descriptor;
		for segment in path.segments() {
			let target = current
				.relationship_target(segment)
				.ok_or_else(|| Error::UnknownRelationship(segment.clone()))?
				.to_string();
			current = registry.lookup(&target)?;

			let level = nodes;
			let index = match level.iter().position(|node| node.relation == *segment) {
				Some(index) => index,
				None => {
					level.push(LoadNode {
						relation: segment.clone(),
						entity: target,
						children: Vec::new(),
					});
					level.len() - 1
				}
			};
			nodes = &mut level[index].children;
		}
	}
	Ok(LoadTree { roots })
}

/// Issue one eager-load instruction per tree edge, depth-first in
/// declaration order, onto a new query.
pub fn apply<Q: Queryable>(query: Q, tree: &LoadTree) -> Q {
	let mut q = query;
	let mut prefix = Vec::new();
	for node in &tree.roots {
		q = apply_node(q, node, &mut prefix);
	}
	q
}

fn apply_node<Q: Queryable>(query: Q, node: &LoadNode, prefix: &mut Vec<String>) -> Q {
	prefix.push(node.relation.clone());
	let mut q = query.eager_load(prefix);
	for child in &node.children {
		q = apply_node(q, child, prefix);
	}
	prefix.pop();
	q
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::FieldValue;
	use rstest::rstest;

	#[derive(Debug, Clone, Default, PartialEq)]
	struct RecordingQuery {
		loads: Vec<String>,
	}

	impl Queryable for RecordingQuery {
		fn filter_eq(self, _field: &str, _value: FieldValue) -> Self {
			self
		}

		fn filter_contains(self, _field: &str, _value: &str) -> Self {
			self
		}

		fn order_by(self, _field: &str, _descending: bool) -> Self {
			self
		}

		fn eager_load(mut self, path: &[String]) -> Self {
			self.loads.push(path.join("."));
			self
		}
	}

	/// user -> {area, posts}; post -> {area}; area -> {users} closes a cycle.
	fn registry() -> SchemaRegistry<RecordingQuery> {
		let mut registry = SchemaRegistry::new();
		registry
			.register(
				EntityDescriptor::new("user")
					.with_relationship("area", "area")
					.with_relationship("posts", "post"),
			)
			.unwrap();
		registry
			.register(EntityDescriptor::new("post").with_relationship("area", "area"))
			.unwrap();
		registry
			.register(EntityDescriptor::new("area").with_relationship("users", "user"))
			.unwrap();
		registry
	}

	fn paths(raw: &[&str]) -> Vec<IncludePath> {
		raw.iter().map(|p| IncludePath::parse(p).unwrap()).collect()
	}

	#[rstest]
	fn test_overlapping_prefixes_share_one_node() {
		let registry = registry();
		let user = registry.lookup("user").unwrap();

		let tree = resolve(&registry, user, &paths(&["area", "posts.area"])).unwrap();

		assert_eq!(tree.roots().len(), 2);
		assert_eq!(tree.roots()[0].relation(), "area");
		assert!(tree.roots()[0].children().is_empty());
		assert_eq!(tree.roots()[1].relation(), "posts");
		assert_eq!(tree.roots()[1].entity(), "post");
		assert_eq!(tree.roots()[1].children().len(), 1);
		assert_eq!(tree.roots()[1].children()[0].relation(), "area");
	}

	#[rstest]
	fn test_duplicate_prefix_not_duplicated() {
		let registry = registry();
		let user = registry.lookup("user").unwrap();

		let tree = resolve(&registry, user, &paths(&["posts", "posts.area", "posts"])).unwrap();

		assert_eq!(tree.roots().len(), 1);
		assert_eq!(tree.roots()[0].children().len(), 1);
	}

	#[rstest]
	fn test_unknown_relationship_rejected() {
		let registry = registry();
		let user = registry.lookup("user").unwrap();

		let err = resolve(&registry, user, &paths(&["posts.comments"])).unwrap_err();
		assert!(matches!(err, Error::UnknownRelationship(name) if name == "comments"));
	}

	#[rstest]
	fn test_cyclic_schema_bounded_by_path_depth() {
		let registry = registry();
		let user = registry.lookup("user").unwrap();

		// user -> area -> users -> area walks the cycle literally; only the
		// declared depth is expanded.
		let tree = resolve(&registry, user, &paths(&["area.users.area"])).unwrap();

		let area = &tree.roots()[0];
		let users = &area.children()[0];
		let inner_area = &users.children()[0];
		assert_eq!(area.relation(), "area");
		assert_eq!(users.relation(), "users");
		assert_eq!(inner_area.relation(), "area");
		assert!(inner_area.children().is_empty());
	}

	#[rstest]
	fn test_apply_emits_one_instruction_per_edge_depth_first() {
		let registry = registry();
		let user = registry.lookup("user").unwrap();

		let tree = resolve(&registry, user, &paths(&["area", "posts.area"])).unwrap();
		let q = apply(RecordingQuery::default(), &tree);

		assert_eq!(q.loads, vec!["area", "posts", "posts.area"]);
	}

	#[rstest]
	fn test_empty_includes_leave_query_untouched() {
		let tree = LoadTree::default();
		assert!(tree.is_empty());
		let q = apply(RecordingQuery::default(), &tree);
		assert!(q.loads.is_empty());
	}
}

//! End-to-end scenarios: raw query parameters through the engine to a page
//! envelope, over an in-memory storage collaborator.

use async_trait::async_trait;
use rstest::rstest;
use solo_query::{
	EntityDescriptor, Error, FieldType, FieldValue, PageRequest, QueryEngine, QueryExecutor,
	Queryable, SchemaRegistry, paginate_query,
};

/// A storage-query value that records every clause applied to it.
#[derive(Debug, Clone, Default, PartialEq)]
struct TestQuery {
	filters: Vec<(String, FieldValue)>,
	contains: Vec<(String, String)>,
	orders: Vec<(String, bool)>,
	loads: Vec<String>,
	min_age: Option<i64>,
}

impl Queryable for TestQuery {
	fn filter_eq(mut self, field: &str, value: FieldValue) -> Self {
		self.filters.push((field.to_string(), value));
		self
	}

	fn filter_contains(mut self, field: &str, value: &str) -> Self {
		self.contains.push((field.to_string(), value.to_string()));
		self
	}

	fn order_by(mut self, field: &str, descending: bool) -> Self {
		self.orders.push((field.to_string(), descending));
		self
	}

	fn eager_load(mut self, path: &[String]) -> Self {
		self.loads.push(path.join("."));
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
struct UserRow {
	id: i64,
	name: &'static str,
	age: i64,
}

/// Interprets a [`TestQuery`] against an in-memory table.
struct TestExecutor {
	rows: Vec<UserRow>,
}

impl TestExecutor {
	fn matching(&self, query: &TestQuery) -> Vec<UserRow> {
		let mut rows: Vec<UserRow> = self
			.rows
			.iter()
			.filter(|row| {
				query.filters.iter().all(|(field, value)| row_matches(row, field, value))
					&& query.min_age.is_none_or(|min| row.age >= min)
			})
			.cloned()
			.collect();
		rows.sort_by(|a, b| {
			for (field, descending) in &query.orders {
				let ordering = match field.as_str() {
					"name" => a.name.cmp(b.name),
					"age" => a.age.cmp(&b.age),
					"id" => a.id.cmp(&b.id),
					_ => std::cmp::Ordering::Equal,
				};
				let ordering = if *descending { ordering.reverse() } else { ordering };
				if ordering.is_ne() {
					return ordering;
				}
			}
			std::cmp::Ordering::Equal
		});
		rows
	}
}

fn row_matches(row: &UserRow, field: &str, value: &FieldValue) -> bool {
	match (field, value) {
		("id", FieldValue::Integer(id)) => row.id == *id,
		("age", FieldValue::Integer(age)) => row.age == *age,
		("name", FieldValue::Text(name)) => row.name == name,
		_ => false,
	}
}

#[async_trait]
impl QueryExecutor for TestExecutor {
	type Query = TestQuery;
	type Row = UserRow;

	async fn count(&self, query: &TestQuery) -> anyhow::Result<u64> {
		Ok(self.matching(query).len() as u64)
	}

	async fn fetch(&self, query: &TestQuery, offset: u64, limit: u64) -> anyhow::Result<Vec<UserRow>> {
		Ok(self
			.matching(query)
			.into_iter()
			.skip(offset as usize)
			.take(limit as usize)
			.collect())
	}
}

/// user -> {area, posts}; post -> {area}; area -> {users} (cyclic on purpose).
fn engine() -> QueryEngine<TestQuery> {
	let mut registry = SchemaRegistry::new();
	registry
		.register(
			EntityDescriptor::new("user")
				.with_primary_key("id")
				.with_field("id", FieldType::Integer)
				.with_field("name", FieldType::Text)
				.with_field("age", FieldType::Integer)
				.with_relationship("area", "area")
				.with_relationship("posts", "post")
				.with_filter("min_age", |mut q: TestQuery, value: &str| {
					let min = value.parse::<i64>().map_err(|_| Error::TypeCoercion {
						field: "min_age".to_string(),
						value: value.to_string(),
						expected: FieldType::Integer,
					})?;
					q.min_age = Some(min);
					Ok(q)
				}),
		)
		.unwrap();
	registry
		.register(EntityDescriptor::new("post").with_relationship("area", "area"))
		.unwrap();
	registry
		.register(EntityDescriptor::new("area").with_relationship("users", "user"))
		.unwrap();
	QueryEngine::new(registry)
}

fn users() -> Vec<UserRow> {
	vec![
		UserRow { id: 1, name: "John", age: 42 },
		UserRow { id: 2, name: "Ada", age: 36 },
		UserRow { id: 3, name: "John", age: 30 },
		UserRow { id: 4, name: "Mara", age: 54 },
	]
}

fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect()
}

#[rstest]
fn test_filter_composes_single_equality_clause() {
	let composed = engine()
		.compose(TestQuery::default(), "user", &raw(&[("name", "John")]))
		.unwrap();

	assert_eq!(
		composed.query.filters,
		vec![("name".to_string(), FieldValue::Text("John".to_string()))]
	);
	assert!(composed.query.orders.is_empty());
	assert!(composed.query.loads.is_empty());
}

#[rstest]
fn test_include_paths_merge_into_one_tree() {
	let composed = engine()
		.compose(
			TestQuery::default(),
			"user",
			&raw(&[("include", "area,posts.area")]),
		)
		.unwrap();

	assert_eq!(composed.query.loads, vec!["area", "posts", "posts.area"]);
}

#[rstest]
fn test_base_query_is_never_mutated() {
	let base = TestQuery::default();
	let engine = engine();

	let a = engine
		.compose(base.clone(), "user", &raw(&[("name", "John")]))
		.unwrap();
	let b = engine
		.compose(base.clone(), "user", &raw(&[("age", "42")]))
		.unwrap();

	assert_eq!(base, TestQuery::default());
	assert_ne!(a.query, b.query);
}

#[rstest]
fn test_composition_is_deterministic_across_requests() {
	let engine = engine();
	let params = raw(&[("name", "John"), ("sort", "-name,age"), ("include", "posts.area")]);

	let a = engine.compose(TestQuery::default(), "user", &params).unwrap();
	let b = engine.compose(TestQuery::default(), "user", &params).unwrap();

	assert_eq!(a.query, b.query);
	assert_eq!(a.page, b.page);
}

#[rstest]
fn test_unknown_sort_fails_before_any_storage_call() {
	let err = engine()
		.compose(TestQuery::default(), "user", &raw(&[("sort", "unknownField")]))
		.unwrap_err();

	assert!(matches!(err, Error::UnknownSortField(name) if name == "unknownField"));
}

#[rstest]
fn test_unknown_filter_field_rejected() {
	let err = engine()
		.compose(TestQuery::default(), "user", &raw(&[("email", "x@y.z")]))
		.unwrap_err();

	assert!(matches!(err, Error::UnknownFilterField(key) if key == "email"));
}

#[rstest]
fn test_coercion_error_carries_field_and_value() {
	let err = engine()
		.compose(TestQuery::default(), "user", &raw(&[("age", "abc")]))
		.unwrap_err();

	match err {
		Error::TypeCoercion { field, value, expected } => {
			assert_eq!(field, "age");
			assert_eq!(value, "abc");
			assert_eq!(expected, FieldType::Integer);
		}
		other => panic!("expected TypeCoercion, got {other:?}"),
	}
}

#[rstest]
#[tokio::test]
async fn test_sort_precedence_name_desc_then_age_asc() {
	let composed = engine()
		.compose(TestQuery::default(), "user", &raw(&[("sort", "-name,age")]))
		.unwrap();
	let executor = TestExecutor { rows: users() };

	let page = paginate_query(&executor, composed.query, &composed.page)
		.await
		.unwrap();

	let order: Vec<i64> = page.items.iter().map(|u| u.id).collect();
	// Mara, John(30), John(42), Ada
	assert_eq!(order, vec![4, 3, 1, 2]);
}

#[rstest]
#[tokio::test]
async fn test_custom_predicate_filters_through_executor() {
	let composed = engine()
		.compose(
			TestQuery::default(),
			"user",
			&raw(&[("min_age", "40"), ("sort", "id")]),
		)
		.unwrap();
	let executor = TestExecutor { rows: users() };

	let page = paginate_query(&executor, composed.query, &composed.page)
		.await
		.unwrap();

	let ids: Vec<i64> = page.items.iter().map(|u| u.id).collect();
	assert_eq!(ids, vec![1, 4]);
}

#[rstest]
#[tokio::test]
async fn test_pagination_window_and_totals() {
	let rows: Vec<UserRow> = (1..=25)
		.map(|id| UserRow { id, name: "n", age: id })
		.collect();
	let executor = TestExecutor { rows };
	let composed = engine()
		.compose(
			TestQuery::default(),
			"user",
			&raw(&[("sort", "id"), ("page", "3"), ("size", "10")]),
		)
		.unwrap();

	assert_eq!(composed.page, PageRequest::new(3, 10));
	let page = paginate_query(&executor, composed.query, &composed.page)
		.await
		.unwrap();

	assert_eq!(page.total, 25);
	assert_eq!(page.pages, 3);
	assert_eq!(page.len(), 5);
	assert_eq!(page.items[0].id, 21);
}

#[rstest]
#[tokio::test]
async fn test_out_of_range_page_returns_empty_not_error() {
	let rows: Vec<UserRow> = (1..=25)
		.map(|id| UserRow { id, name: "n", age: id })
		.collect();
	let executor = TestExecutor { rows };
	let composed = engine()
		.compose(
			TestQuery::default(),
			"user",
			&raw(&[("page", "9"), ("size", "10")]),
		)
		.unwrap();

	let page = paginate_query(&executor, composed.query, &composed.page)
		.await
		.unwrap();

	assert!(page.items.is_empty());
	assert_eq!(page.total, 25);
	assert_eq!(page.pages, 3);
}

#[rstest]
#[tokio::test]
async fn test_maximal_page_parameter_returns_empty_not_panic() {
	let executor = TestExecutor { rows: users() };
	let composed = engine()
		.compose(
			TestQuery::default(),
			"user",
			&raw(&[("page", "18446744073709551615"), ("size", "10")]),
		)
		.unwrap();

	assert_eq!(composed.page.offset(), u64::MAX);
	let page = paginate_query(&executor, composed.query, &composed.page)
		.await
		.unwrap();

	assert!(page.items.is_empty());
	assert_eq!(page.total, 4);
	assert_eq!(page.pages, 1);
}

#[rstest]
fn test_detail_query_applies_pk_and_includes() {
	let query = engine()
		.compose_by_id(
			TestQuery::default(),
			"user",
			"7",
			&raw(&[("include", "posts.area")]),
		)
		.unwrap();

	assert_eq!(query.filters, vec![("id".to_string(), FieldValue::Integer(7))]);
	assert_eq!(query.loads, vec!["posts", "posts.area"]);
}

#[rstest]
fn test_detail_query_without_primary_key_rejected() {
	let err = engine()
		.compose_by_id(TestQuery::default(), "post", "7", &[])
		.unwrap_err();

	assert!(matches!(err, Error::MissingPrimaryKey(entity) if entity == "post"));
}

#[rstest]
fn test_unknown_entity_rejected() {
	let err = engine()
		.compose(TestQuery::default(), "ghost", &[])
		.unwrap_err();

	assert!(matches!(err, Error::UnknownEntity(name) if name == "ghost"));
}

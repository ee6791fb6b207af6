//! Pure parsing of raw query parameters into typed directives.
//!
//! This stage is syntax only: it never touches the schema registry, so
//! parsing errors and whitelist-validation errors stay distinguishable.
//! Semantic validation of every directive happens downstream in the
//! composer and include resolver.
//!
//! Grammar (case-sensitive keys):
//!
//! - `<field>=<value>`: equality filter on a whitelisted field or custom
//!   predicate name; any key that is not a reserved control key.
//! - `sort=<tok>(,<tok>)*` with `<tok> = ["-"]<name>`; leading `-` marks the
//!   token descending. Token order is sort precedence.
//! - `include=<path>(,<path>)*` with `<path> = <segment>("."<segment>)*`.
//! - `page=<positiveInt>`, `size=<positiveInt>`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paginate::PageRequest;

/// Reserved control keys; everything else is a filter candidate.
const RESERVED_KEYS: [&str; 4] = ["sort", "include", "page", "size"];

/// Engine-wide tunables, a plain value with no global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
	/// Page size applied when the request carries no `size` parameter.
	pub default_page_size: u64,
	/// Hard ceiling; a requested `size` above it is clamped, not rejected.
	pub max_page_size: u64,
	/// When true, text-field filters use a containment clause instead of
	/// equality.
	pub text_contains: bool,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self {
			default_page_size: 20,
			max_page_size: 100,
			text_contains: false,
		}
	}
}

/// An equality-filter directive, still carrying its raw string value.
///
/// `key` must resolve to exactly one entry of the owning entity's fields or
/// custom filter predicates; the composer rejects everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDirective {
	pub key: String,
	pub value: String,
}

/// A sort directive; input order is tie-break precedence, first is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
	pub name: String,
	pub descending: bool,
}

/// An ordered dotted relationship path, e.g. `posts.area`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludePath {
	segments: Vec<String>,
}

impl IncludePath {
	/// Parse a dotted path.
	///
	/// # Errors
	/// [`Error::MalformedInclude`] if any segment is empty.
	///
	/// # Examples
	///
	/// ```
	/// use solo_query::IncludePath;
	///
	/// let path = IncludePath::parse("posts.area").unwrap();
	/// assert_eq!(path.segments(), ["posts", "area"]);
	///
	/// assert!(IncludePath::parse("posts..area").is_err());
	/// ```
	pub fn parse(path: &str) -> Result<Self> {
		let segments: Vec<String> = path.split('.').map(str::to_string).collect();
		if segments.iter().any(String::is_empty) {
			return Err(Error::MalformedInclude(path.to_string()));
		}
		Ok(Self { segments })
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}
}

/// Everything the parser extracts from one request's query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
	pub filters: Vec<FilterDirective>,
	pub sorts: Vec<SortDirective>,
	pub includes: Vec<IncludePath>,
	pub page: PageRequest,
}

/// Parse raw, ordered query parameters into typed directives.
///
/// Filter order is preserved as given; repeated reserved keys keep the last
/// occurrence. Missing `page`/`size` default to `1` and
/// [`QueryConfig::default_page_size`]; `size` is clamped to
/// [`QueryConfig::max_page_size`].
///
/// # Examples
///
/// ```
/// use solo_query::{QueryConfig, params};
///
/// let raw = vec![
///     ("name".to_string(), "John".to_string()),
///     ("sort".to_string(), "-name,age".to_string()),
///     ("include".to_string(), "area,posts.area".to_string()),
///     ("page".to_string(), "3".to_string()),
///     ("size".to_string(), "10".to_string()),
/// ];
/// let parsed = params::parse(&raw, &QueryConfig::default()).unwrap();
///
/// assert_eq!(parsed.filters.len(), 1);
/// assert_eq!(parsed.sorts[0].name, "name");
/// assert!(parsed.sorts[0].descending);
/// assert_eq!(parsed.includes.len(), 2);
/// assert_eq!(parsed.page.offset(), 20);
/// ```
pub fn parse(params: &[(String, String)], config: &QueryConfig) -> Result<ParsedQuery> {
	let mut filters = Vec::new();
	let mut sort_raw = None;
	let mut include_raw = None;
	let mut page_raw = None;
	let mut size_raw = None;

	for (key, value) in params {
		match key.as_str() {
			"sort" => sort_raw = Some(value.as_str()),
			"include" => include_raw = Some(value.as_str()),
			"page" => page_raw = Some(value.as_str()),
			"size" => size_raw = Some(value.as_str()),
			_ => filters.push(FilterDirective {
				key: key.clone(),
				value: value.clone(),
			}),
		}
	}
	debug_assert!(filters.iter().all(|f| !RESERVED_KEYS.contains(&f.key.as_str())));

	let sorts = sort_raw.map(parse_sort).unwrap_or_default();
	let includes = match include_raw {
		Some(raw) => parse_include(raw)?,
		None => Vec::new(),
	};

	let number = parse_positive("page", page_raw)?.unwrap_or(1);
	let size = parse_positive("size", size_raw)?
		.unwrap_or(config.default_page_size)
		.min(config.max_page_size);

	Ok(ParsedQuery {
		filters,
		sorts,
		includes,
		page: PageRequest::new(number, size),
	})
}

/// Split a comma-separated sort value into ordered directives.
///
/// A leading `-` marks a token descending and is stripped from the name.
/// Empty tokens (and a bare `-`) are skipped rather than rejected.
fn parse_sort(raw: &str) -> Vec<SortDirective> {
	raw.split(',')
		.filter_map(|token| {
			let (name, descending) = match token.strip_prefix('-') {
				Some(stripped) => (stripped, true),
				None => (token, false),
			};
			(!name.is_empty()).then(|| SortDirective {
				name: name.to_string(),
				descending,
			})
		})
		.collect()
}

/// Split a comma-separated include value into dotted paths.
///
/// An entirely empty value means "no includes"; an empty path or an empty
/// segment inside a path is malformed.
fn parse_include(raw: &str) -> Result<Vec<IncludePath>> {
	if raw.is_empty() {
		return Ok(Vec::new());
	}
	raw.split(',').map(IncludePath::parse).collect()
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u64>> {
	let Some(raw) = raw else {
		return Ok(None);
	};
	match raw.trim().parse::<u64>() {
		Ok(value) if value >= 1 => Ok(Some(value)),
		_ => Err(Error::InvalidPagination(format!(
			"'{raw}' is not a positive integer for '{name}'"
		))),
	}
}

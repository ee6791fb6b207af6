//! Pagination windows, totals and the uniform page envelope.
//!
//! Two entry points mirror the two ways a handler obtains data:
//! [`paginate_query`] executes a composed query through a
//! [`QueryExecutor`] collaborator (count plus windowed fetch, awaited
//! concurrently), while [`paginate_records`] wraps an already-materialized
//! window and out-of-band total without re-querying. [`paginate_all`]
//! windows a full in-memory sequence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A validated pagination window request.
///
/// `number` and `size` are both 1-based and positive; the parameter parser
/// rejects anything else and clamps `size` to the configured maximum before
/// constructing this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
	/// 1-indexed page number. May exceed the number of available pages;
	/// out-of-range pages yield an empty window, not an error.
	pub number: u64,
	/// Items per page.
	pub size: u64,
}

impl PageRequest {
	pub fn new(number: u64, size: u64) -> Self {
		Self { number, size }
	}

	/// Number of rows to skip for this window.
	///
	/// Saturates instead of overflowing: `page` and `size` come straight
	/// from untrusted request parameters, and an absurdly large page number
	/// must yield an empty window, never a panic or a wrapped offset.
	///
	/// # Examples
	///
	/// ```
	/// use solo_query::PageRequest;
	///
	/// assert_eq!(PageRequest::new(1, 10).offset(), 0);
	/// assert_eq!(PageRequest::new(3, 10).offset(), 20);
	/// assert_eq!(PageRequest::new(u64::MAX, 10).offset(), u64::MAX);
	/// ```
	pub fn offset(&self) -> u64 {
		self.number.saturating_sub(1).saturating_mul(self.size)
	}

	/// Maximum number of rows in this window.
	pub fn limit(&self) -> u64 {
		self.size
	}
}

/// The uniform page envelope returned to response rendering.
///
/// Serializes to exactly `{"items": [...], "total": n, "page": n,
/// "size": n, "pages": n}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
	/// The items of the requested window, at most `size` of them.
	pub items: Vec<T>,
	/// Total number of items across all pages.
	pub total: u64,
	/// The requested 1-indexed page number.
	pub page: u64,
	/// The requested page size.
	pub size: u64,
	/// Total number of pages: `ceil(total / size)`, zero when `total` is zero.
	pub pages: u64,
}

impl<T> Page<T> {
	/// Build an envelope from a window of items, the overall total and the
	/// request that produced the window.
	///
	/// # Examples
	///
	/// ```
	/// use solo_query::{Page, PageRequest};
	///
	/// let page = Page::new(vec!["a", "b"], 25, &PageRequest::new(3, 10));
	/// assert_eq!(page.pages, 3);
	/// assert_eq!(page.total, 25);
	///
	/// let empty: Page<&str> = Page::new(vec![], 0, &PageRequest::new(1, 10));
	/// assert_eq!(empty.pages, 0);
	/// ```
	pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
		Self {
			items,
			total,
			page: request.number,
			size: request.size,
			pages: total.div_ceil(request.size),
		}
	}

	/// Returns true if a page follows the current one.
	///
	/// # Examples
	///
	/// ```
	/// use solo_query::{Page, PageRequest};
	///
	/// let page = Page::new(vec![1, 2], 25, &PageRequest::new(2, 10));
	/// assert!(page.has_next());
	/// assert!(page.has_previous());
	/// ```
	pub fn has_next(&self) -> bool {
		self.page < self.pages
	}

	/// Returns true if a page precedes the current one.
	pub fn has_previous(&self) -> bool {
		self.page > 1
	}

	/// The next page number, if any.
	pub fn next_page(&self) -> Option<u64> {
		self.has_next().then(|| self.page + 1)
	}

	/// The previous page number, if any.
	pub fn previous_page(&self) -> Option<u64> {
		self.has_previous().then(|| self.page - 1)
	}

	/// Number of items in this window.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl<T> IntoIterator for Page<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl<'a, T> IntoIterator for &'a Page<T> {
	type Item = &'a T;
	type IntoIter = std::slice::Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

/// Storage execution collaborator.
///
/// The engine composes queries; the host executes them. Both methods only
/// read the immutable composed query. Errors are propagated unchanged
/// through [`crate::Error::Storage`]; cancellation and timeouts are the
/// executor's concern.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
	type Query: Send + Sync;
	type Row: Send;

	/// Count all rows matched by `query`, ignoring ordering and windowing.
	async fn count(&self, query: &Self::Query) -> anyhow::Result<u64>;

	/// Fetch the window of rows at `offset`/`limit`.
	async fn fetch(
		&self,
		query: &Self::Query,
		offset: u64,
		limit: u64,
	) -> anyhow::Result<Vec<Self::Row>>;
}

/// Execute `query` through `executor` and wrap the requested window in a
/// [`Page`] envelope.
///
/// The count and the windowed fetch are awaited concurrently; if the
/// underlying data changes between them, `total` and `items` may exhibit
/// standard read-skew, which is the storage layer's consistency level to
/// govern. A page number beyond the last page yields an empty `items` with
/// correct `total`/`pages`.
pub async fn paginate_query<E>(
	executor: &E,
	query: E::Query,
	request: &PageRequest,
) -> Result<Page<E::Row>>
where
	E: QueryExecutor,
{
	let (total, items) = futures::try_join!(
		executor.count(&query),
		executor.fetch(&query, request.offset(), request.limit()),
	)?;
	debug!(total, page = request.number, size = request.size, "paginated query");
	Ok(Page::new(items, total, request))
}

/// Wrap an already-windowed result set and an out-of-band total in a
/// [`Page`] envelope, without touching storage.
///
/// For callers that computed the window themselves, e.g. a custom
/// aggregation.
pub fn paginate_records<T>(items: Vec<T>, total: u64, request: &PageRequest) -> Page<T> {
	Page::new(items, total, request)
}

/// Window a full, unpaginated in-memory sequence.
///
/// # Examples
///
/// ```
/// use solo_query::{PageRequest, paginate_all};
///
/// let page = paginate_all((1..=25).collect::<Vec<_>>(), &PageRequest::new(3, 10));
/// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
/// assert_eq!(page.pages, 3);
/// ```
pub fn paginate_all<T>(items: Vec<T>, request: &PageRequest) -> Page<T> {
	let total = items.len() as u64;
	let window = items
		.into_iter()
		.skip(request.offset() as usize)
		.take(request.limit() as usize)
		.collect();
	Page::new(window, total, request)
}

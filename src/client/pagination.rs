//! Offset/size pagination over LogicMonitor list endpoints
//!
//! List endpoints answer with an envelope shaped like
//! `{"data": {"items": [...], "total": n, "searchId": ...}, "meta": {"filteredCount": n}}`.
//! [`Pager`] walks offsets `0, size, 2*size, ...` until the listing is exhausted.

use std::time::Duration;

use log::{debug, warn};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::LogicMonitorApi;
use super::retry::sleep_or_cancel;
use crate::error::{ApiError, Result};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// One exported object: an opaque JSON object in server key order.
pub type Item = Map<String, Value>;

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub offset: usize,
    pub fields: Option<String>,
    pub filter: Option<String>,
}

impl PageRequest {
    /// First page with the given size.
    pub fn first(size: usize) -> Self {
        Self {
            size,
            offset: 0,
            fields: None,
            filter: None,
        }
    }

    /// The page following this one.
    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset + self.size,
            ..self.clone()
        }
    }

    /// Convert to query string parameters.
    ///
    /// `format`, `size` and `offset` are always sent; `fields` and `filter`
    /// only when set and non-empty.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("size", self.size.to_string()),
            ("offset", self.offset.to_string()),
        ];

        if let Some(fields) = self.fields.as_deref().filter(|f| !f.is_empty()) {
            params.push(("fields", fields.to_string()));
        }
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            params.push(("filter", filter.to_string()));
        }

        params
    }
}

/// Listing metadata reported alongside a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub total: Option<i64>,
    pub search_id: Option<String>,
    pub filtered_count: Option<i64>,
}

impl PageMeta {
    /// The reported total, if it is a positive integer.
    pub fn positive_total(&self) -> Option<usize> {
        self.total.filter(|t| *t > 0).map(|t| t as usize)
    }
}

/// A decoded page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Object entries of the page, in server order
    pub items: Vec<Item>,
    /// Length of the raw `items` array, non-object entries included
    pub raw_len: usize,
    pub meta: PageMeta,
}

/// Decode a list envelope, normalizing anything malformed to an empty page.
pub fn extract_page(payload: Value, resource_path: &str) -> Page {
    let Value::Object(mut payload) = payload else {
        warn!(
            "{}: response is not a JSON object, treating as empty page",
            resource_path
        );
        return Page::default();
    };

    let filtered_count = payload
        .get("meta")
        .and_then(|m| m.get("filteredCount"))
        .and_then(Value::as_i64);

    // v3-style responses carry the listing at the top level
    let mut data = match payload.remove("data") {
        Some(Value::Object(data)) => data,
        Some(Value::Null) | None if payload.contains_key("items") => payload,
        Some(Value::Null) | None => Map::new(),
        Some(_) => {
            warn!("{}: `data` is not an object, treating as empty page", resource_path);
            Map::new()
        }
    };

    let meta = PageMeta {
        total: data.get("total").and_then(Value::as_i64),
        search_id: data
            .get("searchId")
            .and_then(Value::as_str)
            .map(str::to_string),
        filtered_count,
    };

    let raw_items = match data.remove("items") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!(
                "{}: `items` is not an array, treating as empty page",
                resource_path
            );
            Vec::new()
        }
    };

    let raw_len = raw_items.len();
    let items: Vec<Item> = raw_items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if items.len() < raw_len {
        warn!(
            "{}: discarded {} non-object entries",
            resource_path,
            raw_len - items.len()
        );
    }

    Page {
        items,
        raw_len,
        meta,
    }
}

/// Every item of a listing, with the last total the server reported.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub items: Vec<Item>,
    pub total: Option<i64>,
}

/// Walks all pages of a list endpoint.
pub struct Pager<'a, A: LogicMonitorApi + ?Sized> {
    api: &'a A,
    page_size: usize,
    pause: Duration,
    fields: Option<String>,
    filter: Option<String>,
    cancel: CancellationToken,
}

impl<'a, A: LogicMonitorApi + ?Sized> Pager<'a, A> {
    pub fn new(api: &'a A, page_size: usize) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            pause: Duration::ZERO,
            fields: None,
            filter: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Pause between pages.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Restrict returned fields (comma-separated).
    pub fn with_fields(mut self, fields: Option<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Server-side filter expression.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Abort the pause between pages when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every item of `resource_path`.
    ///
    /// Stops on an empty page, on a page shorter than the page size, or once a
    /// positive reported total is reached (the result never exceeds it).
    pub async fn fetch_all(&self, resource_path: &str) -> Result<Listing> {
        let mut request = PageRequest {
            fields: self.fields.clone(),
            filter: self.filter.clone(),
            ..PageRequest::first(self.page_size)
        };
        let mut listing = Listing::default();

        loop {
            debug!(
                "Fetching {} offset={} size={}",
                resource_path, request.offset, request.size
            );
            let payload = self
                .api
                .get_json(resource_path, &request.to_query_params())
                .await?;
            let page = extract_page(payload, resource_path);

            debug!(
                "{}: page at offset {} returned {} entries (total={:?}, filteredCount={:?}, searchId={:?})",
                resource_path,
                request.offset,
                page.raw_len,
                page.meta.total,
                page.meta.filtered_count,
                page.meta.search_id
            );

            if page.meta.total.is_some() {
                listing.total = page.meta.total;
            }
            listing.items.extend(page.items);

            if page.raw_len == 0 {
                break;
            }
            if let Some(total) = page.meta.positive_total() {
                if listing.items.len() >= total {
                    if listing.items.len() > total {
                        warn!(
                            "{}: server returned {} items for a total of {}, keeping the first {}",
                            resource_path,
                            listing.items.len(),
                            total,
                            total
                        );
                        listing.items.truncate(total);
                    }
                    break;
                }
            }
            if page.raw_len < request.size {
                break;
            }

            if !self.pause.is_zero() && !sleep_or_cancel(self.pause, &self.cancel).await {
                return Err(ApiError::Cancelled {
                    path: resource_path.to_string(),
                }
                .into());
            }
            request = request.next_page();
        }

        Ok(listing)
    }
}

//! Numbered-page listing driver
//!
//! Pages are requested strictly one after another starting at page 1. The
//! listing ends when the accumulated count reaches the server-reported total,
//! or when a page comes back shorter than the requested size. A failing page
//! call ends the listing with that error; it is never read as "no more data".

use std::future::Future;
use tracing::{debug, info};

/// One page of a listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Total result count, if the server reports one
    pub reported_total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, reported_total: Option<u64>) -> Self {
        Self {
            items,
            reported_total,
        }
    }
}

/// Sequential page walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedFetcher {
    page_size: u32,
}

impl PagedFetcher {
    /// Walker requesting `page_size` items per page (at least 1)
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch every page and return all items in arrival order
    ///
    /// `list_page` receives the 1-based page number. The first reported total
    /// is kept for the rest of the walk.
    pub async fn fetch_all<T, E, F, Fut>(&self, mut list_page: F) -> Result<Vec<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        let mut items: Vec<T> = Vec::new();
        let mut total: Option<u64> = None;
        let mut page_number: u32 = 1;

        loop {
            let page = list_page(page_number).await?;
            let received = page.items.len();

            if total.is_none() {
                total = page.reported_total;
            }

            items.extend(page.items);

            debug!(
                page = page_number,
                received,
                accumulated = items.len(),
                total = ?total,
                "Fetched listing page"
            );

            if let Some(total) = total {
                if items.len() as u64 >= total {
                    break;
                }
            }

            if (received as u64) < u64::from(self.page_size) {
                break;
            }

            page_number += 1;
        }

        info!(
            pages = page_number,
            items = items.len(),
            total = ?total,
            "Listing complete"
        );

        Ok(items)
    }
}

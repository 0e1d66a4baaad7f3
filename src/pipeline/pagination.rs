use crate::errors::{MediaRankError, Result};
use std::future::Future;
use tracing::debug;

/// Continuation marker handed back to the page fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    Offset(u32),
    Cursor(String),
}

/// How a provider signals the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// `offset += page_size` until a short page comes back
    Offset { page_size: u32 },
    /// Follow the provider-issued token until it is absent
    Cursor { page_size: u32 },
}

impl Paging {
    pub fn page_size(&self) -> u32 {
        match self {
            Paging::Offset { page_size } | Paging::Cursor { page_size } => *page_size,
        }
    }
}

/// What the fetcher is asked for on each call
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub token: Option<PageToken>,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u32 {
        match self.token {
            Some(PageToken::Offset(offset)) => offset,
            _ => 0,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        match &self.token {
            Some(PageToken::Cursor(cursor)) => Some(cursor.as_str()),
            _ => None,
        }
    }
}

/// One page of results
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

/// Walks a paginated listing with a hard cap on the number of pages
#[derive(Debug, Clone, Copy)]
pub struct PageWalker {
    max_pages: u32,
}

impl PageWalker {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    /// Fetch every page and concatenate the items in the order received.
    /// The first failing page aborts the walk.
    pub async fn collect_all<T, F, Fut>(&self, paging: Paging, mut fetch: F) -> Result<Vec<T>>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let page_size = paging.page_size();
        let mut items = Vec::new();
        let mut token = match paging {
            Paging::Offset { .. } => Some(PageToken::Offset(0)),
            Paging::Cursor { .. } => None,
        };

        for page_number in 1..=self.max_pages {
            let page = fetch(PageRequest {
                token: token.clone(),
                page_size,
            })
            .await?;
            let received = page.items.len();
            debug!("Page {} returned {} items", page_number, received);
            items.extend(page.items);

            token = match (paging, token) {
                (Paging::Offset { .. }, Some(PageToken::Offset(offset))) => {
                    if received < page_size as usize {
                        return Ok(items);
                    }
                    Some(PageToken::Offset(offset + page_size))
                }
                (Paging::Cursor { .. }, _) => match page.next_cursor {
                    Some(next) if !next.is_empty() => Some(PageToken::Cursor(next)),
                    _ => return Ok(items),
                },
                (Paging::Offset { .. }, _) => return Ok(items),
            };
        }

        Err(MediaRankError::TooManyPages {
            max_pages: self.max_pages,
        })
    }
}

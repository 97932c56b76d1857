// resultsdb-core/src/runtime/paginator.rs
// ============================================================================
// Module: ResultsDB Paginator
// Description: Marker-driven page accumulation with an optional limit.
// Purpose: Drive list fetches to completion without over-fetching or looping.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The paginator is a two-state machine. While [`PaginatorState::Fetching`] it
//! produces one [`PageRequest`] carrying the remaining limit and the current
//! marker. Each fetched page decrements the remaining count by the number of
//! items the server actually returned. It becomes [`PaginatorState::Done`]
//! when the server sends no marker or the limit is used up.
//!
//! Items beyond the remaining limit are dropped, and a server that returns the
//! marker it was just given is rejected as a protocol error. Items are kept in
//! server order; the paginator never re-sorts.

use crate::core::errors::ExperimentError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Parameters for the next page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Remaining number of items wanted, or `None` when unbounded.
    pub limit: Option<u64>,
    /// Marker from the previous page, or `None` for the first page.
    pub marker: Option<String>,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Next marker; `None` or empty when the server has no more data.
    pub marker: Option<String>,
}

/// Paginator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginatorState {
    /// More pages may be fetched.
    Fetching {
        /// Marker to send with the next fetch.
        marker: Option<String>,
        /// Remaining limit, or `None` when unbounded.
        remaining: Option<u64>,
    },
    /// No more pages will be fetched.
    Done,
}

/// Marker-based pagination state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    /// Current state.
    state: PaginatorState,
    /// Number of pages fetched so far.
    fetches: usize,
}

// ============================================================================
// SECTION: State Machine
// ============================================================================

impl Paginator {
    /// Creates a paginator in the fetching state with no marker.
    #[must_use]
    pub const fn new(limit: Option<u64>) -> Self {
        let state = match limit {
            Some(0) => PaginatorState::Done,
            remaining => PaginatorState::Fetching {
                marker: None,
                remaining,
            },
        };
        Self {
            state,
            fetches: 0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &PaginatorState {
        &self.state
    }

    /// Returns the number of pages fetched so far.
    #[must_use]
    pub const fn fetches(&self) -> usize {
        self.fetches
    }

    /// Returns the next fetch to issue, or `None` once done.
    #[must_use]
    pub fn next_request(&self) -> Option<PageRequest> {
        match &self.state {
            PaginatorState::Fetching {
                marker,
                remaining,
            } => Some(PageRequest {
                limit: *remaining,
                marker: marker.clone(),
            }),
            PaginatorState::Done => None,
        }
    }

    /// Records a fetched page and returns how many of its items to keep.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::Protocol`] when the server repeats the
    /// marker it was sent.
    pub fn advance(
        &mut self,
        returned: usize,
        next_marker: Option<String>,
    ) -> Result<usize, ExperimentError> {
        let PaginatorState::Fetching {
            marker,
            remaining,
        } = &self.state
        else {
            return Ok(0);
        };
        self.fetches += 1;
        let keep = remaining.map_or(returned, |remaining| {
            returned.min(usize::try_from(remaining).unwrap_or(usize::MAX))
        });
        let remaining = remaining.map(|remaining| {
            remaining.saturating_sub(u64::try_from(returned).unwrap_or(u64::MAX))
        });
        let next_marker = next_marker.filter(|next| !next.is_empty());
        if next_marker.is_some() && next_marker == *marker {
            self.state = PaginatorState::Done;
            return Err(ExperimentError::Protocol(
                "server returned the same pagination marker twice".to_string(),
            ));
        }
        self.state = match (next_marker, remaining) {
            (None, _) | (_, Some(0)) => PaginatorState::Done,
            (Some(marker), remaining) => PaginatorState::Fetching {
                marker: Some(marker),
                remaining,
            },
        };
        Ok(keep)
    }
}

// ============================================================================
// SECTION: Collection
// ============================================================================

/// Fetches pages until the paginator is done and returns every kept item.
///
/// # Errors
///
/// Returns the first error produced by `fetch`, or a protocol error for a
/// repeated marker.
pub fn collect_pages<T, F>(limit: Option<u64>, mut fetch: F) -> Result<Vec<T>, ExperimentError>
where
    F: FnMut(PageRequest) -> Result<Page<T>, ExperimentError>,
{
    let mut paginator = Paginator::new(limit);
    let mut collected = Vec::new();
    while let Some(request) = paginator.next_request() {
        let page = fetch(request)?;
        let keep = paginator.advance(page.items.len(), page.marker)?;
        collected.extend(page.items.into_iter().take(keep));
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_done_immediately() {
        let paginator = Paginator::new(Some(0));
        assert_eq!(paginator.state(), &PaginatorState::Done);
        assert!(paginator.next_request().is_none());
    }

    #[test]
    fn first_request_has_no_marker() {
        let paginator = Paginator::new(Some(5));
        assert_eq!(
            paginator.next_request(),
            Some(PageRequest {
                limit: Some(5),
                marker: None,
            })
        );
    }

    #[test]
    fn short_page_decrements_by_returned_count() -> Result<(), ExperimentError> {
        let mut paginator = Paginator::new(Some(10));
        let keep = paginator.advance(4, Some("m1".to_string()))?;
        assert_eq!(keep, 4);
        assert_eq!(
            paginator.next_request(),
            Some(PageRequest {
                limit: Some(6),
                marker: Some("m1".to_string()),
            })
        );
        Ok(())
    }

    #[test]
    fn empty_marker_finishes() -> Result<(), ExperimentError> {
        let mut paginator = Paginator::new(None);
        paginator.advance(3, Some(String::new()))?;
        assert_eq!(paginator.state(), &PaginatorState::Done);
        assert_eq!(paginator.fetches(), 1);
        Ok(())
    }
}

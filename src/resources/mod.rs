//! Stateful wrappers over the API client, one per entity: the list as last fetched, whether a
//! fetch is running and the last error, plus the mutations that keep the list current.

mod clients;
mod goals;

pub use self::{clients::ClientsResource, goals::GoalsResource};

use crate::{
    Result,
    client::{ApiClient, FetchPolicy},
    operation::Operation,
    pagination::PaginationInfo,
    search::{FilterState, SortOrder},
    transport::Transport,
};
use getset::Getters;
use log::error;
use serde::{Serialize, de::DeserializeOwned};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct QueryState<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self, result: Result<T>) {
        self.loading = false;
        match result {
            Ok(data) => self.data = Some(data),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn fail<S: Into<String>>(&mut self, message: S) {
        self.error = Some(message.into());
    }
}

/// One page of a filtered, sorted list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

/// Something a list view can search and sort.
pub trait Browsable {
    /// Field names accepted by [`FilterState::sort_by`].
    const SORT_FIELDS: &'static [&'static str];

    fn search_text(&self) -> Vec<&str>;

    /// Compares by one of [`Self::SORT_FIELDS`]; anything else compares equal.
    fn compare_by(&self, other: &Self, field: &str) -> Ordering;
}

/// Searches, sorts and slices `items` in memory. The services have no paging arguments, so
/// the whole list is fetched and paged here.
pub fn view<T: Browsable + Clone>(
    items: &[T],
    filter: &FilterState,
    page: u64,
    limit: u64,
) -> Page<T> {
    let mut matching: Vec<&T> = items
        .iter()
        .filter(|item| filter.matches(item.search_text()))
        .collect();
    if let Some(field) = filter.sort_by.as_deref() {
        let order = filter.sort_order.unwrap_or_default();
        matching.sort_by(|a, b| match order {
            SortOrder::Asc => a.compare_by(b, field),
            SortOrder::Desc => b.compare_by(a, field),
        });
    }
    let pagination = PaginationInfo::new(page, limit, matching.len() as u64);
    let items = matching[pagination.slice_range()]
        .iter()
        .map(|&item| item.clone())
        .collect();
    Page { items, pagination }
}

/// Fetches a list into `state`, logging a failure under `what`.
async fn fetch_list<T, D>(
    api: &ApiClient<T>,
    state: &mut QueryState<Vec<D>>,
    operation: &Operation,
    policy: FetchPolicy,
    what: &str,
) where
    T: Transport,
    D: DeserializeOwned,
{
    state.start();
    let result = api
        .query::<Vec<D>>(operation, policy)
        .await
        .inspect_err(|e| error!("Failed to load {what}: {e}"));
    state.finish(result);
}

/// Runs a mutation; on success refetches the list, on failure records and logs the error
/// as `Failed to <verb> <entity>`.
async fn mutate<T, D, R>(
    api: &ApiClient<T>,
    state: &mut QueryState<Vec<D>>,
    mutation: &Operation,
    list: &Operation,
    verb: &str,
) -> Result<R>
where
    T: Transport,
    D: DeserializeOwned,
    R: DeserializeOwned,
{
    let entity = mutation.entity().to_string().to_lowercase();
    match api.query::<R>(mutation, FetchPolicy::NetworkOnly).await {
        Ok(result) => {
            fetch_list(api, state, list, FetchPolicy::NetworkOnly, &format!("{entity}s")).await;
            Ok(result)
        }
        Err(e) => {
            error!("Failed to {verb} {entity}: {e}");
            state.fail(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Client;
    use pretty_assertions::assert_eq;

    fn clients() -> Vec<Client> {
        ["Mallory", "ada", "Bob", "Adam", "Eve"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| Client {
                id: i as i64 + 1,
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
            })
            .collect()
    }

    fn names(page: &Page<Client>) -> Vec<&str> {
        page.items.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn unfiltered_view_keeps_fetch_order() {
        let page = view(&clients(), &FilterState::default(), 1, 2);
        assert_eq!(names(&page), ["Mallory", "ada"]);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn search_then_sort_then_page() {
        let filter = FilterState::default()
            .with_search("AD")
            .with_sort("name", SortOrder::Desc);
        let page = view(&clients(), &filter, 1, 10);
        assert_eq!(names(&page), ["Adam", "ada"]);
        assert!(!page.pagination.is_visible());
    }

    #[test]
    fn unknown_sort_field_leaves_order_alone() {
        let filter = FilterState::default().with_sort("shoe-size", SortOrder::Asc);
        let page = view(&clients(), &filter, 2, 2);
        assert_eq!(names(&page), ["Bob", "Adam"]);
    }

    #[test]
    fn nothing_matching_gives_an_empty_page() {
        let filter = FilterState::default().with_search("zzz");
        let page = view(&clients(), &filter, 3, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.results_range(), (0, 0));
    }
}

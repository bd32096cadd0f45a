use super::{Browsable, Page, QueryState, fetch_list, mutate, view};
use crate::{
    Error, Result,
    client::{ApiClient, FetchPolicy},
    model::{Client, ClientInput},
    operation::Operation,
    search::FilterState,
    transport::Transport,
};
use std::cmp::Ordering;

impl Browsable for Client {
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "email"];

    fn search_text(&self) -> Vec<&str> {
        vec![&self.name, &self.email]
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            "email" => self.email.to_lowercase().cmp(&other.email.to_lowercase()),
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug)]
pub struct ClientsResource<'a, T> {
    api: &'a ApiClient<T>,
    state: QueryState<Vec<Client>>,
}

impl<'a, T: Transport> ClientsResource<'a, T> {
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            state: QueryState::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> &QueryState<Vec<Client>> {
        &self.state
    }

    /// The clients as last fetched; empty before the first successful load.
    pub fn clients(&self) -> &[Client] {
        self.state.data().as_deref().unwrap_or_default()
    }

    pub async fn load(&mut self) -> &QueryState<Vec<Client>> {
        self.fetch(FetchPolicy::CacheFirst).await
    }

    pub async fn refetch(&mut self) -> &QueryState<Vec<Client>> {
        self.fetch(FetchPolicy::NetworkOnly).await
    }

    async fn fetch(&mut self, policy: FetchPolicy) -> &QueryState<Vec<Client>> {
        fetch_list(
            self.api,
            &mut self.state,
            &Operation::GetAllClients,
            policy,
            "clients",
        )
        .await;
        &self.state
    }

    pub async fn get(&self, id: i64) -> Result<Client> {
        self.api
            .query::<Option<Client>>(&Operation::GetClientById { id }, FetchPolicy::CacheFirst)
            .await?
            .ok_or_else(|| Error::not_found("Client", id))
    }

    pub async fn create(&mut self, input: ClientInput) -> Result<Client> {
        let mutation = Operation::CreateClient(input);
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllClients, "create").await
    }

    pub async fn update(&mut self, id: i64, input: ClientInput) -> Result<Client> {
        let mutation = Operation::UpdateClient { id, input };
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllClients, "update").await
    }

    /// Returns whether the service reported the client as deleted.
    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let mutation = Operation::DeleteClient { id };
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllClients, "delete").await
    }

    pub fn view(&self, filter: &FilterState, page: u64, limit: u64) -> Page<Client> {
        view(self.clients(), filter, page, limit)
    }
}

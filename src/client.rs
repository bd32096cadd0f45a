//! The API client: typed operations in, decoded data out, with a normalized cache in between.

use crate::{
    Error, Result,
    cache::Cache,
    model::{Client, DashboardData, Goal},
    operation::{Operation, OperationKind},
    router::{NameRouter, Service},
    transport::{GraphQlRequest, Transport},
};
use log::{debug, error};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use strum::EnumIs;

lazy_static! {
    static ref OPERATION_HEADER: Regex =
        Regex::new(r"^\s*(?:query|mutation|subscription)\s+([_A-Za-z][_0-9A-Za-z]*)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIs)]
pub enum FetchPolicy {
    /// Answer from the cache when it has the field, otherwise ask the service.
    #[default]
    CacheFirst,
    NetworkOnly,
}

/// The operation name declared at the top of a GraphQL document, if it has one.
pub fn operation_name_of(document: &str) -> Option<&str> {
    OPERATION_HEADER
        .captures(document)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decodes `data` into `D`. Failures name the JSON path that did not fit.
pub fn decode<D: DeserializeOwned>(value: Value) -> Result<D> {
    Ok(serde_path_to_error::deserialize(value)?)
}

#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    cache: Mutex<Cache>,
    router: NameRouter,
    bearer: Option<String>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, router: NameRouter) -> Self {
        Self::with_cache(transport, router, Cache::default())
    }

    pub fn with_cache(transport: T, router: NameRouter, cache: Cache) -> Self {
        Self {
            transport,
            cache: Mutex::new(cache),
            router,
            bearer: None,
        }
    }

    /// The token sent with every request from now on. `None` sends requests unauthenticated.
    pub fn set_bearer(&mut self, token: Option<String>) {
        self.bearer = token;
    }

    #[inline]
    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    #[inline]
    pub fn router(&self) -> &NameRouter {
        &self.router
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// Runs an operation against its service and returns its root field.
    pub async fn execute(&self, operation: &Operation, policy: FetchPolicy) -> Result<Value> {
        let field = operation.root_field();
        let variables = operation.variables();
        if policy.is_cache_first() && operation.kind().is_query() {
            let cached = self.cache().read_field(field, &variables);
            if let Some(hit) = cached {
                debug!("Answered {} from the cache", operation.name());
                return Ok(hit);
            }
        }
        let generation = self.cache().begin_request();
        let mut data = self.send(operation.service(), &operation.request()).await?;
        let value = data.remove(field).ok_or_else(|| Error::missing_data(field))?;

        let typename: &'static str = operation.entity().into();
        let mut cache = self.cache();
        match (operation.kind(), operation.deleted_id()) {
            (OperationKind::Query, _) => {
                cache.write_field(field, &variables, value.clone(), generation);
            }
            (OperationKind::Mutation, Some(id)) => {
                cache.evict(typename, id);
            }
            (OperationKind::Mutation, None) => {
                cache.write_entity(typename, value.clone());
            }
        }
        Ok(value)
    }

    pub async fn query<D: DeserializeOwned>(
        &self,
        operation: &Operation,
        policy: FetchPolicy,
    ) -> Result<D> {
        decode(self.execute(operation, policy).await?)
    }

    /// Sends a document typed in by hand. Unless `service` is given it is routed by its
    /// operation name: the explicit `name`, or else the one declared in the document.
    pub async fn execute_raw(
        &self,
        name: Option<&str>,
        document: &str,
        variables: Map<String, Value>,
        service: Option<Service>,
    ) -> Result<Value> {
        let name = name.or_else(|| operation_name_of(document));
        let service = service.unwrap_or_else(|| self.router.route(name));
        let request = GraphQlRequest::new(name, document, variables);
        let data = self.send(service, &request).await?;
        Ok(Value::Object(data))
    }

    /// Clients and goals, fetched from their services at the same time.
    pub async fn dashboard(&self, policy: FetchPolicy) -> Result<DashboardData> {
        let (clients, goals) = tokio::join!(
            self.query::<Vec<Client>>(&Operation::GetAllClients, policy),
            self.query::<Vec<Goal>>(&Operation::GetAllGoals, policy),
        );
        Ok(DashboardData {
            clients: clients?,
            goals: goals?,
        })
    }

    async fn send(&self, service: Service, request: &GraphQlRequest) -> Result<Map<String, Value>> {
        let response = self
            .transport
            .send(service, request, self.bearer.clone())
            .await
            .inspect_err(|e| match e {
                Error::Http { .. } => error!("{e}"),
                _ => error!("[Network error]: {e}"),
            })?;
        for e in &response.errors {
            error!(
                "[GraphQL error]: Message: {}, Location: {}, Path: {}",
                e.message,
                e.locations_display(),
                e.path_display()
            );
        }
        if !response.errors.is_empty() {
            return Err(Error::graphql(
                response.errors.into_iter().map(|e| e.message),
            ));
        }
        match response.data {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(Error::missing_data("data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::ClientInput,
        transport::{GraphQlResponse, MockTransport},
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn clients_response() -> GraphQlResponse {
        GraphQlResponse::from_data(json!({
            "getAllClients": [
                { "id": "1", "name": "Ada", "email": "ada@example.com" },
                { "id": "2", "name": "Grace", "email": "grace@example.com" },
            ]
        }))
    }

    #[test]
    fn operation_names_are_read_from_documents() {
        assert_eq!(
            operation_name_of("  query GetProgress($id: ID!) { x }"),
            Some("GetProgress")
        );
        assert_eq!(operation_name_of("mutation Do { x }"), Some("Do"));
        assert_eq!(operation_name_of("{ getAllClients { id } }"), None);
    }

    #[tokio::test]
    async fn operations_go_to_their_own_service_with_the_bearer() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, request, token| {
                *service == Service::Goals
                    && request.operation_name.as_deref() == Some("GetGoalsByClient")
                    && token.as_deref() == Some("jwt")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(GraphQlResponse::from_data(json!({
                    "getGoalsByClient": [
                        { "id": "5", "clientId": "2", "goalName": "House", "targetAmount": 250000.0 }
                    ]
                })))
            });
        let mut api = ApiClient::new(transport, NameRouter::default());
        api.set_bearer(Some("jwt".into()));
        let goals: Vec<Goal> = api
            .query(
                &Operation::GetGoalsByClient { client_id: 2 },
                FetchPolicy::NetworkOnly,
            )
            .await
            .unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].target_amount, dec!(250000));
    }

    #[tokio::test]
    async fn without_a_token_requests_still_go_out_unauthenticated() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, _, token| *service == Service::Clients && token.is_none())
            .times(1)
            .returning(|_, _, _| Ok(clients_response()));
        let api = ApiClient::new(transport, NameRouter::default());
        assert_eq!(api.bearer(), None);
        let clients: Vec<Client> = api
            .query(&Operation::GetAllClients, FetchPolicy::NetworkOnly)
            .await
            .unwrap();
        assert_eq!(clients.len(), 2);
    }

    #[tokio::test]
    async fn cache_first_reuses_the_previous_answer() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _, _| Ok(clients_response()));
        let api = ApiClient::new(transport, NameRouter::default());
        let first: Vec<Client> = api
            .query(&Operation::GetAllClients, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        let second: Vec<Client> = api
            .query(&Operation::GetAllClients, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second[1].name, "Grace");
    }

    #[tokio::test]
    async fn network_only_always_asks() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_, _, _| Ok(clients_response()));
        let api = ApiClient::new(transport, NameRouter::default());
        for _ in 0..2 {
            api.execute(&Operation::GetAllClients, FetchPolicy::NetworkOnly)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn graphql_errors_fail_the_operation() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_, _, _| {
            Ok(GraphQlResponse::from_errors(["Client not found"]))
        });
        let api = ApiClient::new(transport, NameRouter::default());
        let error = api
            .execute(&Operation::GetClientById { id: 9 }, FetchPolicy::NetworkOnly)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Client not found");
    }

    #[tokio::test]
    async fn updates_refresh_cached_lists() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|_, request, _| request.operation_name.as_deref() == Some("GetAllClients"))
            .times(1)
            .returning(|_, _, _| Ok(clients_response()));
        transport
            .expect_send()
            .withf(|_, request, _| request.operation_name.as_deref() == Some("UpdateClient"))
            .times(1)
            .returning(|_, _, _| {
                Ok(GraphQlResponse::from_data(json!({
                    "updateClient": { "id": "2", "name": "Grace H.", "email": "grace@example.com" }
                })))
            });
        let api = ApiClient::new(transport, NameRouter::default());
        api.execute(&Operation::GetAllClients, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        let update = Operation::UpdateClient {
            id: 2,
            input: ClientInput {
                name: "Grace H.".into(),
                email: "grace@example.com".into(),
            },
        };
        api.execute(&update, FetchPolicy::NetworkOnly).await.unwrap();
        let clients: Vec<Client> = api
            .query(&Operation::GetAllClients, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        assert_eq!(clients[1].name, "Grace H.");
    }

    #[tokio::test]
    async fn raw_documents_are_routed_by_name() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, request, token| {
                *service == Service::Goals
                    && request.operation_name.as_deref() == Some("GetProgress")
                    && token.is_none()
            })
            .returning(|_, _, _| Ok(GraphQlResponse::from_data(json!({ "progress": 3 }))));
        transport
            .expect_send()
            .withf(|service, _, _| *service == Service::Clients)
            .returning(|_, _, _| Ok(GraphQlResponse::from_data(json!({ "me": "ada" }))));
        let api = ApiClient::new(transport, NameRouter::default());
        let data = api
            .execute_raw(None, "query GetProgress { progress }", Map::new(), None)
            .await
            .unwrap();
        assert_eq!(data, json!({ "progress": 3 }));
        let data = api
            .execute_raw(None, "{ me }", Map::new(), None)
            .await
            .unwrap();
        assert_eq!(data, json!({ "me": "ada" }));
    }

    #[tokio::test]
    async fn dashboard_reads_both_services() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, _, _| *service == Service::Clients)
            .times(1)
            .returning(|_, _, _| Ok(clients_response()));
        transport
            .expect_send()
            .withf(|service, _, _| *service == Service::Goals)
            .times(1)
            .returning(|_, _, _| {
                Ok(GraphQlResponse::from_data(json!({
                    "getAllGoals": [
                        { "id": "1", "clientId": "1", "goalName": "Trip", "targetAmount": 1500.5 },
                        { "id": "2", "clientId": "2", "goalName": "Car", "targetAmount": 9000 },
                    ]
                })))
            });
        let api = ApiClient::new(transport, NameRouter::default());
        let dashboard = api.dashboard(FetchPolicy::NetworkOnly).await.unwrap();
        assert_eq!(dashboard.total_clients(), 2);
        assert_eq!(dashboard.total_goals(), 2);
        assert_eq!(dashboard.total_goal_amount(), dec!(10500.5));
    }

    #[tokio::test]
    async fn decode_failures_name_the_path() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_, _, _| {
            Ok(GraphQlResponse::from_data(json!({
                "getAllClients": [{ "id": "1", "name": "Ada" }]
            })))
        });
        let api = ApiClient::new(transport, NameRouter::default());
        let error = api
            .query::<Vec<Client>>(&Operation::GetAllClients, FetchPolicy::NetworkOnly)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("[0]"), "{error}");
    }
}

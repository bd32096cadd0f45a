use super::{Browsable, Page, QueryState, fetch_list, mutate, view};
use crate::{
    Error, Result,
    client::{ApiClient, FetchPolicy},
    model::{Goal, GoalInput},
    operation::Operation,
    search::FilterState,
    transport::Transport,
};
use std::cmp::Ordering;

impl Browsable for Goal {
    const SORT_FIELDS: &'static [&'static str] = &["id", "clientId", "goalName", "targetAmount"];

    fn search_text(&self) -> Vec<&str> {
        vec![&self.goal_name]
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "clientId" => self.client_id.cmp(&other.client_id),
            "goalName" => self
                .goal_name
                .to_lowercase()
                .cmp(&other.goal_name.to_lowercase()),
            "targetAmount" => self.target_amount.cmp(&other.target_amount),
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug)]
pub struct GoalsResource<'a, T> {
    api: &'a ApiClient<T>,
    state: QueryState<Vec<Goal>>,
}

impl<'a, T: Transport> GoalsResource<'a, T> {
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            state: QueryState::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> &QueryState<Vec<Goal>> {
        &self.state
    }

    pub fn goals(&self) -> &[Goal] {
        self.state.data().as_deref().unwrap_or_default()
    }

    pub async fn load(&mut self) -> &QueryState<Vec<Goal>> {
        self.fetch(FetchPolicy::CacheFirst).await
    }

    pub async fn refetch(&mut self) -> &QueryState<Vec<Goal>> {
        self.fetch(FetchPolicy::NetworkOnly).await
    }

    async fn fetch(&mut self, policy: FetchPolicy) -> &QueryState<Vec<Goal>> {
        fetch_list(
            self.api,
            &mut self.state,
            &Operation::GetAllGoals,
            policy,
            "goals",
        )
        .await;
        &self.state
    }

    pub async fn get(&self, id: i64) -> Result<Goal> {
        self.api
            .query::<Option<Goal>>(&Operation::GetGoalById { id }, FetchPolicy::CacheFirst)
            .await?
            .ok_or_else(|| Error::not_found("Goal", id))
    }

    /// Goals of one client, answered by the goal service.
    pub async fn by_client(&self, client_id: i64) -> Result<Vec<Goal>> {
        self.api
            .query(
                &Operation::GetGoalsByClient { client_id },
                FetchPolicy::CacheFirst,
            )
            .await
    }

    pub async fn create(&mut self, input: GoalInput) -> Result<Goal> {
        let mutation = Operation::CreateGoal(input);
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllGoals, "create").await
    }

    /// The client a goal belongs to cannot be changed; `input.client_id` is not sent.
    pub async fn update(&mut self, id: i64, input: GoalInput) -> Result<Goal> {
        let mutation = Operation::UpdateGoal { id, input };
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllGoals, "update").await
    }

    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let mutation = Operation::DeleteGoal { id };
        mutate(self.api, &mut self.state, &mutation, &Operation::GetAllGoals, "delete").await
    }

    pub fn view(&self, filter: &FilterState, page: u64, limit: u64) -> Page<Goal> {
        view(self.goals(), filter, page, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        router::{NameRouter, Service},
        search::SortOrder,
        transport::{GraphQlResponse, MockTransport},
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn goals_response() -> GraphQlResponse {
        GraphQlResponse::from_data(json!({
            "getAllGoals": [
                { "id": "1", "clientId": "1", "goalName": "Retirement", "targetAmount": 500000 },
                { "id": "2", "clientId": "2", "goalName": "Car", "targetAmount": 15000.5 },
                { "id": "3", "clientId": "1", "goalName": "Vacation", "targetAmount": 3000 },
            ]
        }))
    }

    #[tokio::test]
    async fn goals_are_loaded_from_the_goal_service() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, _, _| *service == Service::Goals)
            .times(1)
            .returning(|_, _, _| Ok(goals_response()));
        let api = ApiClient::new(transport, NameRouter::default());
        let mut goals = GoalsResource::new(&api);
        goals.load().await;
        assert_eq!(goals.goals().len(), 3);

        let filter = FilterState::default().with_sort("targetAmount", SortOrder::Asc);
        let page = goals.view(&filter, 1, 2);
        let amounts: Vec<_> = page.items.iter().map(|g| g.target_amount).collect();
        assert_eq!(amounts, [dec!(3000), dec!(15000.5)]);
        assert!(page.pagination.next_enabled());
    }

    #[tokio::test]
    async fn update_does_not_send_the_client() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|_, request, _| request.operation_name.as_deref() == Some("UpdateGoal"))
            .times(1)
            .returning(|_, request, _| {
                assert!(!request.variables.contains_key("clientId"));
                Ok(GraphQlResponse::from_data(json!({
                    "updateGoal": { "id": "2", "clientId": "2", "goalName": "Truck", "targetAmount": 30000 }
                })))
            });
        transport
            .expect_send()
            .withf(|_, request, _| request.operation_name.as_deref() == Some("GetAllGoals"))
            .times(1)
            .returning(|_, _, _| Ok(goals_response()));
        let api = ApiClient::new(transport, NameRouter::default());
        let mut goals = GoalsResource::new(&api);
        let updated = goals
            .update(
                2,
                GoalInput {
                    client_id: 9,
                    goal_name: "Truck".into(),
                    goal_amount: dec!(30000),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.client_id, 2);
        assert_eq!(goals.goals().len(), 3);
    }

    #[tokio::test]
    async fn failed_create_is_reported() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _, _| Ok(GraphQlResponse::from_errors(["Client does not exist"])));
        let api = ApiClient::new(transport, NameRouter::default());
        let mut goals = GoalsResource::new(&api);
        let error = goals
            .create(GoalInput {
                client_id: 404,
                goal_name: "Boat".into(),
                goal_amount: dec!(1),
            })
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Client does not exist");
        assert_eq!(
            goals.state().error().as_deref(),
            Some("Client does not exist")
        );
    }

    #[tokio::test]
    async fn goals_of_one_client() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|service, request, _| {
                *service == Service::Goals && request.variables["clientId"] == json!("1")
            })
            .returning(|_, _, _| {
                Ok(GraphQlResponse::from_data(json!({
                    "getGoalsByClient": [
                        { "id": "1", "clientId": "1", "goalName": "Retirement", "targetAmount": 500000 }
                    ]
                })))
            });
        let api = ApiClient::new(transport, NameRouter::default());
        let goals = GoalsResource::new(&api);
        let found = goals.by_client(1).await.unwrap();
        assert_eq!(found[0].goal_name, "Retirement");
    }
}

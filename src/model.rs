use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many entries the dashboard lists as "recent".
pub const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(with = "crate::serializers::graphql_id")]
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(with = "crate::serializers::graphql_id")]
    pub id: i64,
    #[serde(with = "crate::serializers::graphql_id")]
    pub client_id: i64,
    pub goal_name: String,
    pub target_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder, Default)]
#[serde(rename_all = "camelCase")]
#[builder(build_fn(error = "crate::Error"))]
pub struct ClientInput {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub email: String,
}

impl From<&Client> for ClientInput {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder, Default)]
#[serde(rename_all = "camelCase")]
#[builder(build_fn(error = "crate::Error"))]
pub struct GoalInput {
    #[serde(with = "crate::serializers::graphql_id")]
    pub client_id: i64,
    #[builder(setter(into))]
    pub goal_name: String,
    pub goal_amount: Decimal,
}

impl From<&Goal> for GoalInput {
    fn from(goal: &Goal) -> Self {
        Self {
            client_id: goal.client_id,
            goal_name: goal.goal_name.clone(),
            goal_amount: goal.target_amount,
        }
    }
}

/// Everything the dashboard shows, fetched from both services.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DashboardData {
    pub clients: Vec<Client>,
    pub goals: Vec<Goal>,
}

impl DashboardData {
    #[inline]
    pub fn total_clients(&self) -> usize {
        self.clients.len()
    }

    #[inline]
    pub fn total_goals(&self) -> usize {
        self.goals.len()
    }

    pub fn total_goal_amount(&self) -> Decimal {
        self.goals.iter().map(|g| g.target_amount).sum()
    }

    /// The last few clients returned by the service, newest first.
    pub fn recent_clients(&self) -> Vec<&Client> {
        self.clients.iter().rev().take(RECENT_ENTRIES).collect()
    }

    /// The last few goals returned by the service, newest first.
    pub fn recent_goals(&self) -> Vec<&Goal> {
        self.goals.iter().rev().take(RECENT_ENTRIES).collect()
    }

    pub fn client_name(&self, client_id: i64) -> Option<&str> {
        self.clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.name.as_str())
    }
}

use crate::{
    model::{ClientInput, GoalInput},
    router::Service,
    transport::GraphQlRequest,
};
use serde_json::{Map, Value, json};
use strum::{Display, EnumIs, IntoStaticStr};

pub mod documents {
    pub const GET_ALL_CLIENTS: &str = r#"query GetAllClients {
  getAllClients {
    id
    name
    email
  }
}"#;

    pub const GET_CLIENT_BY_ID: &str = r#"query GetClientById($id: ID!) {
  getClient(id: $id) {
    id
    name
    email
  }
}"#;

    pub const CREATE_CLIENT: &str = r#"mutation CreateClient($name: String!, $email: String!) {
  createClient(name: $name, email: $email) {
    id
    name
    email
  }
}"#;

    pub const UPDATE_CLIENT: &str = r#"mutation UpdateClient($id: ID!, $name: String!, $email: String!) {
  updateClient(id: $id, name: $name, email: $email) {
    id
    name
    email
  }
}"#;

    pub const DELETE_CLIENT: &str = r#"mutation DeleteClient($id: ID!) {
  deleteClient(id: $id)
}"#;

    pub const GET_ALL_GOALS: &str = r#"query GetAllGoals {
  getAllGoals {
    id
    clientId
    goalName
    targetAmount
  }
}"#;

    pub const GET_GOAL_BY_ID: &str = r#"query GetGoalById($id: ID!) {
  getGoal(id: $id) {
    id
    clientId
    goalName
    targetAmount
  }
}"#;

    pub const GET_GOALS_BY_CLIENT: &str = r#"query GetGoalsByClient($clientId: ID!) {
  getGoalsByClient(clientId: $clientId) {
    id
    clientId
    goalName
    targetAmount
  }
}"#;

    pub const CREATE_GOAL: &str = r#"mutation CreateGoal($clientId: ID!, $goalName: String!, $goalAmount: Float!) {
  createGoal(clientId: $clientId, goalName: $goalName, goalAmount: $goalAmount) {
    id
    clientId
    goalName
    targetAmount
  }
}"#;

    // The goal service does not accept a client id when updating.
    pub const UPDATE_GOAL: &str = r#"mutation UpdateGoal($id: ID!, $goalName: String!, $goalAmount: Float!) {
  updateGoal(id: $id, goalName: $goalName, goalAmount: $goalAmount) {
    id
    clientId
    goalName
    targetAmount
  }
}"#;

    pub const DELETE_GOAL: &str = r#"mutation DeleteGoal($id: ID!) {
  deleteGoal(id: $id)
}"#;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// The entity type an operation reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Entity {
    Client,
    Goal,
}

/// Every GraphQL operation the application sends. Each one knows its document, its variables
/// and the service that answers it.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Operation {
    GetAllClients,
    GetClientById { id: i64 },
    CreateClient(ClientInput),
    UpdateClient { id: i64, input: ClientInput },
    DeleteClient { id: i64 },
    GetAllGoals,
    GetGoalById { id: i64 },
    GetGoalsByClient { client_id: i64 },
    CreateGoal(GoalInput),
    UpdateGoal { id: i64, input: GoalInput },
    DeleteGoal { id: i64 },
}

impl Operation {
    /// Names of every operation, in declaration order.
    pub const NAMES: &'static [&'static str] = &[
        "GetAllClients",
        "GetClientById",
        "CreateClient",
        "UpdateClient",
        "DeleteClient",
        "GetAllGoals",
        "GetGoalById",
        "GetGoalsByClient",
        "CreateGoal",
        "UpdateGoal",
        "DeleteGoal",
    ];

    /// The GraphQL operation name, as declared in the document.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn service(&self) -> Service {
        match self.entity() {
            Entity::Client => Service::Clients,
            Entity::Goal => Service::Goals,
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            Self::GetAllClients
            | Self::GetClientById { .. }
            | Self::CreateClient(_)
            | Self::UpdateClient { .. }
            | Self::DeleteClient { .. } => Entity::Client,
            Self::GetAllGoals
            | Self::GetGoalById { .. }
            | Self::GetGoalsByClient { .. }
            | Self::CreateGoal(_)
            | Self::UpdateGoal { .. }
            | Self::DeleteGoal { .. } => Entity::Goal,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateClient(_)
            | Self::UpdateClient { .. }
            | Self::DeleteClient { .. }
            | Self::CreateGoal(_)
            | Self::UpdateGoal { .. }
            | Self::DeleteGoal { .. } => OperationKind::Mutation,
            _ => OperationKind::Query,
        }
    }

    /// The single top-level field the document selects.
    pub fn root_field(&self) -> &'static str {
        match self {
            Self::GetAllClients => "getAllClients",
            Self::GetClientById { .. } => "getClient",
            Self::CreateClient(_) => "createClient",
            Self::UpdateClient { .. } => "updateClient",
            Self::DeleteClient { .. } => "deleteClient",
            Self::GetAllGoals => "getAllGoals",
            Self::GetGoalById { .. } => "getGoal",
            Self::GetGoalsByClient { .. } => "getGoalsByClient",
            Self::CreateGoal(_) => "createGoal",
            Self::UpdateGoal { .. } => "updateGoal",
            Self::DeleteGoal { .. } => "deleteGoal",
        }
    }

    pub fn document(&self) -> &'static str {
        use documents::*;
        match self {
            Self::GetAllClients => GET_ALL_CLIENTS,
            Self::GetClientById { .. } => GET_CLIENT_BY_ID,
            Self::CreateClient(_) => CREATE_CLIENT,
            Self::UpdateClient { .. } => UPDATE_CLIENT,
            Self::DeleteClient { .. } => DELETE_CLIENT,
            Self::GetAllGoals => GET_ALL_GOALS,
            Self::GetGoalById { .. } => GET_GOAL_BY_ID,
            Self::GetGoalsByClient { .. } => GET_GOALS_BY_CLIENT,
            Self::CreateGoal(_) => CREATE_GOAL,
            Self::UpdateGoal { .. } => UPDATE_GOAL,
            Self::DeleteGoal { .. } => DELETE_GOAL,
        }
    }

    pub fn variables(&self) -> Map<String, Value> {
        let value = match self {
            Self::GetAllClients | Self::GetAllGoals => json!({}),
            Self::GetClientById { id }
            | Self::DeleteClient { id }
            | Self::GetGoalById { id }
            | Self::DeleteGoal { id } => json!({ "id": id.to_string() }),
            Self::CreateClient(input) => json!({ "name": input.name, "email": input.email }),
            Self::UpdateClient { id, input } => json!({
                "id": id.to_string(),
                "name": input.name,
                "email": input.email,
            }),
            Self::GetGoalsByClient { client_id } => json!({ "clientId": client_id.to_string() }),
            Self::CreateGoal(input) => json!({
                "clientId": input.client_id.to_string(),
                "goalName": input.goal_name,
                "goalAmount": input.goal_amount,
            }),
            Self::UpdateGoal { id, input } => json!({
                "id": id.to_string(),
                "goalName": input.goal_name,
                "goalAmount": input.goal_amount,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// The id of the entity a delete removes, so it can be evicted from the cache.
    pub fn deleted_id(&self) -> Option<i64> {
        match self {
            Self::DeleteClient { id } | Self::DeleteGoal { id } => Some(*id),
            _ => None,
        }
    }

    pub fn request(&self) -> GraphQlRequest {
        GraphQlRequest::new(Some(self.name()), self.document(), self.variables())
    }
}

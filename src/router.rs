use getset::Getters;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, EnumIter, EnumString};

/// The two GraphQL back ends an operation can be sent to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIs,
    EnumIter,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Service {
    /// The client service (endpoint A). Also serves authentication.
    Clients,
    /// The goal service (endpoint B).
    Goals,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Endpoints {
    clients: String,
    goals: String,
}

impl Endpoints {
    pub fn new<A: AsRef<str>, B: AsRef<str>>(clients: A, goals: B) -> Self {
        Self {
            clients: String::from(clients.as_ref().trim_end_matches('/')),
            goals: String::from(goals.as_ref().trim_end_matches('/')),
        }
    }

    #[inline]
    pub fn url(&self, service: Service) -> &str {
        match service {
            Service::Clients => &self.clients,
            Service::Goals => &self.goals,
        }
    }
}

/// Routes operations that only carry a name (raw documents typed in by a user). Typed
/// [`Operation`](crate::Operation)s know their service and never come through here.
///
/// A name containing "client" (in any case), or equal to one of the fixed client names, goes
/// to the client service. Otherwise a name containing "goal", or equal to one of the fixed goal
/// names, goes to the goal service. Everything else, including a missing name, falls back to
/// the client service.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[getset(get = "pub")]
pub struct NameRouter {
    client_operations: Vec<String>,
    goal_operations: Vec<String>,
}

impl Default for NameRouter {
    fn default() -> Self {
        Self {
            client_operations: vec!["GetDashboardData".into(), "CurrentUser".into()],
            goal_operations: vec!["GetProgress".into(), "GetTargetSummary".into()],
        }
    }
}

impl NameRouter {
    pub fn new<I, J, S, T>(client_operations: I, goal_operations: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            client_operations: client_operations.into_iter().map(Into::into).collect(),
            goal_operations: goal_operations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn route(&self, name: Option<&str>) -> Service {
        let service = match name {
            Some(name) if self.is_client_operation(name) => Service::Clients,
            Some(name) if self.is_goal_operation(name) => Service::Goals,
            _ => Service::Clients,
        };
        debug!(
            "Routing operation {} to the {service} service",
            name.unwrap_or("<anonymous>")
        );
        service
    }

    fn is_client_operation(&self, name: &str) -> bool {
        name.to_lowercase().contains("client") || self.client_operations.iter().any(|n| n == name)
    }

    fn is_goal_operation(&self, name: &str) -> bool {
        name.to_lowercase().contains("goal") || self.goal_operations.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_names_go_to_client_service() {
        let router = NameRouter::default();
        for name in ["GetAllClients", "createclient", "CLIENTS", "GetDashboardData", "CurrentUser"] {
            assert_eq!(router.route(Some(name)), Service::Clients, "{name}");
        }
    }

    #[test]
    fn goal_names_go_to_goal_service() {
        let router = NameRouter::default();
        for name in ["GetAllGoals", "deleteGoal", "GOALS", "GetProgress", "GetTargetSummary"] {
            assert_eq!(router.route(Some(name)), Service::Goals, "{name}");
        }
    }

    #[test]
    fn client_match_wins_over_goal_match() {
        // Operation::GetGoalsByClient sends this one to the goal service.
        assert_eq!(
            NameRouter::default().route(Some("GetGoalsByClient")),
            Service::Clients
        );
    }

    #[test]
    fn everything_else_defaults_to_client_service() {
        let router = NameRouter::default();
        assert_eq!(router.route(None), Service::Clients);
        assert_eq!(router.route(Some("")), Service::Clients);
        assert_eq!(router.route(Some("Health")), Service::Clients);
    }

    #[test]
    fn fixed_names_are_configurable() {
        let router = NameRouter::new(["Summary"], ["Milestones"]);
        assert_eq!(router.route(Some("Milestones")), Service::Goals);
        assert_eq!(router.route(Some("GetProgress")), Service::Clients);
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        let endpoints = Endpoints::new("http://a/graphql/", "http://b/graphql");
        assert_eq!(endpoints.url(Service::Clients), "http://a/graphql");
        assert_eq!(endpoints.url(Service::Goals), "http://b/graphql");
    }
}

use crate::{Config, operation::Operation};
use clap_complete::CompletionCandidate;
use std::{collections::BTreeMap, ffi::OsStr};

/// Ranks candidates: an exact match first, then prefix matches, then those containing
/// `current`, then those ending with it.
fn filter_candidates<I>(current: &OsStr, all_candidates: I) -> Vec<CompletionCandidate>
where
    I: IntoIterator<Item = (String, String)>,
{
    let current = current.to_string_lossy();
    let current = current.as_ref();
    let mut starts_with = BTreeMap::new();
    let mut contains = BTreeMap::new();
    let mut ends_with = BTreeMap::new();
    let mut exact = None;
    for (name, help) in all_candidates {
        if name == current {
            exact = Some((name, help));
        } else if name.starts_with(current) {
            starts_with.insert(name, help);
        } else if name.ends_with(current) {
            ends_with.insert(name, help);
        } else if name.contains(current) {
            contains.insert(name, help);
        }
    }
    exact
        .into_iter()
        .chain(starts_with)
        .chain(contains)
        .chain(ends_with)
        .enumerate()
        .map(|(order, (name, help))| {
            CompletionCandidate::new(name)
                .display_order(Some(order))
                .help(Some(help.into()))
        })
        .collect()
}

fn known_operations(config: Option<&Config>) -> Vec<(String, String)> {
    let mut all: BTreeMap<String, String> = Operation::NAMES
        .iter()
        .map(|&name| (String::from(name), String::from("built in")))
        .collect();
    if let Some(config) = config {
        let routing = config.routing();
        for name in routing.client_operations() {
            all.entry(name.clone())
                .or_insert_with(|| String::from("routed to clients"));
        }
        for name in routing.goal_operations() {
            all.entry(name.clone())
                .or_insert_with(|| String::from("routed to goals"));
        }
    }
    all.into_iter().collect()
}

pub(crate) fn operation_names(current: &OsStr) -> Vec<CompletionCandidate> {
    let config = Config::read().ok();
    filter_candidates(current, known_operations(config.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(candidates: Vec<CompletionCandidate>) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.get_value().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn exact_then_prefix_then_contains() {
        let candidates = filter_candidates(
            OsStr::new("GetGoal"),
            [
                ("GetGoalsByClient".into(), String::new()),
                ("GetGoal".into(), String::new()),
                ("ForGetGoal".into(), String::new()),
                ("AGetGoalB".into(), String::new()),
                ("GetGoalById".into(), String::new()),
            ],
        );
        assert_eq!(
            values(candidates),
            ["GetGoal", "GetGoalById", "GetGoalsByClient", "AGetGoalB", "ForGetGoal"]
        );
    }

    #[test]
    fn configured_names_are_offered() {
        let config = Config::default();
        let names: Vec<_> = known_operations(Some(&config))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert!(names.contains(&String::from("GetProgress")));
        assert!(names.contains(&String::from("DeleteClient")));
        assert_eq!(known_operations(None).len(), Operation::NAMES.len());
    }
}

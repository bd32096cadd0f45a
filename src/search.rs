//! Search text, sorting and the debounce that sits between typing and searching.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const DEBOUNCE_BUFFER: usize = 16;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(rename = "filter", default, skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl FilterState {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort<S: Into<String>>(mut self, sort_by: S, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.trim().is_empty() || self.sort_by.is_some() || self.sort_order.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Case-insensitive substring match against any of `fields`. An empty search matches
    /// everything.
    pub fn matches<'a, I: IntoIterator<Item = &'a str>>(&self, fields: I) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || fields
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Forwards a value from `input` only once no newer value has arrived for `delay`. Whatever
/// is still pending when `input` closes is forwarded straight away.
pub fn debounce<T: Send + 'static>(
    mut input: mpsc::Receiver<T>,
    delay: Duration,
) -> mpsc::Receiver<T> {
    let (tx, output) = mpsc::channel(DEBOUNCE_BUFFER);
    tokio::spawn(async move {
        let mut pending = None;
        let timer = time::sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                received = input.recv() => match received {
                    Some(value) => {
                        pending = Some(value);
                        timer.as_mut().reset(Instant::now() + delay);
                    }
                    None => break,
                },
                () = &mut timer, if pending.is_some() => {
                    if let Some(value) = pending.take() {
                        if tx.send(value).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
        if let Some(value) = pending {
            let _ = tx.send(value).await;
        }
    });
    output
}

//! A normalized response cache.
//!
//! Entities are stored once, under `Typename:id`, and shallow-merged whenever a response
//! mentions them again. Root query fields are stored per argument combination (the field's
//! *key args*) and hold references to those entities, so an updated client shows up in every
//! list that contains it.
//!
//! Paginated list fields keep one slot per page, tagged with the generation of the request
//! that produced it. The list a reader sees is the pages concatenated in page order:
//!
//! * a first page (or a response without a page argument) replaces the series, dropping every
//!   page that was requested before it;
//! * any later page is appended in its place, unless it was requested before the first page
//!   that last replaced the series;
//! * a response never overwrites a slot written by a newer request.
//!
//! The final state therefore follows the order requests were issued in, not the order their
//! responses happened to arrive in.

use log::trace;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};

/// The arguments paginated list fields are partitioned by.
pub const PAGINATION_KEY_ARGS: [&str; 5] = ["filter", "sortBy", "sortOrder", "page", "limit"];

const REF_KEY: &str = "__ref";
const TYPENAME_KEY: &str = "__typename";

/// Issued when a request starts; orders writes to the same field.
pub type RequestGeneration = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePolicy {
    pub key_fields: Vec<String>,
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self {
            key_fields: vec![String::from("id")],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    #[default]
    Replace,
    Paginated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    /// The entity type the field returns, used to normalize its items.
    pub typename: Option<String>,
    /// Arguments that partition the field. `None` means every argument does.
    pub key_args: Option<Vec<String>>,
    pub merge: MergeStrategy,
}

impl FieldPolicy {
    pub fn entity<S: Into<String>>(typename: S) -> Self {
        Self {
            typename: Some(typename.into()),
            key_args: None,
            merge: MergeStrategy::Replace,
        }
    }

    pub fn paginated<S: Into<String>>(typename: S) -> Self {
        Self {
            typename: Some(typename.into()),
            key_args: Some(PAGINATION_KEY_ARGS.iter().map(|s| String::from(*s)).collect()),
            merge: MergeStrategy::Paginated,
        }
    }

    pub fn with_key_args<I, S>(mut self, key_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_args = Some(key_args.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicies {
    types: HashMap<String, TypePolicy>,
    fields: HashMap<String, FieldPolicy>,
}

impl CachePolicies {
    /// Policies with nothing registered: every field is stored as returned.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    pub fn with_type<S: Into<String>>(mut self, typename: S, policy: TypePolicy) -> Self {
        self.types.insert(typename.into(), policy);
        self
    }

    pub fn with_field<S: Into<String>>(mut self, field: S, policy: FieldPolicy) -> Self {
        self.fields.insert(field.into(), policy);
        self
    }

    #[inline]
    pub fn field(&self, field: &str) -> Option<&FieldPolicy> {
        self.fields.get(field)
    }

    #[inline]
    pub fn type_policy(&self, typename: &str) -> Option<&TypePolicy> {
        self.types.get(typename)
    }
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self::empty()
            .with_type("Client", TypePolicy::default())
            .with_type("Goal", TypePolicy::default())
            .with_field("getAllClients", FieldPolicy::paginated("Client"))
            .with_field("getClient", FieldPolicy::entity("Client"))
            .with_field("getAllGoals", FieldPolicy::paginated("Goal"))
            .with_field("getGoal", FieldPolicy::entity("Goal"))
            .with_field(
                "getGoalsByClient",
                FieldPolicy::entity("Goal").with_key_args(["clientId"]),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FieldKey {
    field: String,
    args: String,
}

#[derive(Debug, Clone)]
struct Slot<V> {
    generation: RequestGeneration,
    value: V,
}

#[derive(Debug, Clone, Default)]
struct PageSeries {
    /// Generation of the first page that last replaced the series.
    reset: RequestGeneration,
    pages: BTreeMap<u64, Slot<Vec<Value>>>,
}

impl PageSeries {
    fn merge(&mut self, page: u64, items: Vec<Value>, generation: RequestGeneration) {
        if generation < self.reset {
            trace!(
                "Dropping page {page} from generation {generation}, series reset at {}",
                self.reset
            );
            return;
        }
        if page <= 1 {
            self.reset = generation;
            self.pages.retain(|_, slot| slot.generation >= generation);
        }
        match self.pages.get(&page) {
            Some(slot) if slot.generation > generation => {}
            _ => {
                self.pages.insert(
                    page,
                    Slot {
                        generation,
                        value: items,
                    },
                );
            }
        }
    }

    fn items(&self) -> impl Iterator<Item = &Value> {
        self.pages.values().flat_map(|slot| slot.value.iter())
    }
}

#[derive(Debug, Clone)]
enum FieldEntry {
    Single(Slot<Value>),
    Pages(PageSeries),
}

#[derive(Debug, Clone, Default)]
pub struct Cache {
    policies: CachePolicies,
    entities: HashMap<String, Map<String, Value>>,
    fields: HashMap<FieldKey, FieldEntry>,
    generation: RequestGeneration,
}

impl Cache {
    pub fn new(policies: CachePolicies) -> Self {
        Self {
            policies,
            ..Default::default()
        }
    }

    #[inline]
    pub fn policies(&self) -> &CachePolicies {
        &self.policies
    }

    /// Call when a request is sent; pass the result to the write of its response.
    pub fn begin_request(&mut self) -> RequestGeneration {
        self.generation += 1;
        self.generation
    }

    /// The cache id of an object, e.g. `Client:42`, if its type has a policy and the object
    /// carries all of the key fields.
    pub fn identify(&self, typename: &str, object: &Map<String, Value>) -> Option<String> {
        let policy = self.policies.type_policy(typename)?;
        let parts = policy
            .key_fields
            .iter()
            .map(|k| object.get(k).and_then(scalar_key))
            .collect::<Option<Vec<_>>>()?;
        Some(format!("{typename}:{}", parts.join(":")))
    }

    pub fn write_field(
        &mut self,
        field: &str,
        args: &Map<String, Value>,
        incoming: Value,
        generation: RequestGeneration,
    ) {
        let policy = self.policies.field(field).cloned();
        let typename = policy.as_ref().and_then(|p| p.typename.as_deref());
        let normalized = self.normalize(incoming, typename);
        let key = field_key(field, args, policy.as_ref());
        let paginated = policy
            .as_ref()
            .is_some_and(|p| p.merge == MergeStrategy::Paginated);
        trace!("Writing {}({}) at generation {generation}", key.field, key.args);
        match normalized {
            Value::Array(items) if paginated => {
                let page = args.get("page").and_then(page_number).unwrap_or(1);
                self.merge_page(key, page, items, generation);
            }
            value => {
                let stale = matches!(
                    self.fields.get(&key),
                    Some(FieldEntry::Single(slot)) if slot.generation > generation
                );
                if !stale {
                    self.fields
                        .insert(key, FieldEntry::Single(Slot { generation, value }));
                }
            }
        }
    }

    fn merge_page(
        &mut self,
        key: FieldKey,
        page: u64,
        items: Vec<Value>,
        generation: RequestGeneration,
    ) {
        let entry = self
            .fields
            .entry(key)
            .or_insert_with(|| FieldEntry::Pages(PageSeries::default()));
        if matches!(*entry, FieldEntry::Single(_)) {
            *entry = FieldEntry::Pages(PageSeries::default());
        }
        if let FieldEntry::Pages(series) = entry {
            series.merge(page, items, generation);
        }
    }

    /// Reads a stored field back out, with entity references resolved. Returns `None` on a
    /// miss, including a single entity that has since been evicted.
    pub fn read_field(&self, field: &str, args: &Map<String, Value>) -> Option<Value> {
        let policy = self.policies.field(field);
        let key = field_key(field, args, policy);
        match self.fields.get(&key)? {
            FieldEntry::Single(slot) => self.resolve(&slot.value),
            FieldEntry::Pages(series) => Some(Value::Array(
                series
                    .items()
                    .filter_map(|item| self.resolve(item))
                    .collect(),
            )),
        }
    }

    /// Normalizes a single object (e.g. a mutation result) into the entity store.
    pub fn write_entity(&mut self, typename: &str, value: Value) -> Option<String> {
        match self.normalize(value, Some(typename)) {
            Value::Object(object) => object
                .get(REF_KEY)
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        }
    }

    pub fn entity(&self, typename: &str, id: i64) -> Option<Value> {
        self.entities
            .get(&format!("{typename}:{id}"))
            .cloned()
            .map(Value::Object)
    }

    /// Drops an entity. Lists that referenced it skip it from now on.
    pub fn evict(&mut self, typename: &str, id: i64) -> bool {
        self.entities.remove(&format!("{typename}:{id}")).is_some()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.fields.clear();
    }

    fn normalize(&mut self, value: Value, typename: Option<&str>) -> Value {
        match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.normalize(item, typename))
                    .collect(),
            ),
            Value::Object(object) => {
                let own_type = object
                    .get(TYPENAME_KEY)
                    .and_then(Value::as_str)
                    .map(String::from);
                let typename = own_type.as_deref().or(typename);
                match typename.and_then(|t| self.identify(t, &object)) {
                    Some(id) => {
                        let stored = self.entities.entry(id.clone()).or_default();
                        // Shallow merge: incoming fields win, fields it lacks are kept.
                        stored.extend(object);
                        json!({ REF_KEY: id })
                    }
                    None => Value::Object(object),
                }
            }
            other => other,
        }
    }

    fn resolve(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Object(object) => match object.get(REF_KEY).and_then(Value::as_str) {
                Some(id) => self.entities.get(id).cloned().map(Value::Object),
                None => Some(value.clone()),
            },
            Value::Array(items) => Some(Value::Array(
                items.iter().filter_map(|i| self.resolve(i)).collect(),
            )),
            other => Some(other.clone()),
        }
    }
}

fn field_key(field: &str, args: &Map<String, Value>, policy: Option<&FieldPolicy>) -> FieldKey {
    // serde_json maps are ordered by key, so this is canonical.
    let selected: Map<String, Value> = match policy.and_then(|p| p.key_args.as_ref()) {
        Some(key_args) => args
            .iter()
            .filter(|(k, v)| key_args.contains(k) && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        None => args.clone(),
    };
    FieldKey {
        field: String::from(field),
        args: Value::Object(selected).to_string(),
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn page_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

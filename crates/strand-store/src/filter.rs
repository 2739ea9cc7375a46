use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;
use strand_types::{Object, ObjectHash, PublicKey};

/// Pseudo-field ordering by object type.
pub const ORDER_BY_TYPE: &str = "type";
/// Pseudo-field ordering by object hash.
pub const ORDER_BY_HASH: &str = "_hash";
/// Pseudo-field ordering by owner key.
pub const ORDER_BY_OWNER: &str = "owner";

/// A single typed filter clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    ByType(String),
    ByHash(ObjectHash),
    ByOwner(PublicKey),
    /// Objects of the stream rooted at this hash, including the root itself.
    ByStream(ObjectHash),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    /// Parse `asc`/`desc` (case-insensitive). Anything else is ascending.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "desc" | "descending" => Self::Descending,
            _ => Self::Ascending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

/// Compiled query: four clause sets plus optional ordering and pagination.
///
/// Clauses of the same kind are OR'ed, kinds are AND'ed. An empty set places
/// no constraint of that kind, so the default `FilterSet` matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub types: BTreeSet<String>,
    pub hashes: BTreeSet<ObjectHash>,
    pub owners: BTreeSet<PublicKey>,
    pub streams: BTreeSet<ObjectHash>,
    pub order: Option<OrderBy>,
    pub page: Option<Page>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause to the set of its kind.
    pub fn push(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::ByType(t) => {
                self.types.insert(t);
            }
            Lookup::ByHash(h) => {
                self.hashes.insert(h);
            }
            Lookup::ByOwner(o) => {
                self.owners.insert(o);
            }
            Lookup::ByStream(s) => {
                self.streams.insert(s);
            }
        }
    }

    pub fn with(mut self, lookup: Lookup) -> Self {
        self.push(lookup);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Paginate. Takes effect only when both values are positive.
    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.page = match (usize::try_from(limit), usize::try_from(offset)) {
            (Ok(limit), Ok(offset)) if limit > 0 && offset > 0 => Some(Page { limit, offset }),
            _ => None,
        };
        self
    }

    /// Returns `true` when no clause constrains the match.
    pub fn is_unconstrained(&self) -> bool {
        self.types.is_empty()
            && self.hashes.is_empty()
            && self.owners.is_empty()
            && self.streams.is_empty()
    }

    /// Evaluate the clauses against an object whose hash is already known.
    pub fn matches(&self, object: &Object, hash: &ObjectHash) -> bool {
        if !self.types.is_empty() && !self.types.contains(object.object_type()) {
            return false;
        }
        if !self.hashes.is_empty() && !self.hashes.contains(hash) {
            return false;
        }
        if !self.owners.is_empty() && !object.owner().is_some_and(|o| self.owners.contains(o)) {
            return false;
        }
        if !self.streams.is_empty() {
            let in_stream = object.stream().is_some_and(|s| self.streams.contains(s));
            if !in_stream && !self.streams.contains(hash) {
                return false;
            }
        }
        true
    }

    /// Apply ordering and pagination to matched rows.
    ///
    /// Sorting is stable, so rows that compare equal keep their input order.
    /// Rows missing the ordering field always sort last.
    pub fn arrange(&self, mut rows: Vec<(ObjectHash, Object)>) -> Vec<Object> {
        if let Some(order) = &self.order {
            rows.sort_by(|(ha, a), (hb, b)| {
                let va = order_key(&order.field, ha, a);
                let vb = order_key(&order.field, hb, b);
                match (va, vb) {
                    (Some(va), Some(vb)) => {
                        let ord = compare_values(&va, &vb);
                        match order.direction {
                            OrderDirection::Ascending => ord,
                            OrderDirection::Descending => ord.reverse(),
                        }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
        }
        let objects = rows.into_iter().map(|(_, object)| object);
        match self.page {
            Some(page) => objects.skip(page.offset).take(page.limit).collect(),
            None => objects.collect(),
        }
    }
}

fn order_key(field: &str, hash: &ObjectHash, object: &Object) -> Option<Value> {
    match field {
        ORDER_BY_TYPE => Some(Value::String(object.object_type().to_string())),
        ORDER_BY_HASH => Some(Value::String(hash.to_string())),
        ORDER_BY_OWNER => object.owner().map(|o| Value::String(o.to_string())),
        other => object.field(other).cloned(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

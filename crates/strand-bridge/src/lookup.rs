//! Lookup query compiler.
//!
//! Turns `prefix:value` clauses into a [`FilterSet`]. This is the only place
//! that looks at clause prefixes; everything downstream works with
//! [`Lookup`] values.

use strand_store::{FilterSet, Lookup, OrderDirection};
use strand_types::{ObjectHash, PublicKey};

use crate::envelope::GetRequest;
use crate::error::{BridgeError, BridgeResult};

pub const PREFIX_TYPE: &str = "type";
pub const PREFIX_HASH: &str = "hash";
pub const PREFIX_OWNER: &str = "owner";
pub const PREFIX_STREAM: &str = "stream";

/// How to treat clauses that cannot be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileMode {
    /// Reject the whole query.
    Strict,
    /// Drop the clause and keep going.
    Tolerant,
}

/// Parse one clause. The value is everything after the first `:`.
pub fn parse_clause(clause: &str) -> Option<Lookup> {
    let (prefix, value) = clause.split_once(':')?;
    let lookup = match prefix {
        PREFIX_TYPE => Lookup::ByType(value.to_string()),
        PREFIX_HASH => Lookup::ByHash(ObjectHash::new(value)),
        PREFIX_OWNER => Lookup::ByOwner(PublicKey::new(value)),
        PREFIX_STREAM => Lookup::ByStream(ObjectHash::new(value)),
        _ => return None,
    };
    Some(lookup)
}

pub fn compile<S: AsRef<str>>(clauses: &[S], mode: CompileMode) -> BridgeResult<FilterSet> {
    let mut filter = FilterSet::new();
    for clause in clauses {
        let clause = clause.as_ref();
        match (parse_clause(clause), mode) {
            (Some(lookup), _) => filter.push(lookup),
            (None, CompileMode::Strict) => {
                return Err(BridgeError::InvalidLookup(clause.to_string()))
            }
            (None, CompileMode::Tolerant) => {}
        }
    }
    Ok(filter)
}

/// Strict-compile a `get` request, including its ordering and pagination.
pub fn compile_request(request: &GetRequest) -> BridgeResult<FilterSet> {
    let mut filter = compile(&request.lookups, CompileMode::Strict)?;
    if !request.order_by.is_empty() {
        filter = filter.order_by(
            request.order_by.clone(),
            OrderDirection::parse(&request.order_dir),
        );
    }
    Ok(filter.paginate(request.limit, request.offset))
}

//! Query parameter parsing shared by the process and measurement endpoints.
//!
//! Processes are selected with `uids=1,2,3` or one or more `match=<text>`
//! parameters (OR-combined). `uids` wins when both are present and no
//! selector means every known process. The window is given by `from`/`to`
//! (RFC 3339) or `fromTag`/`toTag`; the absolute form wins.

use chrono::{DateTime, Utc};
use herakles_load_monitor::{Measurement, TimeBound, Uid};

use crate::handlers::error::ApiError;

/// Raw query pairs in request order. Repeated keys are kept.
pub type QueryPairs = Vec<(String, String)>;

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// How the request selects processes.
#[derive(Debug, PartialEq, Eq)]
pub enum UidSelector {
    Uids(Vec<Uid>),
    Match(Vec<String>),
    All,
}

impl UidSelector {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        if let Some(list) = first(pairs, "uids") {
            return parse_uid_list(list).map(UidSelector::Uids);
        }

        let matches: Vec<String> = pairs
            .iter()
            .filter(|(k, _)| k == "match")
            .map(|(_, v)| v.clone())
            .collect();
        if !matches.is_empty() {
            return Ok(UidSelector::Match(matches));
        }

        Ok(UidSelector::All)
    }

    /// Resolves the selection against the measurement's known processes.
    pub fn resolve(&self, measurement: &Measurement) -> Vec<Uid> {
        match self {
            UidSelector::Uids(uids) => uids.clone(),
            UidSelector::Match(queries) => measurement.matching_uids(queries),
            UidSelector::All => measurement.all_uids(),
        }
    }
}

/// Parses a comma-separated uid list such as `12,42,1234`.
pub fn parse_uid_list(list: &str) -> Result<Vec<Uid>, ApiError> {
    list.split(',')
        .map(|s| {
            s.trim().parse::<Uid>().map_err(|_| {
                ApiError::bad_request(format!(
                    "Invalid parameter uids. UID {} is not a valid integer",
                    s
                ))
            })
        })
        .collect()
}

fn parse_time(name: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ApiError::bad_request(format!("Invalid parameter {} {}. Reason: {}", name, value, e))
        })
}

fn bound(pairs: &[(String, String)], time_key: &str, tag_key: &str) -> Result<TimeBound, ApiError> {
    if let Some(value) = first(pairs, time_key) {
        return parse_time(time_key, value).map(TimeBound::At);
    }
    Ok(match first(pairs, tag_key) {
        Some(tag) => TimeBound::Tag(tag.to_string()),
        None => TimeBound::Unbounded,
    })
}

/// Reads the `(from, to)` bounds of the query window.
pub fn time_bounds(pairs: &[(String, String)]) -> Result<(TimeBound, TimeBound), ApiError> {
    Ok((bound(pairs, "from", "fromTag")?, bound(pairs, "to", "toTag")?))
}

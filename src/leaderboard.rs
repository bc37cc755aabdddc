use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{CastLog, Fid, User};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 100;

/// Per-user activity folded out of cast logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub casts: u64,
    pub languages: BTreeSet<String>,
    pub last_posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub fid: Fid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub total_casts: u64,
    pub total_languages: usize,
    pub last_posted_at: Option<DateTime<Utc>>,
}

pub fn tally(logs: &[CastLog]) -> BTreeMap<Fid, Tally> {
    let mut by_user: BTreeMap<Fid, Tally> = BTreeMap::new();
    for log in logs {
        let t = by_user.entry(log.fid).or_default();
        t.casts += 1;
        if !log.target_lang.is_empty() {
            t.languages.insert(log.target_lang.clone());
        }
        if log.posted_at > t.last_posted_at {
            t.last_posted_at = log.posted_at;
        }
    }
    by_user
}

/// Most casts first, then most languages, then most recent post. Entries
/// without a post time sort after those with one; fid breaks remaining ties.
fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_casts
        .cmp(&a.total_casts)
        .then(b.total_languages.cmp(&a.total_languages))
        .then(b.last_posted_at.cmp(&a.last_posted_at))
        .then(a.fid.cmp(&b.fid))
}

pub fn rank(tallies: BTreeMap<Fid, Tally>, users: &[User], limit: usize) -> Vec<LeaderboardEntry> {
    let users: HashMap<Fid, &User> = users.iter().map(|u| (u.fid, u)).collect();
    let mut rows: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .map(|(fid, t)| {
            let user = users.get(&fid);
            LeaderboardEntry {
                fid,
                username: user.and_then(|u| u.username.clone()),
                display_name: user.and_then(|u| u.display_name.clone()),
                pfp_url: user.and_then(|u| u.pfp_url.clone()),
                total_casts: t.casts,
                total_languages: t.languages.len(),
                last_posted_at: t.last_posted_at,
            }
        })
        .collect();
    rows.sort_by(compare);
    rows.truncate(limit);
    rows
}

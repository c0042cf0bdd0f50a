use crate::model::{Member, MemberIndex, User};
use tracing::debug;

/// Keys the roster by bgg user name. Later entries overwrite earlier ones.
pub fn index_members(members: &[Member]) -> MemberIndex {
    let mut index = MemberIndex::with_capacity(members.len());
    for member in members {
        if let Some(old) = index.insert(member.bgg_username.clone(), member.clone()) {
            debug!(user = %old.bgg_username, "duplicate roster entry, keeping the last one");
        }
    }
    index
}

pub fn lookup<'a>(index: &'a MemberIndex, user: &User) -> Option<&'a Member> {
    index.get(user)
}

/// Display names for a list of user names, `missing` where the roster has no match.
pub fn member_names(index: &MemberIndex, users: &[User], missing: &str) -> Vec<String> {
    users
        .iter()
        .map(|u| match lookup(index, u) {
            Some(m) => m.name.clone(),
            None => missing.to_owned(),
        })
        .collect()
}

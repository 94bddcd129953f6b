//! User and group name resolution

use uzers::{Groups, Users, UsersCache};

/// Lookup service for owner and group names.
pub trait IdLookup {
    fn user_name(&self, uid: u32) -> Option<String>;
    fn group_name(&self, gid: u32) -> Option<String>;
}

/// Resolves ids against the system user and group databases, caching
/// every answer for the rest of the run.
pub struct SystemIds {
    cache: UsersCache,
}

impl SystemIds {
    pub fn new() -> Self {
        Self {
            cache: UsersCache::new(),
        }
    }
}

impl Default for SystemIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdLookup for SystemIds {
    fn user_name(&self, uid: u32) -> Option<String> {
        self.cache
            .get_user_by_uid(uid)
            .map(|user| user.name().to_string_lossy().into_owned())
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        self.cache
            .get_group_by_gid(gid)
            .map(|group| group.name().to_string_lossy().into_owned())
    }
}

/// A lookup that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericIds;

impl IdLookup for NumericIds {
    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }

    fn group_name(&self, _gid: u32) -> Option<String> {
        None
    }
}

/// Owner name, or the numeric uid when lookup fails or `numeric_only` is set.
pub fn resolve_user(ids: &dyn IdLookup, uid: u32, numeric_only: bool) -> String {
    if !numeric_only {
        if let Some(name) = ids.user_name(uid) {
            return name;
        }
    }
    uid.to_string()
}

/// Group name, or the numeric gid when lookup fails or `numeric_only` is set.
pub fn resolve_group(ids: &dyn IdLookup, gid: u32, numeric_only: bool) -> String {
    if !numeric_only {
        if let Some(name) = ids.group_name(gid) {
            return name;
        }
    }
    gid.to_string()
}

use std::fmt;

/// Which backend a [`Cache`](crate::cache::Cache) dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheType {
    Dict,
    SyncRemote,
    AsyncRemote,
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CacheType::Dict => "Dict",
            CacheType::SyncRemote => "SyncRemote",
            CacheType::AsyncRemote => "AsyncRemote",
        };
        write!(f, "{name}")
    }
}

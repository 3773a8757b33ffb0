//! Server managed keys of a custom data bag.

/// Keys the caller may read but never write, in canonical form.
pub const READONLY: [&str; 9] = ["created_at", "href", "ionmeta", "ion_meta", "meta", "modified_at", "spmeta", "sp_meta", "sp_http_status"];

/// Read only keys that are stamps, parsed on ingest and never deletable.
pub const TIMESTAMPS: [&str; 2] = ["created_at", "modified_at"];

/// Leading character reserved for delete references.
pub const RESERVED_PREFIX: char = '-';

pub fn is_readonly(key: &str) -> bool {
    READONLY.contains(&key)
}

pub fn is_timestamp(key: &str) -> bool {
    TIMESTAMPS.contains(&key)
}

pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

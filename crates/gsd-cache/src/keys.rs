//! Redis key and channel naming, all under one namespace prefix.

pub const PREFIX: &str = "serverstf/";

pub const SERVERS_SET: &str = "serverstf/servers";
pub const INTERESTING_LIST: &str = "serverstf/interesting";

pub const SERVER_CHANNEL_PREFIX: &str = "serverstf/channels/servers/";
pub const TAG_CHANNEL_PREFIX: &str = "serverstf/channels/tags/";

pub fn status_hash(addr: &str) -> String {
    format!("{PREFIX}servers/{addr}")
}

pub fn status_tags(addr: &str) -> String {
    format!("{PREFIX}servers/{addr}/tags")
}

pub fn status_interest(addr: &str) -> String {
    format!("{PREFIX}servers/{addr}/interest")
}

pub fn tag_set(tag: &str) -> String {
    format!("{PREFIX}tags/{tag}")
}

pub fn server_channel(addr: &str) -> String {
    format!("{SERVER_CHANNEL_PREFIX}{addr}")
}

pub fn tag_channel(tag: &str) -> String {
    format!("{TAG_CHANNEL_PREFIX}{tag}")
}

pub fn search_temp_key(counter: u64) -> String {
    format!("{PREFIX}tmp/search/{counter}")
}

use gsd_protocol::Address;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Channel {
    Server(Address),
    Tag(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub(crate) channel: Channel,
    pub(crate) addr: Address,
}

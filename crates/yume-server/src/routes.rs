pub(crate) mod docs;
pub(crate) mod dream;
pub(crate) mod error;
pub(crate) mod journal;
pub(crate) mod status;

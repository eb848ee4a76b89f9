pub mod interpretation;
pub mod journal;
pub mod status;

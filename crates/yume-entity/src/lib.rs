pub mod dream;

//! Helpers for integration tests: throwaway databases, seeded events, and fake collaborators.
pub mod fakes;
pub mod prepare_env;
pub mod system;

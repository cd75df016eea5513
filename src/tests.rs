use super::*;

mod ambient_globals;
mod fixture_bundle;
mod tree_mutation;

//! Test harness for CLI integration tests.
//!
//! Provides isolated vaults with their own config file, pre-existing note
//! files, and CLI assertion helpers using `assert_cmd`.

mod command;
mod env;
mod note;

#[allow(unused_imports)]
pub use command::NotevaultCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
#[allow(unused_imports)]
pub use note::TestNote;

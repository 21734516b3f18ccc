//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! mock adapters.  All tests run on the host with no data directory or
//! modem required.

mod mock_env;
mod recovery_tests;

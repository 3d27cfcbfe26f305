//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock GPIO and the virtual-clock timer. All tests run on the
//! host with no real hardware required.

mod mock_hw;
mod relay_tests;

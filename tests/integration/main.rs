//! End-to-end tests through the public crate API.

mod mock_table;
mod scenarios;
mod simulation;

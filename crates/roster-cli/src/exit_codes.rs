//! Process exit codes.
//! Mirrors `RosterError::exit_code` so scripts can branch on the failure class.

pub const SUCCESS: i32 = 0;
pub const NOT_FOUND: i32 = 1; // No record (or no salary) for the requested id
pub const INPUT_ERROR: i32 = 2; // Malformed id or arguments
pub const CONFIG_ERROR: i32 = 3; // Bad configuration or setup failure
pub const STORE_ERROR: i32 = 4; // Local replica unusable
pub const UPSTREAM_ERROR: i32 = 5; // Upstream client could not be built

//! Stable exit codes for orgloop CLI commands.

/// Run reached `Done`, or the command succeeded.
pub const OK: i32 = 0;
/// Bad config, bad arguments, or an infrastructure error.
pub const INVALID: i32 = 1;
/// `orgloop pending` found no pending task.
pub const COMPLETE: i32 = 2;
/// `orgloop run` halted before finishing the checklist.
pub const HALTED: i32 = 3;

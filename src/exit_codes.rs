pub const SUCCESS: i32 = 0;
/// Bad dataset root, unreadable metadata, unknown task.
pub const EXECUTION_ERROR: i32 = 1;
/// Missing dataset root argument.
pub const USAGE_ERROR: i32 = 2;

//! Process exit codes
//!
//! These follow Unix conventions: zero is success, small integers name the
//! failing stage.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - lint findings or a generated schema that does not compile
pub const VALIDATION_ERROR: i32 = 2;

/// Reference resolution failed (missing file, HTTP error, catalog, cycle)
pub const RESOLVE_ERROR: i32 = 3;

/// Bundle error - missing or malformed bundle.yaml
pub const BUNDLE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// A step's backend could not be read or written
pub const PROVISIONER_ERROR: i32 = 6;

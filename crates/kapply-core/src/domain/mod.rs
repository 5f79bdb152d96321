//! Domain model (identity, objects, errors).

pub mod errors;
pub mod identity;
pub mod object;

pub use self::errors::{ApplyError, ErrorKind, StoreOp};
pub use self::identity::{ObjectKey, ResourceKind};
pub use self::object::{Object, ObjectMeta, ResourceVersion, SERVER_METADATA_FIELDS};

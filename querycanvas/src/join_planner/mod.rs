//! Join inference: shortest FK paths, reconciliation with manual joins, and
//! dependency ordering of the final JOIN list.

mod ordering;
mod path;
mod reconcile;

pub use ordering::{join_signature, order_joins, OrderedJoins};
pub use path::find_path;
pub use reconcile::{reconcile_joins, resolve_root, ReconciledJoins};

//! Core type definitions for restpipe.
//!
//! This crate defines the plugin-agnostic types shared by the pipeline,
//! authentication and data manager crates:
//! - `IdentityPart`, one normalized parameter of a logical request
//! - `RequestIdentity`, the ordered composite key used to deduplicate requests
//!
//! Identities are compared structurally. They are a deduplication key and
//! nothing else; never use a fingerprint as a security token.

mod identity;

pub use identity::{IdentityPart, RequestIdentity, identity_of};

/// Builds a [`RequestIdentity`] from a heterogeneous list of values.
///
/// ```
/// use restpipe_types::identity;
///
/// let a = identity!("widgets", "read", 10u32, None::<String>);
/// let b = identity!("widgets", "read", 10u32, None::<String>);
/// assert_eq!(a, b);
/// ```
#[macro_export]
macro_rules! identity {
    ($($value:expr),* $(,)?) => {
        $crate::RequestIdentity::new(vec![$($crate::IdentityPart::from($value)),*])
    };
}

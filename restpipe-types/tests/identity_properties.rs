//! Property-based tests for request identity determinism.

use proptest::prelude::*;
use restpipe_types::{IdentityPart, RequestIdentity};

fn part_strategy() -> impl Strategy<Value = IdentityPart> {
    prop_oneof![
        Just(IdentityPart::Null),
        any::<bool>().prop_map(IdentityPart::from),
        any::<i64>().prop_map(IdentityPart::from),
        any::<u64>().prop_map(IdentityPart::from),
        "[a-z0-9/]{0,12}".prop_map(IdentityPart::from),
    ]
}

fn parts_strategy() -> impl Strategy<Value = Vec<IdentityPart>> {
    prop::collection::vec(part_strategy(), 0..8)
}

proptest! {
    /// Equal inputs always produce equal identities and fingerprints.
    #[test]
    fn identity_is_deterministic(parts in parts_strategy()) {
        let a = RequestIdentity::new(parts.clone());
        let b = RequestIdentity::new(parts);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
        prop_assert_eq!(a, b);
    }

    /// Structural equality and fingerprint equality agree.
    #[test]
    fn fingerprint_tracks_equality(a in parts_strategy(), b in parts_strategy()) {
        let ia = RequestIdentity::new(a);
        let ib = RequestIdentity::new(b);
        prop_assert_eq!(ia == ib, ia.fingerprint() == ib.fingerprint());
    }

    /// Appending a part always changes the identity.
    #[test]
    fn appending_changes_identity(parts in parts_strategy(), extra in part_strategy()) {
        let base = RequestIdentity::new(parts);
        let longer = base.clone().with(extra);
        prop_assert_ne!(base.fingerprint(), longer.fingerprint());
    }
}

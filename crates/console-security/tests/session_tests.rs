//! Session and permission invariants
//!
use console_security::{Identity, Role, SessionStore, Token};
use proptest::prelude::*;

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Viewer),
        Just(Role::Developer),
        Just(Role::Administrator),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Establish(Role, bool),
    Logout,
    Expire,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (role_strategy(), any::<bool>()).prop_map(|(role, blank)| Op::Establish(role, blank)),
        Just(Op::Logout),
        Just(Op::Expire),
    ]
}

fn identity(role: Role) -> Identity {
    Identity::new("USR-100", "Prop User", "prop@mk-multiverse.io", role)
}

proptest! {
    #[test]
    fn prop_permission_is_monotone(active in role_strategy(), required in role_strategy()) {
        let store = SessionStore::with_session(identity(active), Token::new("t").unwrap());
        prop_assert_eq!(store.has_permission(required), required <= active);
    }

    #[test]
    fn prop_no_identity_no_permission(required in role_strategy()) {
        let store = SessionStore::new();
        prop_assert!(!store.has_permission(required));
    }

    #[test]
    fn prop_authenticated_tracks_token(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let store = SessionStore::demo();
        for op in ops {
            match op {
                Op::Establish(role, blank) => {
                    // A blank token is refused up front, so nothing changes.
                    if let Some(token) = Token::new(if blank { " " } else { "tok" }) {
                        store.establish(identity(role), token);
                    }
                }
                Op::Logout => store.logout(),
                Op::Expire => store.expire(),
            }
            prop_assert_eq!(store.is_authenticated(), store.token().is_some());
            prop_assert_eq!(store.token().is_some(), store.user().is_some());
        }
    }
}

#[test]
fn test_logout_then_reads_are_absent() {
    let store = SessionStore::demo();
    store.logout();
    assert!(store.token().is_none());
    assert!(store.user().is_none());
    store.logout();
    assert!(!store.is_authenticated());
}

#[test]
fn test_every_role_satisfies_itself_and_below() {
    for (i, active) in Role::ALL.iter().enumerate() {
        for (j, required) in Role::ALL.iter().enumerate() {
            assert_eq!(active.satisfies(*required), j <= i, "{active} vs {required}");
        }
    }
}

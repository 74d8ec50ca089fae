//! Source and talk-group admission control.

use std::collections::HashSet;

use crate::config::AccessLists;

/// Allow/deny predicates over radio and talk-group identifiers.
///
/// A deny entry always wins; an empty allow list permits everything else.
/// Identifier 0 is never valid.
#[derive(Clone, Debug, Default)]
pub struct AccessControl {
    rid_allow: HashSet<u16>,
    rid_deny: HashSet<u16>,
    tg_allow: HashSet<u16>,
    tg_deny: HashSet<u16>,
}

impl AccessControl {
    /// Build the predicate sets from configured lists.
    pub fn new(lists: &AccessLists) -> AccessControl {
        AccessControl {
            rid_allow: lists.rid_allow.iter().cloned().collect(),
            rid_deny: lists.rid_deny.iter().cloned().collect(),
            tg_allow: lists.tg_allow.iter().cloned().collect(),
            tg_deny: lists.tg_deny.iter().cloned().collect(),
        }
    }

    /// Whether the given radio ID may source (or individually receive) a
    /// call.
    pub fn validate_src_id(&self, id: u16) -> bool {
        id != 0
            && !self.rid_deny.contains(&id)
            && (self.rid_allow.is_empty() || self.rid_allow.contains(&id))
    }

    /// Whether the given talk-group ID may be called.
    pub fn validate_tg_id(&self, id: u16) -> bool {
        id != 0
            && !self.tg_deny.contains(&id)
            && (self.tg_allow.is_empty() || self.tg_allow.contains(&id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lists(
        rid_allow: &[u16],
        rid_deny: &[u16],
        tg_allow: &[u16],
        tg_deny: &[u16],
    ) -> AccessLists {
        AccessLists {
            rid_allow: rid_allow.to_vec(),
            rid_deny: rid_deny.to_vec(),
            tg_allow: tg_allow.to_vec(),
            tg_deny: tg_deny.to_vec(),
        }
    }

    #[test]
    fn test_open_by_default() {
        let acl = AccessControl::new(&AccessLists::default());

        assert!(acl.validate_src_id(1));
        assert!(acl.validate_src_id(65535));
        assert!(acl.validate_tg_id(200));

        // Identifier 0 is reserved.
        assert!(!acl.validate_src_id(0));
        assert!(!acl.validate_tg_id(0));
    }

    #[test]
    fn test_deny_wins() {
        let acl = AccessControl::new(&lists(&[100, 9999], &[9999], &[], &[300]));

        assert!(acl.validate_src_id(100));
        assert!(!acl.validate_src_id(9999));
        assert!(!acl.validate_tg_id(300));
        assert!(acl.validate_tg_id(301));
    }

    #[test]
    fn test_allow_list_closes() {
        let acl = AccessControl::new(&lists(&[100, 101], &[], &[200], &[]));

        assert!(acl.validate_src_id(100));
        assert!(acl.validate_src_id(101));
        assert!(!acl.validate_src_id(102));

        assert!(acl.validate_tg_id(200));
        assert!(!acl.validate_tg_id(201));
    }
}

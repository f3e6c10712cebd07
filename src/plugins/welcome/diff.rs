use indexmap::IndexSet;

use crate::platform::MemberId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub joined: IndexSet<MemberId>,
    pub left: IndexSet<MemberId>,
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// `(current - previous, previous - current)`.
/// Either side missing means the group was never fully seen, so nothing is reported.
pub fn diff(
    previous: Option<&IndexSet<MemberId>>,
    current: Option<&IndexSet<MemberId>>,
) -> MembershipDelta {
    let (Some(previous), Some(current)) = (previous, current) else {
        return MembershipDelta::default();
    };

    MembershipDelta {
        joined: current.difference(previous).cloned().collect(),
        left: previous.difference(current).cloned().collect(),
    }
}

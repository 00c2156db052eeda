//! Group aggregation.
//!
//! Domoticz does not publish a status update for a group when one of its
//! members changes, so the composite status is recomputed here on a fixed
//! interval: all members equal → that status, any disagreement → `Mixed`.

use log::debug;

use super::{Registry, Status};

/// Maximum number of group descriptors.
pub const MAX_GROUPS: usize = 8;
/// Maximum members per group.
pub const MAX_GROUP_MEMBERS: usize = 5;

/// One group: the group device's registry index plus its member indices.
#[derive(Debug, Clone)]
pub struct GroupDef {
    pub device: usize,
    pub members: heapless::Vec<usize, MAX_GROUP_MEMBERS>,
}

/// The static group descriptor table.
pub struct GroupTable {
    groups: heapless::Vec<GroupDef, MAX_GROUPS>,
}

impl GroupTable {
    /// Build from `(group device index, member indices)` pairs.
    pub fn new(defs: &[(usize, &[usize])]) -> Self {
        let mut groups = heapless::Vec::new();
        for (device, members) in defs {
            let mut list = heapless::Vec::new();
            for m in *members {
                if list.push(*m).is_err() {
                    debug_assert!(false, "group {device} exceeds MAX_GROUP_MEMBERS");
                    break;
                }
            }
            if groups
                .push(GroupDef {
                    device: *device,
                    members: list,
                })
                .is_err()
            {
                debug_assert!(false, "group table exceeds MAX_GROUPS");
                break;
            }
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Recompute every group's aggregate status from its members.
    ///
    /// The first member's status seeds the aggregate; the instant any other
    /// member differs the aggregate becomes `Mixed`.  The registry is only
    /// written when the aggregate differs from the stored value, and the
    /// indices of the groups that actually changed are returned so the
    /// caller can refresh the display when one of them is shown.
    pub fn recompute(&self, reg: &mut Registry) -> heapless::Vec<usize, MAX_GROUPS> {
        let mut changed = heapless::Vec::new();
        for group in &self.groups {
            let mut members = group.members.iter();
            let Some(first) = members.next() else {
                continue;
            };
            let Some(seed) = reg.get(*first).map(super::Device::status) else {
                continue;
            };
            let mut agg = seed;
            for m in members {
                if reg.get(*m).map(super::Device::status) != Some(agg) {
                    agg = Status::Mixed;
                    break;
                }
            }
            let Some(dev) = reg.get(group.device) else {
                continue;
            };
            if dev.status() != agg {
                let aux = dev.aux();
                let name = dev.name();
                reg.set_status(group.device, agg, aux);
                debug!("group '{}' status -> {}", name, agg.label());
                // Capacity matches the table, push cannot fail.
                let _ = changed.push(group.device);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, DeviceKind, Zone};

    fn registry() -> Registry {
        Registry::new(&[
            Device::new(Status::Off, 1, DeviceKind::Toggle, Zone::Basement, "a"),
            Device::new(Status::Off, 2, DeviceKind::Toggle, Zone::Basement, "b"),
            Device::new(Status::Off, 3, DeviceKind::Toggle, Zone::Basement, "c"),
            Device::new(Status::None, 9, DeviceKind::Group, Zone::Basement, "g1"),
            Device::new(Status::None, 10, DeviceKind::Group, Zone::Basement, "g2"),
        ])
    }

    fn table() -> GroupTable {
        GroupTable::new(&[(3, &[0, 1]), (4, &[0, 1, 2])])
    }

    #[test]
    fn uniform_members_propagate_their_status() {
        let mut reg = registry();
        let groups = table();
        let changed = groups.recompute(&mut reg);
        assert_eq!(reg.get(3).unwrap().status(), Status::Off);
        assert_eq!(reg.get(4).unwrap().status(), Status::Off);
        assert_eq!(changed.as_slice(), &[3, 4]);
    }

    #[test]
    fn one_disagreeing_member_yields_mixed() {
        let mut reg = registry();
        let groups = table();
        reg.set_status(1, Status::On, 0);
        groups.recompute(&mut reg);
        assert_eq!(reg.get(3).unwrap().status(), Status::Mixed);
        assert_eq!(reg.get(4).unwrap().status(), Status::Mixed);
    }

    #[test]
    fn unchanged_groups_are_not_reported() {
        let mut reg = registry();
        let groups = table();
        groups.recompute(&mut reg);
        // Second pass with nothing new: no changes reported.
        let changed = groups.recompute(&mut reg);
        assert!(changed.is_empty());
    }

    #[test]
    fn change_set_is_exact() {
        let mut reg = registry();
        let groups = table();
        groups.recompute(&mut reg);
        // Member 2 belongs to g2 only.
        reg.set_status(2, Status::On, 0);
        let changed = groups.recompute(&mut reg);
        assert_eq!(changed.as_slice(), &[4]);
        assert_eq!(reg.get(3).unwrap().status(), Status::Off);
        assert_eq!(reg.get(4).unwrap().status(), Status::Mixed);
    }
}

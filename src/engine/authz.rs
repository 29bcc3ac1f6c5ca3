//! Edit rights.
//!
//! One predicate decides whether a caller may touch a company's trips or
//! resources. Every mutating operation and every visibility filter goes
//! through [`EditScope::can_edit_company`], so the rule cannot drift
//! between call sites.
//!
//! # Rule
//! A company is editable iff it is one of the caller's companies, or the
//! extended view is active and it shares a group-view group with one of the
//! caller's companies.

use std::collections::BTreeSet;

use crate::error::{BoardError, Result};
use crate::models::{CompanyId, Resource, Trip};

/// Groups of affiliated companies that may see each other's boards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupView {
    groups: Vec<BTreeSet<CompanyId>>,
}

impl GroupView {
    /// Creates an empty group view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group of affiliated companies.
    pub fn with_group(mut self, companies: impl IntoIterator<Item = CompanyId>) -> Self {
        self.groups.push(companies.into_iter().collect());
        self
    }

    /// Whether two companies are in a common group.
    pub fn shares_group(&self, a: CompanyId, b: CompanyId) -> bool {
        self.groups.iter().any(|g| g.contains(&a) && g.contains(&b))
    }

    /// Every company sharing a group with `company`.
    pub fn affiliates(&self, company: CompanyId) -> BTreeSet<CompanyId> {
        self.groups
            .iter()
            .filter(|g| g.contains(&company))
            .flat_map(|g| g.iter().copied())
            .collect()
    }
}

/// Who is calling, and whether the extended view is active.
///
/// Passed explicitly to every gate and query; there is no ambient flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScope {
    caller_company_ids: BTreeSet<CompanyId>,
    group_view: GroupView,
    extended_view: bool,
}

impl EditScope {
    /// Scope for a caller acting for the given companies.
    pub fn new(caller_company_ids: impl IntoIterator<Item = CompanyId>) -> Self {
        Self {
            caller_company_ids: caller_company_ids.into_iter().collect(),
            group_view: GroupView::default(),
            extended_view: false,
        }
    }

    /// Sets the caller's group view.
    pub fn with_group_view(mut self, group_view: GroupView) -> Self {
        self.group_view = group_view;
        self
    }

    /// Turns the extended view on or off.
    pub fn with_extended_view(mut self, active: bool) -> Self {
        self.extended_view = active;
        self
    }

    /// Whether the extended view is active.
    pub fn extended_view(&self) -> bool {
        self.extended_view
    }

    /// Caller's own companies.
    pub fn caller_company_ids(&self) -> &BTreeSet<CompanyId> {
        &self.caller_company_ids
    }

    /// The single authorization predicate.
    pub fn can_edit_company(&self, company_id: CompanyId) -> bool {
        if self.caller_company_ids.contains(&company_id) {
            return true;
        }
        self.extended_view
            && self
                .caller_company_ids
                .iter()
                .any(|own| self.group_view.shares_group(*own, company_id))
    }

    /// Companies whose trips and resources the caller currently sees.
    pub fn visible_company_ids(&self) -> BTreeSet<CompanyId> {
        let mut ids = self.caller_company_ids.clone();
        if self.extended_view {
            for own in &self.caller_company_ids {
                ids.extend(self.group_view.affiliates(*own));
            }
        }
        ids
    }

    pub(crate) fn ensure_trip(&self, trip: &Trip) -> Result<()> {
        if can_edit(trip, self) {
            Ok(())
        } else {
            Err(BoardError::Authorization {
                entity: "trip",
                uid: trip.uid.clone(),
                company_id: trip.carrier_company_id,
            })
        }
    }

    pub(crate) fn ensure_resource(&self, resource: &Resource) -> Result<()> {
        if self.can_edit_company(resource.owner_company_id) {
            Ok(())
        } else {
            Err(BoardError::Authorization {
                entity: resource.kind.as_str(),
                uid: resource.uid.clone(),
                company_id: resource.owner_company_id,
            })
        }
    }
}

/// Whether the caller may edit a trip.
pub fn can_edit(trip: &Trip, scope: &EditScope) -> bool {
    scope.can_edit_company(trip.carrier_company_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::trip_between;

    fn group() -> GroupView {
        GroupView::new().with_group([1, 2, 3]).with_group([7, 8])
    }

    #[test]
    fn test_owner_can_always_edit() {
        let trip = trip_between("T1", 9, 10); // company 1
        for extended in [false, true] {
            let scope = EditScope::new([1])
                .with_group_view(group())
                .with_extended_view(extended);
            assert!(can_edit(&trip, &scope));
        }
        // Even without any group view configured
        assert!(can_edit(&trip, &EditScope::new([1])));
    }

    #[test]
    fn test_group_company_needs_extended_view() {
        let mut trip = trip_between("T1", 9, 10);
        trip.carrier_company_id = 2;

        let plain = EditScope::new([1]).with_group_view(group());
        assert!(!can_edit(&trip, &plain));

        let extended = plain.with_extended_view(true);
        assert!(can_edit(&trip, &extended));
    }

    #[test]
    fn test_foreign_group_never_editable() {
        let mut trip = trip_between("T1", 9, 10);
        trip.carrier_company_id = 7;
        let scope = EditScope::new([1])
            .with_group_view(group())
            .with_extended_view(true);
        assert!(!can_edit(&trip, &scope));
    }

    #[test]
    fn test_visible_companies() {
        let scope = EditScope::new([1]).with_group_view(group());
        assert_eq!(scope.visible_company_ids(), BTreeSet::from([1]));
        let scope = scope.with_extended_view(true);
        assert_eq!(scope.visible_company_ids(), BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_ensure_resource_reports_owner() {
        let scope = EditScope::new([1]);
        let err = scope
            .ensure_resource(&Resource::trailer("TR9", 8))
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::Authorization {
                entity: "trailer",
                uid: "TR9".into(),
                company_id: 8,
            }
        );
    }
}

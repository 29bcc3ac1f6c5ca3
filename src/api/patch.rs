//! Tri-state assignment patch.
//!
//! The backend distinguishes "clear this slot" (`null`) from "leave this
//! slot alone" (field absent). `Patch<T>` keeps that distinction through
//! serialization: `Unchanged` fields are skipped, `Clear` is written as
//! `null`, `Set(v)` as `v`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{ResourceAssignment, ResourceKind};

/// Change to a single optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field absent on the wire.
    #[default]
    Unchanged,
    /// Field sent as `null`.
    Clear,
    /// Field sent with a value.
    Set(T),
}

impl<T> Patch<T> {
    /// Whether the field is left alone.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Applies the patch to a current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::Clear => None,
            Self::Set(v) => Some(v),
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Skipped by `skip_serializing_if`; serialize as null if reached anyway
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
            Self::Set(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the field is present; absence goes through `default`
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => Self::Clear,
            Some(v) => Self::Set(v),
        })
    }
}

/// Body of `patchTripAssignment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub trucker: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub vehicle: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub trailer: Patch<String>,
}

impl AssignmentPatch {
    /// Patch binding one kind.
    pub fn set(kind: ResourceKind, resource_uid: impl Into<String>) -> Self {
        let mut patch = Self::default();
        *patch.slot_mut(kind) = Patch::Set(resource_uid.into());
        patch
    }

    /// Patch clearing one kind.
    pub fn clear(kind: ResourceKind) -> Self {
        let mut patch = Self::default();
        *patch.slot_mut(kind) = Patch::Clear;
        patch
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.trucker.is_unchanged() && self.vehicle.is_unchanged() && self.trailer.is_unchanged()
    }

    /// Result of applying the patch to current bindings.
    pub fn apply_to(&self, current: &ResourceAssignment) -> ResourceAssignment {
        ResourceAssignment {
            trucker: self.trucker.clone().apply(current.trucker.clone()),
            vehicle: self.vehicle.clone().apply(current.vehicle.clone()),
            trailer: self.trailer.clone().apply(current.trailer.clone()),
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Patch<String> {
        match kind {
            ResourceKind::Trucker => &mut self.trucker,
            ResourceKind::Vehicle => &mut self.vehicle,
            ResourceKind::Trailer => &mut self.trailer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_encoding_distinguishes_null_and_absent() {
        let patch = AssignmentPatch {
            trucker: Patch::Set("X".into()),
            vehicle: Patch::Clear,
            trailer: Patch::Unchanged,
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({"trucker": "X", "vehicle": null}));
        assert!(value.get("trailer").is_none());
    }

    #[test]
    fn test_decoding_keeps_distinction() {
        let patch: AssignmentPatch = serde_json::from_str(r#"{"vehicle": null}"#).unwrap();
        assert_eq!(patch.vehicle, Patch::Clear);
        assert_eq!(patch.trucker, Patch::Unchanged);
        assert_eq!(patch.trailer, Patch::Unchanged);
    }

    #[test]
    fn test_apply_to_current() {
        let current = ResourceAssignment::new()
            .with(ResourceKind::Trucker, "X")
            .with(ResourceKind::Trailer, "TR1");
        let next = AssignmentPatch::clear(ResourceKind::Trucker).apply_to(&current);
        assert_eq!(next.trucker, None);
        assert_eq!(next.trailer.as_deref(), Some("TR1"));

        let next = AssignmentPatch::set(ResourceKind::Vehicle, "V1").apply_to(&current);
        assert_eq!(next.vehicle.as_deref(), Some("V1"));
        assert_eq!(next.trucker.as_deref(), Some("X"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(AssignmentPatch::default().is_empty());
        assert_eq!(serde_json::to_string(&AssignmentPatch::default()).unwrap(), "{}");
        assert!(!AssignmentPatch::clear(ResourceKind::Trailer).is_empty());
    }
}

//! In-memory geofence registry.
//!
//! Regions live only in process memory for the lifetime of the owning
//! service. Iteration order is insertion order; replacing a region by id
//! keeps its original slot.

use crate::error::{GeoError, Result};
use crate::types::{is_valid_latitude, is_valid_longitude, GeofenceRegion};

/// Maximum length of a region identifier, in characters.
pub const MAX_REGION_ID_LENGTH: usize = 256;

/// Returns `true` if `id` is usable as a region identifier.
///
/// Any non-empty string up to [`MAX_REGION_ID_LENGTH`] characters is
/// accepted.
#[must_use]
pub fn is_valid_region_id(id: &str) -> bool {
    !id.is_empty() && id.chars().count() <= MAX_REGION_ID_LENGTH
}

/// Check a region before it enters the registry.
///
/// # Errors
///
/// Returns [`GeoError::InvalidRegion`] naming the first offending field.
pub fn validate_region(region: &GeofenceRegion) -> Result<()> {
    if !is_valid_region_id(&region.id) {
        return Err(invalid(
            "id",
            format!("must be 1-{MAX_REGION_ID_LENGTH} characters"),
        ));
    }
    if !is_valid_latitude(region.latitude) {
        return Err(invalid("latitude", "must be between -90 and 90 degrees"));
    }
    if !is_valid_longitude(region.longitude) {
        return Err(invalid("longitude", "must be between -180 and 180 degrees"));
    }
    if !region.radius.is_finite() || region.radius <= 0.0 {
        return Err(invalid("radius", "must be a positive number of meters"));
    }
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> GeoError {
    GeoError::InvalidRegion {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Ordered set of circular regions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct GeofenceRegistry {
    regions: Vec<GeofenceRegion>,
}

impl GeofenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Insert a region, replacing any region with the same id.
    ///
    /// Returns the region that was replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidRegion`] if the region fails validation; the
    /// registry is left untouched in that case.
    pub fn add(&mut self, region: GeofenceRegion) -> Result<Option<GeofenceRegion>> {
        validate_region(&region)?;

        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(slot) => Ok(Some(std::mem::replace(slot, region))),
            None => {
                self.regions.push(region);
                Ok(None)
            }
        }
    }

    /// Remove the region with `id`, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<GeofenceRegion> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(index))
    }

    /// Remove every region.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// An owned snapshot of the current regions.
    #[must_use]
    pub fn list(&self) -> Vec<GeofenceRegion> {
        self.regions.clone()
    }

    /// Look up a region by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GeofenceRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Borrow the regions in iteration order.
    #[must_use]
    pub fn as_slice(&self) -> &[GeofenceRegion] {
        &self.regions
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str, radius: f64) -> GeofenceRegion {
        GeofenceRegion::new(id, 37.7749, -122.4194, radius)
    }

    #[test]
    fn test_add_then_remove_is_empty() {
        let mut registry = GeofenceRegistry::new();
        registry.add(region("home", 100.0)).unwrap();
        assert_eq!(registry.remove("home").map(|r| r.id), Some("home".into()));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_add_same_id_replaces() {
        let mut registry = GeofenceRegistry::new();
        assert!(registry.add(region("home", 100.0)).unwrap().is_none());
        let replaced = registry.add(region("home", 250.0)).unwrap();

        assert_eq!(replaced.map(|r| r.radius), Some(100.0));
        let regions = registry.list();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].radius, 250.0);
    }

    #[test]
    fn test_replace_keeps_iteration_slot() {
        let mut registry = GeofenceRegistry::new();
        for id in ["a", "b", "c"] {
            registry.add(region(id, 10.0)).unwrap();
        }
        registry.add(region("a", 99.0)).unwrap();

        let ids: Vec<String> = registry.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(registry.get("a").map(|r| r.radius), Some(99.0));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut registry = GeofenceRegistry::new();
        registry.add(region("home", 100.0)).unwrap();
        assert!(registry.remove("office").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut registry = GeofenceRegistry::new();
        registry.add(region("a", 10.0)).unwrap();
        registry.add(region("b", 10.0)).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut registry = GeofenceRegistry::new();
        registry.add(region("home", 100.0)).unwrap();

        let mut snapshot = registry.list();
        snapshot[0].radius = 1.0;
        snapshot.clear();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("home").map(|r| r.radius), Some(100.0));
    }

    #[test]
    fn test_rejects_invalid_regions() {
        let mut registry = GeofenceRegistry::new();

        for bad in [
            region("", 10.0),
            region(&"x".repeat(MAX_REGION_ID_LENGTH + 1), 10.0),
            region("home", 0.0),
            region("home", -5.0),
            region("home", f64::INFINITY),
            GeofenceRegion::new("home", 91.0, 0.0, 10.0),
            GeofenceRegion::new("home", 0.0, 181.0, 10.0),
            GeofenceRegion::new("home", f64::NAN, 0.0, 10.0),
        ] {
            let err = registry.add(bad).unwrap_err();
            assert!(matches!(err, GeoError::InvalidRegion { .. }));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_region_id_rules() {
        assert!(is_valid_region_id("home"));
        assert!(is_valid_region_id("venue:1234-a_b.c"));
        assert!(is_valid_region_id("Mom's house"));
        assert!(is_valid_region_id("café"));
        assert!(is_valid_region_id("a/b"));
        assert!(is_valid_region_id(&"é".repeat(MAX_REGION_ID_LENGTH)));
        assert!(!is_valid_region_id(""));
        assert!(!is_valid_region_id(&"x".repeat(MAX_REGION_ID_LENGTH + 1)));
    }
}

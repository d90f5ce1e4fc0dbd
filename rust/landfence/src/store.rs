//! # Field Store
//!
//! In-memory parcel storage with a spatial index for map queries.
//!
//! ## Architecture
//!
//! [`FieldStore`] is the CRUD seam hosts implement over their own persistence.
//! [`MemoryFieldStore`] is the bundled implementation and additionally keeps:
//! - An R-tree over field bounding boxes, rebuilt lazily after mutations
//! - Viewport and radius queries for map rendering
//! - Point hit testing (which field was tapped)
//!
//! A process-wide instance is available through [`with_field_store`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use log::{debug, info};
use once_cell::sync::Lazy;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

use crate::error::{LandfenceError, OptionExt, Result};
use crate::field::{Field, MIN_RING_POINTS};
use crate::geo_utils::{area_of_ring, ring_contains};
use crate::{Bounds, GeoPoint};

// ============================================================================
// Store Trait
// ============================================================================

/// CRUD operations over parcels.
pub trait FieldStore {
    /// Insert a new field. Assigns an id when empty and computes the area when
    /// none is supplied.
    fn create_field(&mut self, field: Field) -> Result<Field>;

    fn get_field(&self, id: &str) -> Option<Field>;

    /// Replace an existing field, keeping its creation time.
    fn update_field(&mut self, field: Field) -> Result<Field>;

    /// Remove a field and return it.
    fn delete_field(&mut self, id: &str) -> Result<Field>;

    /// All fields, oldest first.
    fn list_fields(&self) -> Vec<Field>;
}

// ============================================================================
// Spatial Index Types
// ============================================================================

/// Bounds wrapper for R-tree spatial indexing
#[derive(Debug, Clone)]
pub struct FieldBounds {
    pub field_id: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RTreeObject for FieldBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// Store statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub field_count: u32,
    pub indexed_count: u32,
    /// Acres
    pub total_area: f64,
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory [`FieldStore`] with an R-tree over field bounds.
pub struct MemoryFieldStore {
    fields: HashMap<String, Field>,

    // Spatial index for viewport queries
    spatial_index: RTree<FieldBounds>,
    spatial_dirty: bool,

    next_id: u64,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            spatial_index: RTree::new(),
            spatial_dirty: false,
            next_id: 1,
        }
    }

    /// Load a batch of fields, e.g. from a saved snapshot.
    ///
    /// Returns the number of fields stored. Invalid or duplicate fields are
    /// skipped and logged.
    pub fn load_fields(&mut self, fields: Vec<Field>) -> usize {
        let total = fields.len();
        let mut loaded = 0;
        for field in fields {
            match self.create_field(field) {
                Ok(_) => loaded += 1,
                Err(e) => debug!("[FieldStore] Skipping field: {}", e),
            }
        }
        info!("[FieldStore] Loaded {}/{} fields", loaded, total);
        loaded
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Clear all fields and reset state.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.spatial_index = RTree::new();
        self.spatial_dirty = false;
    }

    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("field-{}", self.next_id);
            self.next_id += 1;
            if !self.fields.contains_key(&id) {
                return id;
            }
        }
    }

    // ========================================================================
    // Spatial Queries
    // ========================================================================

    /// Ensure spatial index is built.
    fn ensure_spatial_index(&mut self) {
        if !self.spatial_dirty {
            return;
        }

        let bounds: Vec<FieldBounds> = self
            .fields
            .values()
            .filter_map(|f| {
                f.bounds().map(|b| FieldBounds {
                    field_id: f.id.clone(),
                    min_lat: b.min_lat,
                    max_lat: b.max_lat,
                    min_lng: b.min_lng,
                    max_lng: b.max_lng,
                })
            })
            .collect();

        debug!("[FieldStore] Rebuilt spatial index ({} fields)", bounds.len());
        self.spatial_index = RTree::bulk_load(bounds);
        self.spatial_dirty = false;
    }

    /// Ids of fields whose bounds intersect the viewport, sorted.
    pub fn query_viewport(&mut self, bounds: &Bounds) -> Vec<String> {
        self.ensure_spatial_index();

        let search_bounds = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );

        let mut ids: Vec<String> = self
            .spatial_index
            .locate_in_envelope_intersecting(&search_bounds)
            .map(|b| b.field_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Find fields near a point.
    pub fn find_nearby(&mut self, lat: f64, lng: f64, radius_degrees: f64) -> Vec<String> {
        self.query_viewport(&Bounds {
            min_lat: lat - radius_degrees,
            max_lat: lat + radius_degrees,
            min_lng: lng - radius_degrees,
            max_lng: lng + radius_degrees,
        })
    }

    /// The field whose boundary contains `point`.
    ///
    /// When boundaries overlap, the smallest containing field wins.
    pub fn field_at(&mut self, point: &GeoPoint) -> Option<String> {
        self.ensure_spatial_index();

        let probe = AABB::from_point([point.longitude, point.latitude]);
        self.spatial_index
            .locate_in_envelope_intersecting(&probe)
            .filter_map(|b| self.fields.get(&b.field_id))
            .filter(|f| ring_contains(&f.coordinates, point))
            .min_by(|a, b| {
                a.area_acres()
                    .total_cmp(&b.area_acres())
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|f| f.id.clone())
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn stats(&mut self) -> StoreStats {
        self.ensure_spatial_index();
        StoreStats {
            field_count: self.fields.len() as u32,
            indexed_count: self.spatial_index.size() as u32,
            total_area: self.fields.values().map(Field::area_acres).sum(),
        }
    }
}

impl Default for MemoryFieldStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Ring validation and area fill shared by create and update.
fn prepare_field(mut field: Field) -> Result<Field> {
    if field.coordinates.len() < MIN_RING_POINTS {
        return Err(LandfenceError::InsufficientPoints {
            field_id: field.id,
            point_count: field.coordinates.len(),
            minimum_required: MIN_RING_POINTS,
        });
    }
    if !field.area.is_some_and(f64::is_finite) {
        field.area = Some(area_of_ring(&field.coordinates));
    }
    Ok(field)
}

impl FieldStore for MemoryFieldStore {
    fn create_field(&mut self, field: Field) -> Result<Field> {
        let mut field = prepare_field(field)?;

        if field.id.is_empty() {
            field.id = self.generate_id();
        } else if self.fields.contains_key(&field.id) {
            return Err(LandfenceError::DuplicateField { field_id: field.id });
        }

        let now = chrono::Utc::now().to_rfc3339();
        if field.created_at.is_empty() {
            field.created_at = now.clone();
        }
        if field.updated_at.is_empty() {
            field.updated_at = now;
        }

        info!(
            "[FieldStore] Created field '{}' ({:.2} acres, {})",
            field.id,
            field.area_acres(),
            field.status
        );
        self.fields.insert(field.id.clone(), field.clone());
        self.spatial_dirty = true;
        Ok(field)
    }

    fn get_field(&self, id: &str) -> Option<Field> {
        self.fields.get(id).cloned()
    }

    fn update_field(&mut self, field: Field) -> Result<Field> {
        let created_at = self
            .fields
            .get(&field.id)
            .map(|existing| existing.created_at.clone())
            .ok_or_field_not_found(&field.id)?;

        let mut field = prepare_field(field)?;
        field.created_at = created_at;
        field.updated_at = chrono::Utc::now().to_rfc3339();

        debug!("[FieldStore] Updated field '{}'", field.id);
        self.fields.insert(field.id.clone(), field.clone());
        self.spatial_dirty = true;
        Ok(field)
    }

    fn delete_field(&mut self, id: &str) -> Result<Field> {
        let removed = self.fields.remove(id).ok_or_field_not_found(id)?;
        info!("[FieldStore] Deleted field '{}'", id);
        self.spatial_dirty = true;
        Ok(removed)
    }

    fn list_fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = self.fields.values().cloned().collect();
        fields.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        fields
    }
}

// ============================================================================
// Global Singleton
// ============================================================================

/// Global field store instance.
pub static FIELD_STORE: Lazy<Mutex<MemoryFieldStore>> = Lazy::new(|| Mutex::new(MemoryFieldStore::new()));

/// Get a lock on the global field store.
///
/// A panic inside a previous closure does not poison the store for later callers.
pub fn with_field_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut MemoryFieldStore) -> R,
{
    let mut store = FIELD_STORE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut store)
}

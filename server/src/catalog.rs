//! Facility catalog.
//!
//! The catalog is the external-collaborator boundary for facility lookup:
//! the binary seeds it once at startup and the core only reads from it.

use std::collections::HashMap;

use bookwire_protocol::Facility;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct FacilityCatalog {
    facilities: RwLock<HashMap<i32, Facility>>,
}

impl FacilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, facility: Facility) {
        self.facilities.write().await.insert(facility.id, facility);
    }

    pub async fn remove(&self, facility_id: i32) -> Option<Facility> {
        self.facilities.write().await.remove(&facility_id)
    }

    pub async fn exists(&self, facility_id: i32) -> bool {
        self.facilities.read().await.contains_key(&facility_id)
    }

    pub async fn get(&self, facility_id: i32) -> Option<Facility> {
        self.facilities.read().await.get(&facility_id).cloned()
    }

    /// All facilities, ordered by id for a stable listing.
    pub async fn list(&self) -> Vec<Facility> {
        let mut facilities: Vec<_> = self.facilities.read().await.values().cloned().collect();
        facilities.sort_by_key(|facility| facility.id);
        facilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwire_protocol::FacilityType;

    #[tokio::test]
    async fn insert_lookup_list() {
        let catalog = FacilityCatalog::new();
        catalog
            .insert(Facility::new(2, "Pod B", FacilityType::StudyPod))
            .await;
        catalog
            .insert(Facility::new(1, "Pod A", FacilityType::StudyPod))
            .await;

        assert!(catalog.exists(1).await);
        assert!(!catalog.exists(3).await);
        assert_eq!(catalog.get(2).await.unwrap().name, "Pod B");

        let listed = catalog.list().await;
        assert_eq!(
            listed.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}

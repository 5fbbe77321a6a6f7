use super::schema::Database;
use super::types::StorageError;

/// Storage key of the active city slot.
pub const SELECTED_CITY_KEY: &str = "selectedCity";

impl Database {
    // ========================================================================
    // Selected City
    // ========================================================================

    /// Load the persisted city selection.
    ///
    /// Returns `None` if no city was ever selected, the stored value is
    /// blank, or the read fails (logged).
    pub async fn load_selected_city(&self) -> Option<String> {
        match self.get_value(SELECTED_CITY_KEY).await {
            Ok(Some(city)) if !city.trim().is_empty() => Some(city),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load selected city");
                None
            }
        }
    }

    /// Persist `city` as the active city.
    pub async fn save_selected_city(&self, city: &str) -> Result<(), StorageError> {
        self.put_value(SELECTED_CITY_KEY, city).await
    }
}

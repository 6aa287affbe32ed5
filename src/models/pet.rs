use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    /// Empty until a photo upload has succeeded.
    pub image_url: String,
}

impl Pet {
    pub fn has_photo(&self) -> bool {
        !self.image_url.is_empty()
    }
}

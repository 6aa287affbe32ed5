//! Owner-scoped pet list: load, create (with photo), rename, delete.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::records::{fields, new_pet_record, pet_from_document, pet_update_record};
use crate::backend::{BackendError, Filter};
use crate::config::{APP_NAME, PETS_COLLECTION, PET_IMAGES_PREFIX};
use crate::core_state::{Backend, CoreError};
use crate::models::Pet;

const DEFAULT_PHOTO_EXTENSION: &str = "jpg";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PetValidationError {
    #[error("Pet name cannot be empty.")]
    EmptyName,
    #[error("Pet type cannot be empty.")]
    EmptySpecies,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDraft {
    pub name: String,
    pub species: String,
}

/// Raw photo picked for a new pet.
#[derive(Debug, Clone)]
pub struct PetPhoto {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `png`. Falls back to `jpg`.
    pub extension: Option<String>,
}

impl PetPhoto {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            extension: None,
        }
    }

    /// `pet_images/<uuid>.<ext>`
    fn blob_path(&self) -> String {
        let extension = self
            .extension
            .as_deref()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| DEFAULT_PHOTO_EXTENSION.to_string());
        format!("{PET_IMAGES_PREFIX}/{}.{extension}", Uuid::new_v4())
    }
}

/// Trimmed name and species, both required.
pub fn validate_pet(draft: &PetDraft) -> Result<(String, String), PetValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(PetValidationError::EmptyName);
    }
    let species = draft.species.trim();
    if species.is_empty() {
        return Err(PetValidationError::EmptySpecies);
    }
    Ok((name.to_string(), species.to_string()))
}

pub struct PetRoster {
    backend: Backend,
    owner_id: String,
    pets: Vec<Pet>,
}

impl PetRoster {
    pub fn new(backend: Backend, owner_id: String) -> Self {
        Self {
            backend,
            owner_id,
            pets: Vec::new(),
        }
    }

    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    pub fn find(&self, id: &str) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == id)
    }

    /// Replace the held list with the owner's pets. On failure the previous list stays.
    pub async fn load(&mut self) -> Result<usize, BackendError> {
        let documents = self
            .backend
            .store
            .query(
                PETS_COLLECTION,
                &[Filter::equals(fields::OWNER_ID, self.owner_id.as_str())],
            )
            .await?;

        let mut pets = Vec::with_capacity(documents.len());
        for doc in &documents {
            match pet_from_document(doc) {
                Ok(pet) => pets.push(pet),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable pet"),
            }
        }
        self.pets = pets;
        Ok(self.pets.len())
    }

    /// Validate, upload the photo, insert, notify, reload. Returns the new pet id.
    pub async fn create(&mut self, draft: &PetDraft, photo: Option<PetPhoto>) -> Result<String, CoreError> {
        let (name, species) = validate_pet(draft)?;

        let image_url = match photo {
            Some(photo) => {
                let path = photo.blob_path();
                self.backend.blobs.upload(&path, photo.bytes).await?;
                self.backend.blobs.download_url(&path).await?
            }
            None => String::new(),
        };

        let id = self
            .backend
            .store
            .insert(
                PETS_COLLECTION,
                new_pet_record(&self.owner_id, &name, &species, &image_url),
            )
            .await?;
        tracing::info!(id = %id, has_photo = !image_url.is_empty(), "Pet added");

        self.backend
            .notifier
            .notify(APP_NAME, &format!("Added new pet: {name}"));

        self.refresh().await;
        Ok(id)
    }

    /// Change name and species of one of the owner's pets.
    pub async fn update(&mut self, id: &str, draft: &PetDraft) -> Result<(), CoreError> {
        let (name, species) = validate_pet(draft)?;
        self.ensure_listed(id)?;
        self.backend
            .store
            .update(PETS_COLLECTION, id, pet_update_record(&name, &species))
            .await?;
        tracing::info!(id, "Pet updated");
        self.refresh().await;
        Ok(())
    }

    /// Remove one of the owner's pets. Its appointments are left in place.
    pub async fn delete(&mut self, id: &str) -> Result<(), CoreError> {
        self.ensure_listed(id)?;
        self.backend.store.delete(PETS_COLLECTION, id).await?;
        tracing::info!(id, "Pet deleted");
        self.refresh().await;
        Ok(())
    }

    /// Reload after an acknowledged write. The write stands even if this
    /// fails; the previous list is kept until the next successful load.
    async fn refresh(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Reload after pet write failed");
        }
    }

    fn ensure_listed(&self, id: &str) -> Result<(), BackendError> {
        match self.find(id) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound {
                collection: PETS_COLLECTION.into(),
                id: id.into(),
            }),
        }
    }
}

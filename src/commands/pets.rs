//! Pet list commands for the home screen.

use crate::core_state::CoreState;
use crate::models::Pet;
use crate::pets::{PetDraft, PetPhoto};

pub async fn list_pets(state: &CoreState) -> Result<Vec<Pet>, String> {
    let mut roster = state.roster().map_err(|e| e.to_string())?;
    roster.load().await.map_err(|e| e.to_string())?;
    Ok(roster.pets().to_vec())
}

/// Creates a pet, uploading `photo` first when given. Returns the new pet id.
pub async fn add_pet(
    state: &CoreState,
    draft: PetDraft,
    photo: Option<PetPhoto>,
) -> Result<String, String> {
    let mut roster = state.roster().map_err(|e| e.to_string())?;
    roster.create(&draft, photo).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to add pet");
        e.to_string()
    })
}

pub async fn update_pet(state: &CoreState, pet_id: &str, draft: PetDraft) -> Result<(), String> {
    let mut roster = state.roster().map_err(|e| e.to_string())?;
    roster.load().await.map_err(|e| e.to_string())?;
    roster.update(pet_id, &draft).await.map_err(|e| e.to_string())
}

pub async fn delete_pet(state: &CoreState, pet_id: &str) -> Result<(), String> {
    let mut roster = state.roster().map_err(|e| e.to_string())?;
    roster.load().await.map_err(|e| e.to_string())?;
    roster.delete(pet_id).await.map_err(|e| e.to_string())
}

pub mod application;
pub mod document;
pub mod experience;
pub mod portfolio;
pub mod profile;
pub mod public_profile;
pub mod skill;

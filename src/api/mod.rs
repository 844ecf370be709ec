pub mod export;
pub mod letters;
pub mod profile;

pub mod admin;
pub mod merchant;
pub mod public;

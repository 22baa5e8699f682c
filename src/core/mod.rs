pub mod action;
pub mod body;
pub mod email;
pub mod escape;
pub mod subject;

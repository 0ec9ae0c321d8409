// Services module - external collaborator clients

pub mod catalog;
pub mod lookup;

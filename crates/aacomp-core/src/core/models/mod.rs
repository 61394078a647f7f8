pub mod composition;
pub mod ratio;
pub mod record;

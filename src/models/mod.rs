pub mod location;
pub mod passenger;
pub mod search;
pub mod trip;
pub mod validation;

pub mod model;
pub mod upcoming;

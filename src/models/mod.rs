pub mod cloud;
pub mod translate;

pub mod app;
pub mod gl;
pub mod image_view;
pub mod wheel;

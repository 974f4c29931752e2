pub mod camera;
pub mod config;
pub mod feed;
pub mod model;
pub mod panel;
pub mod scene;
pub mod sprite;
pub mod text;
pub mod transform;
pub mod ui;
pub mod viewer;

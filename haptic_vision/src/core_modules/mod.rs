pub mod cell;
pub mod depth_field;
pub mod extraction;
pub mod grid_geometry;
pub mod point;
pub mod power_map;
pub mod scene;

// src/geometry/mod.rs
//! Bounding boxes, WKT and CRS handling.
//!
//! All spatial filtering reduces to interval overlap on reprojected
//! rectangles.
pub mod bbox;
pub mod reproject;
pub mod wkt;

pub use bbox::{
    bounding_box_of, bounding_box_of_path, bounds_to_wkt, boxes_overlap, point_in_box,
    BoundingBox,
};
pub use reproject::{transform_point, Crs, Reprojector};
pub use wkt::{parse_geometry, wkt_to_bounds, GeometryKind};

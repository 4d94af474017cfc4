//! # Core Module
//!
//! This module provides the geometry primitives used throughout the voxel engine.
//! Every spatial query in the engine (chunk lookup, sector lookup, ray marching)
//! is expressed in terms of these two types.
//!
//! ## Key Components
//! - `Bounds`: Axis-aligned bounding box with containment and ray-slab tests
//! - `Ray`: Half-line with a normalized direction
//!
//! ## Usage
//! ```rust
//! use cgmath::{Point3, Vector3};
//! use voxel_terrain::core::{Bounds, Ray};
//!
//! let bounds = Bounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
//! let ray = Ray::new(Point3::new(0.5, 5.0, 0.5), Vector3::new(0.0, -1.0, 0.0));
//! assert_eq!(bounds.intersect_ray(&ray), Some(4.0));
//! ```

pub mod bounds;
pub mod ray;

// Re-export types for easier access
pub use bounds::Bounds;
pub use ray::Ray;

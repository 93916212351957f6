pub mod point;
pub mod vector;
pub mod transform;
pub mod curves;
pub mod surfaces;

//! Scene graph
//!
//! - Node: hierarchy entry with a transform and component keys
//! - Transform: TRS with cached matrices and shadow-state dirty checking
//! - Scene: node storage plus mesh, camera and skeleton maps
//! - Camera: perspective camera that can adopt a calibrated projection
//! - transform_system: world matrix propagation

pub mod camera;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use node::Node;
pub use scene::Scene;
pub use skeleton::{Skeleton, SkinBinding};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct CameraKey;
    pub struct SkeletonKey;
}

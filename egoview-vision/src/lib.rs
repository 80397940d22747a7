pub mod collaborators;
pub mod model_scope;
pub mod pinhole_camera;
pub mod recorded;
pub mod scene_abstractor;

pub use collaborators::*;
pub use model_scope::{ModelLifecycle, ModelScope};
pub use scene_abstractor::{
    EmptyMaskPolicy, PositionMode, SceneAbstraction, SceneAbstractor, SceneAbstractorCfg,
};

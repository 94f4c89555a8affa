//! Shader/effect bundles and the scene graph that drives them: transforms,
//! connections, camera/controller behaviors, and a renderer that owns the
//! device resources a scene draws into.

pub mod bytes;
pub mod effects;
pub mod scene;

pub use effects::{BlinnPhongEffect, Effect, LightParams, MaterialParams, RgbEffect, TextureEffect};
pub use scene::{Behavior, Camera, Connection, ConnectType, Controller, Marker, NodeId, Scene, SceneGraph, SceneRenderer, Transform};

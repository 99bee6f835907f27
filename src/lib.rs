//! Parser for Biovision Hierarchy (.bvh) motion capture files with forward kinematics.
//!
//! Loading a document builds the joint tree (End Sites included) and computes, for every joint and
//! every frame, its world transform and world position.
//!
//! ```no_run
//! use bvh_fk::parse::load_bvh_from_file;
//!
//! let bvh = load_bvh_from_file("./walk.bvh")?;
//! let hips = bvh.find_joint_by_name("Hips").unwrap();
//! let position = hips.world_position(23);
//! println!("{} frames at {} fps, hips at {:?}", bvh.num_frames(), bvh.fps(), position);
//! # Ok::<(), bvh_fk::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod kinematics;
pub mod motion;
pub mod parse;
pub mod skeleton_drawing;
pub mod types;
mod utils;

pub use config::{Config, TrailingSamples};
pub use error::{Error, Result};
pub use motion::{AnimationView, ChannelRange, FrameBuffer};
pub use parse::{load_bvh_from_file, load_bvh_from_string};
pub use skeleton_drawing::Bone;
pub use types::{Axis, Bvh, ChannelKind, Joint, JointId, Position, Transform};

//! Renderer-agnostic helpers for drawing a skeleton: limb chains, bone segments per frame and the
//! volume the animation occupies. A renderer only needs these plus the world positions.

use crate::types::{Bvh, JointId, Position};

/// A bone drawn from a parent joint (`head`) to one of its children (`tail`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bone {
    pub parent: JointId,
    pub child: JointId,
    pub head: Position,
    pub tail: Position,
}

impl Bvh {
    /// Returns the kinematic chains of the skeleton like \[\[0,1,2,3\],\[0,4,5,6\],\[2,7,8\]\].
    /// Every chain after the first starts at the joint it branches off, so each one can be drawn as a single polyline.
    pub fn kinematic_chains(&self) -> Vec<Vec<JointId>> {
        let mut kinematic_chains: Vec<Vec<JointId>> = Vec::new();
        let mut chain: Vec<JointId> = Vec::new();
        let mut previous: Option<JointId> = None;
        for joint in self.iter() {
            if joint.parent != previous {
                kinematic_chains.push(std::mem::take(&mut chain));
                chain.extend(joint.parent);
            }
            chain.push(joint.index);
            previous = Some(joint.index);
        }
        if !chain.is_empty() {
            kinematic_chains.push(chain);
        }
        kinematic_chains
    }

    /// One bone per non-root joint, in parse order.
    pub fn bone_segments(&self, frame: usize) -> Vec<Bone> {
        self.iter()
            .filter_map(|joint| {
                let parent = joint.parent?;
                Some(Bone {
                    parent,
                    child: joint.index,
                    head: self.world_position(parent, frame),
                    tail: joint.world_position(frame),
                })
            })
            .collect()
    }

    /// Bone segments for frames `0, frame_step, 2 * frame_step, ...`. Long, high frame-rate takes are
    /// usually previewed with a step above 1. A step of 0 is treated as 1.
    pub fn preview(&self, frame_step: usize) -> Vec<Vec<Bone>> {
        (0..self.num_frames())
            .step_by(frame_step.max(1))
            .map(|frame| self.bone_segments(frame))
            .collect()
    }

    /// Component-wise minimum and maximum of every joint's world position over every frame.
    pub fn bounds(&self) -> Option<(Position, Position)> {
        let mut positions = self.iter().flat_map(|joint| joint.world_positions());
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            (
                Position::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Position::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::load_bvh_from_string;
    use crate::types::JointId;
    use approx::assert_abs_diff_eq;
    use cgmath::Vector3;

    // Hips -> (Spine -> End, LeftLeg -> End)
    const FORKED: &str = "HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Spine
  {
    OFFSET 0 1 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0 1 0
    }
  }
  JOINT LeftLeg
  {
    OFFSET 1 0 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0 -2 0
    }
  }
}
MOTION
Frames: 3
Frame Time: 0.5
0 0 0 0 0 0 0 0 0 0 0 0
0 5 0 0 0 0 0 0 0 0 0 0
-3 0 0 0 0 0 0 0 0 0 0 0
";

    #[test]
    fn chains_branch_from_parent() {
        let bvh = load_bvh_from_string(FORKED).unwrap();
        let chains = bvh.kinematic_chains();
        assert_eq!(
            chains,
            vec![
                vec![JointId(0), JointId(1), JointId(2)],
                vec![JointId(0), JointId(3), JointId(4)],
            ]
        );
    }

    #[test]
    fn one_bone_per_non_root_joint() {
        let bvh = load_bvh_from_string(FORKED).unwrap();
        let bones = bvh.bone_segments(1);
        assert_eq!(bones.len(), bvh.num_joints() - 1);
        let leg = bones[2];
        assert_eq!(leg.parent, JointId(0));
        assert_eq!(leg.child, JointId(3));
        assert_abs_diff_eq!(leg.head, Vector3::new(0.0, 5.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(leg.tail, Vector3::new(1.0, 5.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn preview_steps_through_frames() {
        let bvh = load_bvh_from_string(FORKED).unwrap();
        assert_eq!(bvh.preview(1).len(), 3);
        assert_eq!(bvh.preview(2).len(), 2);
        assert_eq!(bvh.preview(0).len(), 3);
    }

    #[test]
    fn bounds_cover_all_frames() {
        let bvh = load_bvh_from_string(FORKED).unwrap();
        let (min, max) = bvh.bounds().unwrap();
        assert_abs_diff_eq!(min, Vector3::new(-3.0, -2.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(max, Vector3::new(1.0, 7.0, 0.0), epsilon = 1e-12);
    }
}

use crate::motion::{AnimationView, ChannelRange, FrameBuffer};
use crate::utils;
use cgmath::{Matrix4, Vector3};
use std::fmt;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Depth = usize;
pub type Position = Vector3<f64>;
/// 4x4 homogeneous transform (rotation + translation).
pub type Transform = Matrix4<f64>;

/// Name given to the channel-less leaf joints.
pub const END_SITE_NAME: &str = "End Site";

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Index of a joint inside [`Bvh`]'s joint arena. Joints are stored in parse order, so the root is always `JointId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub Index);

impl JointId {
    pub const ROOT: JointId = JointId(0);

    pub fn index(self) -> Index {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(s)
    }
}

/// The six channel identifiers of the format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Position(Axis),
    Rotation(Axis),
}

impl ChannelKind {
    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Position(Axis::X) => "Xposition",
            ChannelKind::Position(Axis::Y) => "Yposition",
            ChannelKind::Position(Axis::Z) => "Zposition",
            ChannelKind::Rotation(Axis::X) => "Xrotation",
            ChannelKind::Rotation(Axis::Y) => "Yrotation",
            ChannelKind::Rotation(Axis::Z) => "Zrotation",
        }
    }

    pub fn from_name(name: &str) -> Option<ChannelKind> {
        match name {
            "Xposition" => Some(ChannelKind::Position(Axis::X)),
            "Yposition" => Some(ChannelKind::Position(Axis::Y)),
            "Zposition" => Some(ChannelKind::Position(Axis::Z)),
            "Xrotation" => Some(ChannelKind::Rotation(Axis::X)),
            "Yrotation" => Some(ChannelKind::Rotation(Axis::Y)),
            "Zrotation" => Some(ChannelKind::Rotation(Axis::Z)),
            _ => None,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub index: JointId,
    pub parent: Option<JointId>,
    pub depth: Depth,
    /// Translation relative to the parent, as written in the file.
    pub offset: Position,
    /// Channel identifiers in declared order.
    pub channel_names: Vec<String>,
    /// Columns of the frame buffer holding this joint's samples.
    pub animation: ChannelRange,
    pub children: Vec<JointId>,
    /// One world transform per frame.
    pub world_transforms: Vec<Transform>,
}

impl Joint {
    pub fn num_channels(&self) -> usize {
        self.channel_names.len()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_end_site(&self) -> bool {
        self.name == END_SITE_NAME && self.channel_names.is_empty()
    }

    /// Position of `kind` among this joint's channels, looked up by name.
    pub fn channel_index(&self, kind: ChannelKind) -> Option<usize> {
        utils::find_channel(&self.channel_names, kind)
    }

    /// Declared rotation order, e.g. `"ZXY"`.
    pub fn rotation_order(&self) -> Option<String> {
        utils::rotation_order(&self.channel_names)
    }

    /// Panics if `frame` is out of range; [`Joint::get_world_transform`] doesn't.
    pub fn world_transform(&self, frame: usize) -> &Transform {
        &self.world_transforms[frame]
    }

    pub fn world_position(&self, frame: usize) -> Position {
        self.world_transforms[frame].w.truncate()
    }

    pub fn get_world_transform(&self, frame: usize) -> Option<&Transform> {
        self.world_transforms.get(frame)
    }

    pub fn get_world_position(&self, frame: usize) -> Option<Position> {
        self.get_world_transform(frame).map(|m| m.w.truncate())
    }

    pub fn world_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.world_transforms.iter().map(|m| m.w.truncate())
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// A parsed .bvh document: the joint tree, its samples and every joint's world transforms.
#[derive(Debug, Clone)]
pub struct Bvh {
    pub(crate) joints: Vec<Joint>,
    pub(crate) frames: FrameBuffer,
}

impl Bvh {
    pub fn root(&self) -> &Joint {
        &self.joints[JointId::ROOT.0]
    }

    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Joints in depth-first order, parents before children.
    pub fn iter(&self) -> std::slice::Iter<'_, Joint> {
        self.joints.iter()
    }

    pub fn children(&self, id: JointId) -> impl Iterator<Item = &Joint> + '_ {
        self.joints[id.0].children.iter().map(move |&child| &self.joints[child.0])
    }

    pub fn find_joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|joint| joint.name == name)
    }

    pub fn frames(&self) -> &FrameBuffer {
        &self.frames
    }

    pub fn num_frames(&self) -> usize {
        self.frames.num_frames()
    }

    pub fn frame_time(&self) -> f64 {
        self.frames.frame_time()
    }

    pub fn fps(&self) -> u32 {
        (1.0 / self.frames.frame_time()) as u32
    }

    /// Number of joints including End Sites.
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    pub fn num_channels(&self) -> usize {
        self.frames.num_channels()
    }

    pub fn animation(&self, id: JointId) -> AnimationView<'_> {
        self.frames.view(self.joints[id.0].animation)
    }

    /// Raw sample of one of the joint's channels, `None` if the joint doesn't declare it.
    pub fn channel_value(&self, id: JointId, frame: usize, kind: ChannelKind) -> Option<f64> {
        let channel = self.joints[id.0].channel_index(kind)?;
        Some(self.animation(id).get(frame, channel))
    }

    pub fn world_transform(&self, id: JointId, frame: usize) -> &Transform {
        self.joints[id.0].world_transform(frame)
    }

    pub fn world_position(&self, id: JointId, frame: usize) -> Position {
        self.joints[id.0].world_position(frame)
    }

    /// `None` for an unknown joint or a frame past the end.
    pub fn get_world_transform(&self, id: JointId, frame: usize) -> Option<&Transform> {
        self.joints.get(id.0)?.get_world_transform(frame)
    }

    pub fn get_world_position(&self, id: JointId, frame: usize) -> Option<Position> {
        self.joints.get(id.0)?.get_world_position(frame)
    }

    /// Sum of the static offsets from the root down to the joint (position with no animation applied).
    pub fn rest_position(&self, id: JointId) -> Position {
        let mut joint = &self.joints[id.0];
        let mut position = joint.offset;
        while let Some(parent) = joint.parent {
            joint = &self.joints[parent.0];
            position += joint.offset;
        }
        position
    }
}

//! Forward kinematics: local transforms from channel samples, composed down the joint tree.

use crate::error::{Error, Result};
use crate::motion::AnimationView;
use crate::types::{Joint, Position, Transform};
use crate::utils;
use cgmath::{Deg, Matrix3, Matrix4};

/// Euler angles in DEGREES to a rotation matrix, composed as `Rx * Ry * Rz`.
pub fn rotation(rx: f64, ry: f64, rz: f64) -> Matrix3<f64> {
    Matrix3::from_angle_x(Deg(rx)) * Matrix3::from_angle_y(Deg(ry)) * Matrix3::from_angle_z(Deg(rz))
}

/// `[R t; 0 1]`
pub fn local_transform(rotation: Matrix3<f64>, translation: Position) -> Transform {
    let mut transform = Matrix4::from(rotation);
    transform.w = translation.extend(1.0);
    transform
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where a joint's rotation and translation samples live among its channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelLayout {
    /// X, Y, Z rotation channels. `None` for End Sites.
    pub rotation: Option<[usize; 3]>,
    pub position: [Option<usize>; 3],
}

impl ChannelLayout {
    /// Resolve channel columns by name. Any joint that carries channels must declare all three rotation axes.
    pub fn resolve(joint: &Joint) -> Result<ChannelLayout> {
        if joint.channel_names.is_empty() {
            return Ok(ChannelLayout {
                rotation: None,
                position: [None; 3],
            });
        }
        let rotation = utils::rotation_columns(&joint.channel_names).map_err(|axis| {
            Error::MissingRotationChannel {
                joint: joint.name.clone(),
                axis,
            }
        })?;
        Ok(ChannelLayout {
            rotation: Some(rotation),
            position: utils::position_columns(&joint.channel_names),
        })
    }

    /// Local transform for one frame, `samples` being the joint's own channels in declared order.
    pub fn local_transform(&self, offset: Position, samples: &[f64]) -> Transform {
        let rot = match self.rotation {
            Some([x, y, z]) => rotation(samples[x], samples[y], samples[z]),
            None => rotation(0.0, 0.0, 0.0),
        };
        let mut translation = offset;
        for (axis, column) in self.position.iter().enumerate() {
            if let Some(column) = column {
                translation[axis] += samples[*column];
            }
        }
        local_transform(rot, translation)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// World transforms of `joint` for every frame: `parent[frame] * local[frame]`, or just `local` for the root.
/// The parent's series must already be complete.
pub fn evaluate_joint(
    joint: &Joint,
    animation: AnimationView<'_>,
    parent: Option<&[Transform]>,
    parallel: bool,
) -> Result<Vec<Transform>> {
    let layout = ChannelLayout::resolve(joint)?;
    let offset = joint.offset;
    let frame_transform = |frame: usize| {
        let local = layout.local_transform(offset, animation.frame(frame));
        match parent {
            Some(parent) => parent[frame] * local,
            None => local,
        }
    };
    Ok(map_frames(animation.num_frames(), parallel, frame_transform))
}

#[cfg(feature = "parallel")]
fn map_frames<F>(num_frames: usize, parallel: bool, f: F) -> Vec<Transform>
where
    F: Fn(usize) -> Transform + Sync + Send,
{
    use rayon::prelude::*;
    if parallel {
        (0..num_frames).into_par_iter().map(f).collect()
    } else {
        (0..num_frames).map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn map_frames<F>(num_frames: usize, _parallel: bool, f: F) -> Vec<Transform>
where
    F: Fn(usize) -> Transform,
{
    (0..num_frames).map(f).collect()
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::{SquareMatrix, Vector3};

    fn rx(deg: f64) -> Matrix3<f64> {
        let (s, c) = deg.to_radians().sin_cos();
        Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
    }

    fn ry(deg: f64) -> Matrix3<f64> {
        let (s, c) = deg.to_radians().sin_cos();
        Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
    }

    fn rz(deg: f64) -> Matrix3<f64> {
        let (s, c) = deg.to_radians().sin_cos();
        Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn zero_angles_give_identity() {
        assert_abs_diff_eq!(rotation(0.0, 0.0, 0.0), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn composition_is_x_then_y_then_z() {
        let (x, y, z) = (30.0, -45.0, 60.0);
        let expected = rx(x) * ry(y) * rz(z);
        assert_abs_diff_eq!(rotation(x, y, z), expected, epsilon = 1e-12);

        // any other order disagrees for non-trivial angles
        let swapped = rz(z) * ry(y) * rx(x);
        assert!((rotation(x, y, z).x.y - swapped.x.y).abs() > 1e-3);
    }

    #[test]
    fn quarter_turn_about_z() {
        // row-major: [[c, -s, 0], [s, c, 0], [0, 0, 1]]
        let m = rotation(0.0, 0.0, 90.0);
        let v = m * Vector3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(v, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn local_transform_layout() {
        let m = local_transform(rotation(0.0, 90.0, 0.0), Vector3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(m.w.truncate(), Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
        assert_eq!(m.x.w, 0.0);
        assert_eq!(m.y.w, 0.0);
        assert_eq!(m.z.w, 0.0);
        assert_eq!(m.w.w, 1.0);
        // rotate +X about Y by 90 degrees -> -Z
        let p = m * Vector3::new(1.0, 0.0, 0.0).extend(0.0);
        assert_abs_diff_eq!(p.truncate(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn layout_reads_declared_order() {
        let layout = ChannelLayout {
            rotation: Some([1, 2, 0]),
            position: [None; 3],
        };
        // samples declared as Z, X, Y
        let m = layout.local_transform(Vector3::new(0.0, 2.0, 0.0), &[60.0, 30.0, -45.0]);
        let expected = local_transform(rotation(30.0, -45.0, 60.0), Vector3::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(m, expected, epsilon = 1e-12);
    }

    #[test]
    fn position_channels_add_to_offset() {
        let layout = ChannelLayout {
            rotation: Some([3, 4, 5]),
            position: [Some(0), Some(1), Some(2)],
        };
        let m = layout.local_transform(Vector3::new(1.0, 1.0, 1.0), &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(m.w.truncate(), Vector3::new(2.0, 3.0, 4.0), epsilon = 1e-12);
    }

    #[test]
    fn end_site_layout_is_offset_only() {
        let layout = ChannelLayout {
            rotation: None,
            position: [None; 3],
        };
        let m = layout.local_transform(Vector3::new(0.0, 0.0, 5.0), &[]);
        assert_abs_diff_eq!(m, Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0)), epsilon = 1e-12);
    }
}

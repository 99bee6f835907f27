use crate::config::{Config, TrailingSamples};
use crate::error::{Error, Result};
use crate::utils::parse_number;
use log::{info, warn};
use regex::Regex;
use std::ops::Range;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Contiguous run of columns of the [`FrameBuffer`] owned by one joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelRange {
    pub start: usize,
    pub len: usize,
}

impl ChannelRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn columns(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn overlaps(&self, other: &ChannelRange) -> bool {
        self.len > 0 && other.len > 0 && self.start < other.end() && other.start < self.end()
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Every sample of the MOTION section, frames x channels, row-major.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    num_frames: usize,
    num_channels: usize,
    frame_time: f64,
    data: Vec<f64>,
}

impl FrameBuffer {
    /// Build the buffer from a motion block. The leading `MOTION` line is optional.
    pub fn build(motion_block: &str, config: &Config) -> Result<FrameBuffer> {
        let lines: Vec<&str> = motion_block.lines().collect();
        Self::from_lines(&lines, 0, config)
    }

    /// `first_line` is the 0-based line number of `lines[0]` inside the whole document; only used for error reporting.
    pub(crate) fn from_lines(lines: &[&str], first_line: usize, config: &Config) -> Result<FrameBuffer> {
        let re_frames = Regex::new(r"^Frames:\s*(\S+)")?;
        let re_frame_time = Regex::new(r"^Frame Time:\s*(\S+)")?;

        let mut it = lines
            .iter()
            .copied()
            .enumerate()
            .map(|(i, line)| (first_line + i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        //// HEADER
        let (mut line_no, mut line) = it.next().ok_or(Error::MissingMotionSection)?;
        if line == "MOTION" {
            (line_no, line) = it
                .next()
                .ok_or_else(|| Error::motion("missing 'Frames:' line"))?;
        }
        let num_frames = match re_frames.captures(line) {
            Some(captures) => parse_number::<usize>(&captures[1], line_no)?,
            None => return Err(Error::motion(format!("expected 'Frames:' at line {line_no}"))),
        };
        let (line_no, line) = it
            .next()
            .ok_or_else(|| Error::motion("missing 'Frame Time:' line"))?;
        let frame_time = match re_frame_time.captures(line) {
            Some(captures) => parse_number::<f64>(&captures[1], line_no)?,
            None => {
                return Err(Error::motion(format!(
                    "expected 'Frame Time:' at line {line_no}"
                )))
            }
        };
        if num_frames == 0 {
            return Err(Error::motion("motion block declares zero frames"));
        }

        //// SAMPLES
        // grown row by row, never sized from the declared frame count
        let mut data: Vec<f64> = Vec::new();
        let mut num_channels = 0;
        for frame in 0..num_frames {
            let (line_no, line) = it.next().ok_or_else(|| {
                Error::motion(format!(
                    "declared {num_frames} frames but only {frame} sample lines are present"
                ))
            })?;
            let row = line
                .split_whitespace()
                .map(|s| parse_number::<f64>(s, line_no))
                .collect::<Result<Vec<f64>>>()?;

            if frame == 0 {
                num_channels = row.len();
            } else if row.len() != num_channels {
                return Err(Error::motion(format!(
                    "line {line_no} has {} samples, expected {num_channels}",
                    row.len()
                )));
            }
            data.extend(row);
        }

        let trailing = it.count();
        if trailing > 0 {
            match config.trailing_samples {
                TrailingSamples::Ignore => {
                    warn!("ignoring {trailing} sample lines after the declared {num_frames} frames")
                }
                TrailingSamples::Reject => {
                    return Err(Error::motion(format!(
                        "{trailing} sample lines after the declared {num_frames} frames"
                    )))
                }
            }
        }

        info!("motion block: {num_frames} frames x {num_channels} channels, frame time {frame_time}s");

        Ok(FrameBuffer {
            num_frames,
            num_channels,
            frame_time,
            data,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// All samples of one frame. Panics if `frame` is out of range, see [`FrameBuffer::get_frame`].
    pub fn frame(&self, frame: usize) -> &[f64] {
        let start = frame * self.num_channels;
        &self.data[start..start + self.num_channels]
    }

    pub fn get_frame(&self, frame: usize) -> Option<&[f64]> {
        if frame < self.num_frames {
            Some(self.frame(frame))
        } else {
            None
        }
    }

    pub fn get(&self, frame: usize, column: usize) -> f64 {
        self.data[frame * self.num_channels + column]
    }

    /// Borrow the given columns across all frames without copying.
    pub fn view(&self, range: ChannelRange) -> AnimationView<'_> {
        debug_assert!(range.end() <= self.num_channels);
        AnimationView {
            buffer: self,
            range,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One joint's slice of the [`FrameBuffer`]: all frames, its own columns only.
#[derive(Clone, Copy, Debug)]
pub struct AnimationView<'a> {
    buffer: &'a FrameBuffer,
    range: ChannelRange,
}

impl<'a> AnimationView<'a> {
    pub fn num_frames(&self) -> usize {
        self.buffer.num_frames
    }

    pub fn num_channels(&self) -> usize {
        self.range.len
    }

    pub fn range(&self) -> ChannelRange {
        self.range
    }

    /// This joint's samples for one frame, in declared channel order.
    pub fn frame(&self, frame: usize) -> &'a [f64] {
        &self.buffer.frame(frame)[self.range.columns()]
    }

    /// `channel` is relative to the joint, i.e. an index into its channel names.
    pub fn get(&self, frame: usize, channel: usize) -> f64 {
        debug_assert!(channel < self.range.len);
        self.buffer.get(frame, self.range.start + channel)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const MOTION: &str = "MOTION
Frames: 3
Frame Time: 0.0333333
0 1 2 3
4 5 6 7
8 9 10 11
";

    #[test]
    fn builds_dense_matrix() {
        let buffer = FrameBuffer::build(MOTION, &Config::default()).unwrap();
        assert_eq!(buffer.num_frames(), 3);
        assert_eq!(buffer.num_channels(), 4);
        assert_eq!(buffer.frame_time(), 0.0333333);
        assert_eq!(buffer.frame(1), &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(buffer.get(2, 3), 11.0);
    }

    #[test]
    fn view_borrows_columns() {
        let buffer = FrameBuffer::build(MOTION, &Config::default()).unwrap();
        let view = buffer.view(ChannelRange { start: 1, len: 2 });
        assert_eq!(view.num_frames(), 3);
        assert_eq!(view.frame(0), &[1.0, 2.0]);
        assert_eq!(view.get(2, 1), 10.0);

        let empty = buffer.view(ChannelRange { start: 4, len: 0 });
        assert!(empty.frame(1).is_empty());
    }

    #[test]
    fn missing_rows_are_rejected() {
        let block = "MOTION\nFrames: 4\nFrame Time: 0.01\n0 0\n1 1\n";
        let err = FrameBuffer::build(block, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionBlock { .. }));
    }

    #[test]
    fn huge_frame_count_with_few_rows_is_rejected() {
        let block = "MOTION\nFrames: 9223372036854775807\nFrame Time: 0.01\n0 0 0\n1 1 1\n";
        let err = FrameBuffer::build(block, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionBlock { .. }));

        let block = "MOTION\nFrames: 100000000000\nFrame Time: 0.01\n0 0 0\n1 1 1\n";
        let err = FrameBuffer::build(block, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionBlock { .. }));
    }

    #[test]
    fn out_of_range_frame_is_none() {
        let buffer = FrameBuffer::build(MOTION, &Config::default()).unwrap();
        assert_eq!(buffer.get_frame(2), Some(&[8.0, 9.0, 10.0, 11.0][..]));
        assert_eq!(buffer.get_frame(3), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let block = "MOTION\nFrames: 2\nFrame Time: 0.01\n0 0 0\n1 1\n";
        let err = FrameBuffer::build(block, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionBlock { .. }));
    }

    #[test]
    fn trailing_rows_follow_config() {
        let block = "MOTION\nFrames: 1\nFrame Time: 0.01\n0 0\n1 1\n";
        let buffer = FrameBuffer::build(block, &Config::default()).unwrap();
        assert_eq!(buffer.num_frames(), 1);

        let err = FrameBuffer::build(block, &Config::strict()).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionBlock { .. }));
    }

    #[test]
    fn bad_sample_reports_line() {
        let block = "MOTION\nFrames: 1\nFrame Time: 0.01\n0 abc\n";
        match FrameBuffer::build(block, &Config::default()) {
            Err(Error::InvalidNumber { line, value }) => {
                assert_eq!(line, 4);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn ranges_overlap() {
        let a = ChannelRange { start: 0, len: 6 };
        let b = ChannelRange { start: 6, len: 3 };
        let c = ChannelRange { start: 5, len: 3 };
        let end_site = ChannelRange { start: 3, len: 0 };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&end_site));
    }
}

use crate::config::Config;
use crate::error::{Error, Result};
use crate::kinematics;
use crate::motion::{ChannelRange, FrameBuffer};
use crate::types::*;
use crate::utils::parse_number;
use log::{debug, info};
use regex::Regex;
use std::path::Path;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct Patterns {
    joint: Regex,
    end_site: Regex,
    offset: Regex,
    channels: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Patterns {
            // the name is the first token after the keyword
            joint: Regex::new(r"^(ROOT|JOINT)(?:\s+(\S+).*)?$")?,
            end_site: Regex::new(r"^End(\s+Site)?$")?,
            offset: Regex::new(r"^OFFSET\s+(.+)$")?,
            channels: Regex::new(r"^CHANNELS\s+(\d+)\s*(.*)$")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JointKind {
    Root,
    Joint,
    EndSite,
}

/// Cursor over the trimmed, non-empty lines of the hierarchy block. Line numbers are 1-based.
struct Lines<'a> {
    lines: &'a [&'a str],
    pos: usize,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Lines {
            lines,
            pos: 0,
            last_line: 0,
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            self.pos += 1;
            if !line.is_empty() {
                self.last_line = self.pos;
                return Some((self.pos, line));
            }
        }
        None
    }

    fn expect(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let last_line = self.last_line;
        self.next()
            .ok_or_else(|| Error::hierarchy(last_line, format!("expected {what}, found end of hierarchy")))
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Single-pass stack machine over the HIERARCHY block. Every joint gets its slice of the frame
/// buffer and its world transforms as soon as it is read; its parent is on top of the stack and already complete.
struct HierarchyBuilder<'a> {
    frames: &'a FrameBuffer,
    parallel: bool,
    patterns: Patterns,
    joints: Vec<Joint>,
    stack: Vec<JointId>,
    channel_cursor: usize,
    /// Set once a joint claims columns past the end of the buffer; FK is skipped from then on
    /// and the mismatch is reported after the scan.
    overflowed: bool,
}

impl<'a> HierarchyBuilder<'a> {
    fn new(frames: &'a FrameBuffer, config: &Config) -> Result<Self> {
        Ok(HierarchyBuilder {
            frames,
            parallel: config.parallel_frames,
            patterns: Patterns::new()?,
            joints: Vec::new(),
            stack: Vec::new(),
            channel_cursor: 0,
            overflowed: false,
        })
    }

    fn run(mut self, lines: &[&str]) -> Result<Vec<Joint>> {
        let mut lines = Lines::new(lines);

        while let Some((line_no, line)) = lines.next() {
            //// a header may carry its opening brace on the same line
            let (header, has_brace) = match line.strip_suffix('{') {
                Some(rest) => (rest.trim_end(), true),
                None => (line, false),
            };

            if header.is_empty() || header == "HIERARCHY" {
                continue;
            } else if header == "}" {
                //// Pop
                if self.stack.pop().is_none() {
                    return Err(Error::UnbalancedHierarchy { line: line_no });
                }
                debug!("pop joint, {} still open", self.stack.len());
            } else if header.starts_with("MOTION") {
                break;
            } else if let Some(captures) = self.patterns.joint.captures(header) {
                let kind = if &captures[1] == "ROOT" {
                    JointKind::Root
                } else {
                    JointKind::Joint
                };
                let name = match captures.get(2) {
                    Some(name) => name.as_str().to_string(),
                    None => return Err(Error::hierarchy(line_no, format!("{} without a name", &captures[1]))),
                };
                self.open_joint(kind, name, line_no, has_brace, &mut lines)?;
            } else if self.patterns.end_site.is_match(header) {
                self.open_joint(JointKind::EndSite, END_SITE_NAME.to_string(), line_no, has_brace, &mut lines)?;
            } else {
                debug!("skipping line {line_no}: {line}");
            }
        }

        self.finish(lines.last_line)
    }

    fn open_joint(
        &mut self,
        kind: JointKind,
        name: String,
        line_no: usize,
        has_brace: bool,
        lines: &mut Lines<'_>,
    ) -> Result<()> {
        //// Find the parent (top of the stack)
        let parent = match (kind, self.stack.last().copied()) {
            (JointKind::Root, None) if self.joints.is_empty() => None,
            (JointKind::Root, _) => {
                return Err(Error::hierarchy(line_no, "only one ROOT is supported"));
            }
            (_, None) => {
                return Err(Error::hierarchy(line_no, format!("'{name}' has no enclosing joint")));
            }
            (_, Some(parent)) => Some(parent),
        };

        if !has_brace {
            let (brace_line, brace) = lines.expect("'{'")?;
            if brace != "{" {
                return Err(Error::hierarchy(brace_line, format!("expected '{{' after '{name}'")));
            }
        }

        //// OFFSET
        let (offset_line, line) = lines.expect("OFFSET")?;
        let offset = self.parse_offset(offset_line, line)?;

        //// CHANNELS
        let channel_names = if kind == JointKind::EndSite {
            Vec::new()
        } else {
            let (channels_line, line) = lines.expect("CHANNELS")?;
            self.parse_channels(channels_line, line)?
        };
        if kind == JointKind::Root && channel_names.is_empty() {
            return Err(Error::ChannelCountMismatch {
                claimed: 0,
                available: self.frames.num_channels(),
            });
        }

        //// Claim the next columns of the frame buffer
        let animation = ChannelRange {
            start: self.channel_cursor,
            len: channel_names.len(),
        };
        self.channel_cursor += animation.len;
        if animation.end() > self.frames.num_channels() {
            self.overflowed = true;
        }

        let index = JointId(self.joints.len());
        let depth = parent.map_or(0, |p| self.joints[p.0].depth + 1);
        let mut joint = Joint {
            name,
            index,
            parent,
            depth,
            offset,
            channel_names,
            animation,
            children: Vec::new(),
            world_transforms: Vec::new(),
        };

        //// Forward kinematics for every frame of this joint
        if !self.overflowed {
            let parent_transforms = parent.map(|p| self.joints[p.0].world_transforms.as_slice());
            joint.world_transforms = kinematics::evaluate_joint(
                &joint,
                self.frames.view(animation),
                parent_transforms,
                self.parallel,
            )?;
        }

        debug!(
            "{:?} '{}' at line {}: depth {}, channels {:?}",
            kind,
            joint.name,
            line_no,
            depth,
            animation.columns()
        );

        if let Some(parent) = parent {
            self.joints[parent.0].children.push(index);
        }
        self.joints.push(joint);
        self.stack.push(index);
        Ok(())
    }

    fn parse_offset(&self, line_no: usize, line: &str) -> Result<Position> {
        let captures = self
            .patterns
            .offset
            .captures(line)
            .ok_or_else(|| Error::hierarchy(line_no, "expected OFFSET"))?;
        let values = captures[1]
            .split_whitespace()
            .map(|s| parse_number::<f64>(s, line_no))
            .collect::<Result<Vec<f64>>>()?;
        if values.len() < 3 {
            return Err(Error::hierarchy(line_no, "OFFSET needs 3 components"));
        }
        Ok(Position::new(values[0], values[1], values[2]))
    }

    fn parse_channels(&self, line_no: usize, line: &str) -> Result<Vec<String>> {
        let captures = self
            .patterns
            .channels
            .captures(line)
            .ok_or_else(|| Error::hierarchy(line_no, "expected CHANNELS"))?;
        let num_channels = parse_number::<usize>(&captures[1], line_no)?;
        let channel_names: Vec<String> = captures[2].split_whitespace().map(str::to_string).collect();
        if channel_names.len() != num_channels {
            return Err(Error::hierarchy(
                line_no,
                format!("CHANNELS declares {num_channels} channels but lists {}", channel_names.len()),
            ));
        }
        Ok(channel_names)
    }

    fn finish(self, last_line: usize) -> Result<Vec<Joint>> {
        if self.joints.is_empty() {
            return Err(Error::ChannelCountMismatch {
                claimed: 0,
                available: self.frames.num_channels(),
            });
        }
        if !self.stack.is_empty() {
            return Err(Error::hierarchy(
                last_line,
                format!("{} joints are still open at the end of the hierarchy", self.stack.len()),
            ));
        }
        if self.channel_cursor != self.frames.num_channels() {
            return Err(Error::ChannelCountMismatch {
                claimed: self.channel_cursor,
                available: self.frames.num_channels(),
            });
        }
        Ok(self.joints)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Build the joint tree from a HIERARCHY block on top of an already built frame buffer.
pub fn parse_hierarchy(hierarchy_block: &str, frames: FrameBuffer, config: &Config) -> Result<Bvh> {
    let lines: Vec<&str> = hierarchy_block.lines().collect();
    let joints = HierarchyBuilder::new(&frames, config)?.run(&lines)?;
    Ok(Bvh { joints, frames })
}

fn parse_bvh(text: &str, config: &Config) -> Result<Bvh> {
    let lines: Vec<&str> = text.lines().collect();

    //// the frame buffer has to exist before joints can slice it, so MOTION is read first
    let motion_start = lines
        .iter()
        .position(|line| line.trim_start().starts_with("MOTION"))
        .ok_or(Error::MissingMotionSection)?;
    let frames = FrameBuffer::from_lines(&lines[motion_start..], motion_start, config)?;

    let joints = HierarchyBuilder::new(&frames, config)?.run(&lines[..motion_start])?;

    info!(
        "parsed bvh: {} joints, {} frames, {} channels",
        joints.len(),
        frames.num_frames(),
        frames.num_channels()
    );
    Ok(Bvh { joints, frames })
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file(file_path: impl AsRef<Path>) -> Result<Bvh> {
    load_bvh_from_file_with_config(file_path, &Config::default())
}

pub fn load_bvh_from_file_with_config(file_path: impl AsRef<Path>, config: &Config) -> Result<Bvh> {
    let file_path = file_path.as_ref();
    info!("reading bvh file {}", file_path.display());
    let contents = std::fs::read_to_string(file_path)?;
    parse_bvh(&contents, config)
}

/// load a bvh file from a string
pub fn load_bvh_from_string(bvh_string: &str) -> Result<Bvh> {
    parse_bvh(bvh_string, &Config::default())
}

pub fn load_bvh_from_string_with_config(bvh_string: &str, config: &Config) -> Result<Bvh> {
    parse_bvh(bvh_string, config)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

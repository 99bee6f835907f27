use crate::error::{Error, Result};
use crate::types::{Axis, ChannelKind};

/// Parse a number token, reporting the 1-based line it came from on failure.
pub(crate) fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T> {
    value.parse::<T>().map_err(|_| Error::InvalidNumber {
        line,
        value: value.to_string(),
    })
}

/// Index of the channel called `kind` among `channel_names`.
pub(crate) fn find_channel(channel_names: &[String], kind: ChannelKind) -> Option<usize> {
    let name = kind.name();
    channel_names.iter().position(|channel| channel == name)
}

/// Rotation order string built from the first letter of each rotation channel, e.g. `["Zrotation", "Xrotation", "Yrotation"]` -> `"ZXY"`.
pub(crate) fn rotation_order(channel_names: &[String]) -> Option<String> {
    let order: String = channel_names
        .iter()
        .filter_map(|name| match ChannelKind::from_name(name) {
            Some(ChannelKind::Rotation(axis)) => Some(axis.to_string()),
            _ => None,
        })
        .collect();
    if order.is_empty() {
        None
    } else {
        Some(order)
    }
}

/// Columns of the X, Y and Z rotation channels, or the first axis that is missing.
pub(crate) fn rotation_columns(channel_names: &[String]) -> std::result::Result<[usize; 3], Axis> {
    let mut columns = [0; 3];
    for (column, axis) in columns.iter_mut().zip(Axis::ALL) {
        *column = find_channel(channel_names, ChannelKind::Rotation(axis)).ok_or(axis)?;
    }
    Ok(columns)
}

/// Columns of the X, Y and Z position channels; absent axes contribute nothing.
pub(crate) fn position_columns(channel_names: &[String]) -> [Option<usize>; 3] {
    Axis::ALL.map(|axis| find_channel(channel_names, ChannelKind::Position(axis)))
}

#![allow(clippy::missing_errors_doc)]

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use beast_core::{LevelDescription, LevelError};
use thiserror::Error;

const SHARE_DOMAIN: &str = "beast";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const SHARE_HEADER: &str = "beast:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(level: &LevelDescription) -> Result<String, LevelTransferError> {
    let json = serde_json::to_vec(level).map_err(LevelTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SHARE_HEADER}:{}x{}:{encoded}",
        level.width, level.height
    ))
}

/// Decodes and validates a level from its share string.
pub(crate) fn decode(value: &str) -> Result<LevelDescription, LevelTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LevelTransferError::InvalidEncoding)?;
    let level: LevelDescription =
        serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)?;

    if (level.width, level.height) != (width, height) {
        return Err(LevelTransferError::DimensionMismatch {
            header: (width, height),
            payload: (level.width, level.height),
        });
    }
    level.validate()?;
    Ok(level)
}

/// Errors that can occur while decoding level share strings.
#[derive(Debug, Error)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("share string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("share string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the embedded level.
    #[error(
        "header declares {}x{} but the level is {}x{}",
        .header.0, .header.1, .payload.0, .payload.1
    )]
    DimensionMismatch {
        /// Dimensions from the header segment.
        header: (u32, u32),
        /// Dimensions from the decoded level.
        payload: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not parse level payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The decoded level failed validation.
    #[error("shared level is invalid")]
    InvalidLevel(#[from] LevelError),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelTransferError> {
    let invalid = || LevelTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Compressed `<diagram>` payloads: base64 over raw deflate over percent-encoded XML.

use std::fmt;
use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadDecodeError {
    Base64(String),
    Inflate(String),
    Utf8,
}

impl fmt::Display for PayloadDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(message) => write!(f, "invalid base64: {message}"),
            Self::Inflate(message) => write!(f, "invalid deflate stream: {message}"),
            Self::Utf8 => f.write_str("decoded payload is not UTF-8"),
        }
    }
}

impl std::error::Error for PayloadDecodeError {}

pub fn decode_diagram_payload(payload: &str) -> Result<String, PayloadDecodeError> {
    let compact = payload.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let deflated =
        STANDARD.decode(compact).map_err(|err| PayloadDecodeError::Base64(err.to_string()))?;

    let mut inflated = Vec::new();
    DeflateDecoder::new(&deflated[..])
        .read_to_end(&mut inflated)
        .map_err(|err| PayloadDecodeError::Inflate(err.to_string()))?;

    let encoded = std::str::from_utf8(&inflated).map_err(|_| PayloadDecodeError::Utf8)?;
    let decoded = percent_decode_str(encoded).decode_utf8().map_err(|_| PayloadDecodeError::Utf8)?;
    Ok(decoded.into_owned())
}

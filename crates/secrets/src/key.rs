/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Loading of the credential key material.

use std::path::Path;

use rand::RngCore;

use crate::CipherError;

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

pub type KeyBytes = [u8; KEY_LEN];

/// Parses a key given as 64 hex characters. Surrounding whitespace is ignored.
pub fn parse_key_hex(hex_key: &str) -> Result<KeyBytes, CipherError> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| CipherError::InvalidKey(format!("key is not valid hex: {e}")))?;
    to_key_bytes(&bytes)
}

/// Reads a key file. The file either holds the key hex-encoded (as written by
/// `generate_key_hex`), or the raw 32 key bytes.
pub fn read_key_file(path: &Path) -> Result<KeyBytes, CipherError> {
    let contents = std::fs::read(path).map_err(|error| CipherError::KeyFile {
        path: path.to_string_lossy().to_string(),
        error: error.to_string(),
    })?;

    if contents.len() == KEY_LEN {
        return to_key_bytes(&contents);
    }

    let text = std::str::from_utf8(&contents).map_err(|_| {
        CipherError::InvalidKey(format!(
            "{} holds neither {KEY_LEN} raw bytes nor a hex encoded key",
            path.display()
        ))
    })?;
    parse_key_hex(text)
}

pub fn generate_key() -> KeyBytes {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut key);
    key
}

pub fn generate_key_hex() -> String {
    hex::encode(generate_key())
}

fn to_key_bytes(bytes: &[u8]) -> Result<KeyBytes, CipherError> {
    bytes.try_into().map_err(|_| {
        CipherError::InvalidKey(format!(
            "expected {KEY_LEN} key bytes, got {}",
            bytes.len()
        ))
    })
}

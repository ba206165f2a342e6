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

use std::fmt;
use std::path::Path;

use rand::RngCore;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};

use crate::CipherError;
use crate::key::{self, KEY_LEN};

/// AES-GCM authentication tag length in bytes
const TAG_LEN: usize = 16;

/// Encrypts and decrypts database connection strings at rest.
///
/// Every call to [`CredentialCipher::encrypt`] uses a fresh random nonce. The output is
/// `hex(nonce):hex(tag):hex(payload)`, so a ciphertext carries everything needed to decrypt
/// it apart from the key.
pub struct CredentialCipher {
    key: LessSafeKey,
    ephemeral: bool,
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("algorithm", &"AES-256-GCM")
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}

impl CredentialCipher {
    pub fn new(key_bytes: &[u8]) -> Result<Self, CipherError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes).map_err(|_| {
            CipherError::InvalidKey(format!(
                "expected {KEY_LEN} key bytes, got {}",
                key_bytes.len()
            ))
        })?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            ephemeral: false,
        })
    }

    pub fn from_hex_key(hex_key: &str) -> Result<Self, CipherError> {
        Self::new(&key::parse_key_hex(hex_key)?)
    }

    pub fn from_key_file(path: &Path) -> Result<Self, CipherError> {
        Self::new(&key::read_key_file(path)?)
    }

    /// A cipher with a random key that only lives as long as this process. Anything it
    /// encrypts becomes unreadable after a restart.
    pub fn ephemeral() -> Result<Self, CipherError> {
        let mut cipher = Self::new(&key::generate_key())?;
        cipher.ephemeral = true;
        Ok(cipher)
    }

    /// Loads the process-wide key: an explicit hex key wins over a key file. Without
    /// either, an ephemeral key is generated.
    pub fn load(hex_key: Option<&str>, key_path: Option<&Path>) -> Result<Self, CipherError> {
        if let Some(hex_key) = hex_key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using credential key from configuration");
            return Self::from_hex_key(hex_key);
        }
        if let Some(key_path) = key_path {
            tracing::debug!(path = %key_path.display(), "Using credential key file");
            return Self::from_key_file(key_path);
        }

        tracing::warn!(
            "No credential key configured. Generated an ephemeral key: stored connection strings will NOT be readable after a restart"
        );
        Self::ephemeral()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let mut payload = plaintext.as_bytes().to_vec();
        let tag = self
            .key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce),
                Aad::empty(),
                &mut payload,
            )
            .map_err(|_| CipherError::Encryption)?;

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce),
            hex::encode(tag.as_ref()),
            hex::encode(&payload)
        ))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let sealed = SealedCredential::parse(ciphertext)?;

        let mut in_out = sealed.payload;
        in_out.extend_from_slice(&sealed.tag);
        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(sealed.nonce),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CipherError::Malformed("decrypted payload is not UTF-8".to_string()))
    }
}

struct SealedCredential {
    nonce: [u8; NONCE_LEN],
    tag: [u8; TAG_LEN],
    payload: Vec<u8>,
}

impl SealedCredential {
    fn parse(ciphertext: &str) -> Result<Self, CipherError> {
        let segments: Vec<&str> = ciphertext.trim().split(':').collect();
        let [nonce, tag, payload] = segments[..] else {
            return Err(CipherError::Malformed(format!(
                "expected 3 ':'-separated segments, found {}",
                segments.len()
            )));
        };

        Ok(Self {
            nonce: decode_fixed(nonce, "nonce")?,
            tag: decode_fixed(tag, "tag")?,
            payload: hex::decode(payload)
                .map_err(|e| CipherError::Malformed(format!("payload is not hex: {e}")))?,
        })
    }
}

fn decode_fixed<const N: usize>(segment: &str, what: &str) -> Result<[u8; N], CipherError> {
    let bytes =
        hex::decode(segment).map_err(|e| CipherError::Malformed(format!("{what} is not hex: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CipherError::Malformed(format!("{what} must be {N} bytes, found {len}"))
    })
}

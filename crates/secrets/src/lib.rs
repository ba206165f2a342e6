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
pub use crate::cipher::CredentialCipher;

pub mod cipher;
pub mod key;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid credential key: {0}")]
    InvalidKey(String),
    #[error("Could not read credential key file {path}: {error}")]
    KeyFile { path: String, error: String },
    #[error("Malformed ciphertext: {0}")]
    Malformed(String),
    /// The ciphertext was well formed but did not authenticate: it was modified after
    /// encryption or sealed under a different key.
    #[error("Ciphertext failed authentication (tampered or encrypted with another key)")]
    Authentication,
    #[error("Encryption failed")]
    Encryption,
}

// ABOUTME: Cryptography module for at-rest record encryption
// ABOUTME: Centralizes symmetric encryption for the credential store
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod cipher;

pub use cipher::RecordCipher;

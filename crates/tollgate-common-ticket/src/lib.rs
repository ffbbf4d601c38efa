// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signed session tickets.
//!
//! A ticket is an ASCII string of `;`-joined `key=value` pairs whose final
//! field is literally `sig=<base64>`:
//!
//! ```text
//! uid=john;validuntil=1735689600;sig=MEUCIQ...
//! ```
//!
//! The signature covers the exact bytes before `;sig=`, fields in the order
//! they were added. This is the format Apache's `mod_auth_pubtkt` and the
//! downstream services expect in the `auth_pubtkt` cookie, so anything holding
//! the public key can verify a ticket without calling back to the broker.
//!
//! - [`TicketSigner`] holds the private key (loaded once at startup) and issues tickets.
//! - [`TicketVerifier`] holds only the public key and checks tickets.
//!
//! Signatures are RSA PKCS#1 v1.5 over SHA-256, which is deterministic: the same
//! fields signed with the same key always produce the same ticket.

mod error;
mod fields;
mod signer;

pub use error::TicketError;
pub use fields::{TicketFields, SIG_FIELD, UID_FIELD, VALID_UNTIL_FIELD};
pub use signer::{unix_now, TicketSigner, TicketVerifier, DEFAULT_VALIDITY};

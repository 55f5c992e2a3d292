// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0
//
//! A decoder for the API Set Namespace of Windows 10 and later.
//!
//! API Sets are dependencies of PE executables whose names start with "api-" or "ext-", e.g. `api-ms-win-core-sysinfo-l1-2-0`.
//! They don't exist as real DLL files.
//! Instead, the loader consults the API Set Namespace, a table mapped into every process and stored in the `.apiset`
//! section of `apisetschema.dll`, to find the real DLL implementing the contract (in this case: `kernelbase.dll`).
//!
//! The namespace is laid out entirely through byte offsets relative to its start.
//! This crate walks it through bounds-checked views and decodes its UTF-16 names to single-byte strings
//! using a configurable [`NarrowingPolicy`].
//!
//! # Examples
//!
//! To decode the whole namespace of a running system from the bytes of `apisetschema.dll`:
//!
//! ```no_run
//! # use apiset_namespace::{ApiSetNamespace, NamespaceAnalyser};
//! # use pelite::pe64::PeFile;
//! let dll = std::fs::read("apisetschema.dll").unwrap();
//! let pe_file = PeFile::from_bytes(&dll).unwrap();
//! let namespace = ApiSetNamespace::try_from_pe64(pe_file).unwrap();
//!
//! let mapping = NamespaceAnalyser::default().analyse_namespace(&namespace).unwrap();
//! let real_dll = mapping.resolve("api-ms-win-core-sysinfo-l1-2-0.dll").unwrap();
//! println!("api-ms-win-core-sysinfo-l1-2-0.dll -> {}", real_dll.target_name());
//! ```
//!
//! If you only need a single contract, look it up through the hash table without decoding everything:
//!
//! ```no_run
//! # use apiset_namespace::ApiSetNamespace;
//! # let namespace_bytes: &[u8] = &[];
//! let namespace = ApiSetNamespace::try_from_namespace_bytes(namespace_bytes).unwrap();
//! let contract_entry = namespace
//!     .lookup_contract("api-ms-win-core-sysinfo-l1-2-0")
//!     .unwrap()
//!     .into_contract_entry()
//!     .unwrap();
//! let value_entry = contract_entry.value_entries().unwrap().next().unwrap();
//!
//! println!("{} -> {}", contract_entry.name().unwrap(), value_entry.target().unwrap());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

mod helpers;

mod analyser;
mod contract_entry;
mod error;
mod hash_table;
mod mapping;
mod namespace;
mod narrow;
mod value_entry;

pub use analyser::*;
pub use contract_entry::*;
pub use error::*;
pub use hash_table::*;
pub use mapping::*;
pub use namespace::*;
pub use narrow::*;
pub use value_entry::*;

// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use alloc::vec::Vec;

use log::{debug, trace, warn};

use crate::error::Result;
use crate::mapping::{ApiSetMapping, RealDll};
use crate::namespace::{ApiSetNamespace, SchemaVersion};
use crate::narrow::{AsciiNarrowing, NameDecoder, NarrowingPolicy};
use crate::value_entry::ValueEntry;

/// Decodes a whole API Set Namespace into an [`ApiSetMapping`].
///
/// The analyser holds no state besides its [`NameDecoder`], so a single instance can be reused
/// for any number of namespaces.
#[derive(Clone, Copy, Debug)]
pub struct NamespaceAnalyser<P = AsciiNarrowing> {
    decoder: NameDecoder<P>,
}

impl Default for NamespaceAnalyser {
    fn default() -> Self {
        Self::with_decoder(NameDecoder::default())
    }
}

impl<P> NamespaceAnalyser<P> {
    /// Creates an analyser decoding names with the given narrowing policy.
    pub fn new(policy: P) -> Self {
        Self::with_decoder(NameDecoder::new(policy))
    }

    /// Creates an analyser decoding names with `decoder`.
    pub fn with_decoder(decoder: NameDecoder<P>) -> Self {
        Self { decoder }
    }

    /// Returns the decoder used for contract, target and alias names.
    pub fn decoder(&self) -> &NameDecoder<P> {
        &self.decoder
    }
}

impl<P> NamespaceAnalyser<P>
where
    P: NarrowingPolicy,
{
    /// Decodes the namespace starting at the first byte of `namespace_bytes`.
    ///
    /// This either returns the complete mapping or the first error encountered.
    pub fn analyse(&self, namespace_bytes: &[u8]) -> Result<ApiSetMapping> {
        let namespace = ApiSetNamespace::try_from_namespace_bytes(namespace_bytes)?;
        self.analyse_namespace(&namespace)
    }

    /// Decodes an already parsed namespace.
    pub fn analyse_namespace(&self, namespace: &ApiSetNamespace<'_>) -> Result<ApiSetMapping> {
        match namespace.version() {
            SchemaVersion::V6 => self.analyse_v6(namespace),
        }
    }

    fn analyse_v6(&self, namespace: &ApiSetNamespace<'_>) -> Result<ApiSetMapping> {
        let contract_entries = namespace.contract_entries()?;
        debug!(
            "Analysing {} contracts of a {} byte API Set Namespace",
            contract_entries.len(),
            namespace.as_bytes().len()
        );

        let mut mapping = ApiSetMapping::default();

        for contract_entry in contract_entries {
            let contract_name = self.decoder.decode(contract_entry.name()?);
            let real_dlls = contract_entry
                .value_entries()?
                .map(|value_entry| self.real_dll(&value_entry))
                .collect::<Result<Vec<_>>>()?;

            trace!("{} -> {:?}", contract_name, real_dlls);

            if mapping.contains(&contract_name) {
                // First entry wins.
                warn!(
                    "Discarding {} value(s) of duplicate contract \"{}\" at byte {}",
                    real_dlls.len(),
                    contract_name,
                    contract_entry.position()
                );
                mapping.discard_duplicate(contract_name);
            } else {
                mapping.insert(contract_name, real_dlls);
            }
        }

        Ok(mapping)
    }

    fn real_dll(&self, value_entry: &ValueEntry<'_>) -> Result<RealDll> {
        let target_name = self.decoder.decode(value_entry.target()?);
        let alias_name = self.decoder.decode(value_entry.alias()?);

        Ok(RealDll::new(target_name, alias_name))
    }
}

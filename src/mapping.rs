// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use alloc::collections::btree_map::{self, BTreeMap};
use alloc::string::String;
use alloc::vec::Vec;

/// A real DLL implementing a contract, as decoded from a [`ValueEntry`].
///
/// [`ValueEntry`]: crate::value_entry::ValueEntry
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RealDll {
    target_name: String,
    alias_name: String,
}

impl RealDll {
    /// Creates a [`RealDll`]. Pass an empty `alias_name` for a mapping without alias.
    pub fn new<T, A>(target_name: T, alias_name: A) -> Self
    where
        T: Into<String>,
        A: Into<String>,
    {
        Self {
            target_name: target_name.into(),
            alias_name: alias_name.into(),
        }
    }

    /// Returns the file name of the DLL, e.g. `kernelbase.dll`.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Returns the alias of this mapping, or an empty string if there is none.
    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    /// Returns `true` if this mapping has an alias.
    pub fn has_alias(&self) -> bool {
        !self.alias_name.is_empty()
    }
}

/// Fully decoded API Set Namespace: every contract name mapped to its real DLLs.
///
/// Contracts are ordered by name.
/// The real DLLs of each contract keep the order of the value entries, so the first one is the primary mapping.
///
/// This is returned by [`NamespaceAnalyser::analyse`].
///
/// [`NamespaceAnalyser::analyse`]: crate::analyser::NamespaceAnalyser::analyse
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ApiSetMapping {
    contracts: BTreeMap<String, Vec<RealDll>>,
    discarded_duplicates: Vec<String>,
}

impl ApiSetMapping {
    /// Returns `true` if `contract_name` is mapped. The comparison is exact.
    pub fn contains(&self, contract_name: &str) -> bool {
        self.contracts.contains_key(contract_name)
    }

    /// Returns the names of contracts that appeared more than once in the namespace.
    ///
    /// The first entry of such a contract is kept and the values of every later one are discarded.
    /// A name is listed once for each discarded entry.
    pub fn discarded_duplicates(&self) -> &[String] {
        &self.discarded_duplicates
    }

    /// Returns the real DLLs of `contract_name`. The comparison is exact.
    pub fn get(&self, contract_name: &str) -> Option<&[RealDll]> {
        self.contracts.get(contract_name).map(Vec::as_slice)
    }

    /// Consumes this mapping and returns the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Vec<RealDll>> {
        self.contracts
    }

    /// Returns `true` if no contract is mapped.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Returns an iterator over all contracts and their real DLLs, ordered by contract name.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<RealDll>> {
        self.contracts.iter()
    }

    /// Returns the number of mapped contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Returns the primary real DLL of `contract_name`.
    ///
    /// This is the first mapping without an alias, or the first mapping if all of them have one.
    pub fn primary_target(&self, contract_name: &str) -> Option<&RealDll> {
        self.get(contract_name).and_then(primary)
    }

    /// Resolves an imported DLL name like `API-MS-Win-Core-SysInfo-L1-2-0.dll` to its primary real DLL.
    ///
    /// The comparison is case-insensitive and the ".dll" extension is optional.
    /// If no contract has exactly this name, the contract sharing the name up to the last hyphen is used,
    /// preferring the one with the highest number after that hyphen.
    /// This way, an import of `...-l1-2-0` is served by a namespace that only knows `...-l1-2-3`.
    pub fn resolve(&self, dll_name: &str) -> Option<&RealDll> {
        self.find_contract(dll_name).and_then(primary)
    }

    /// Like [`resolve`](Self::resolve), but prefers the mapping whose alias names the importing module `importer`.
    pub fn resolve_for_importer(&self, dll_name: &str, importer: &str) -> Option<&RealDll> {
        let real_dlls = self.find_contract(dll_name)?;

        real_dlls
            .iter()
            .find(|real_dll| {
                real_dll.has_alias() && real_dll.alias_name.eq_ignore_ascii_case(importer)
            })
            .or_else(|| primary(real_dlls))
    }

    pub(crate) fn discard_duplicate(&mut self, contract_name: String) {
        self.discarded_duplicates.push(contract_name);
    }

    pub(crate) fn insert(&mut self, contract_name: String, real_dlls: Vec<RealDll>) {
        debug_assert!(!self.contracts.contains_key(&contract_name));
        self.contracts.insert(contract_name, real_dlls);
    }

    fn find_contract(&self, dll_name: &str) -> Option<&[RealDll]> {
        let lowercase_name = dll_name.to_ascii_lowercase();
        let name = lowercase_name
            .strip_suffix(".dll")
            .unwrap_or(&lowercase_name);

        if let Some(real_dlls) = self.get(name) {
            return Some(real_dlls);
        }

        let exact = self
            .contracts
            .iter()
            .find(|(contract_name, _)| contract_name.eq_ignore_ascii_case(name));
        if let Some((_, real_dlls)) = exact {
            return Some(real_dlls.as_slice());
        }

        // Revisions are compared as numbers, so "-10" beats "-9".
        let (name_prefix, _) = name.rsplit_once('-')?;
        self.contracts
            .iter()
            .filter_map(|(contract_name, real_dlls)| {
                let (contract_prefix, revision) = contract_name.rsplit_once('-')?;
                contract_prefix
                    .eq_ignore_ascii_case(name_prefix)
                    .then(|| (revision.parse::<u32>().ok(), real_dlls))
            })
            .max_by_key(|(revision, _)| *revision)
            .map(|(_, real_dlls)| real_dlls.as_slice())
    }
}

impl IntoIterator for ApiSetMapping {
    type Item = (String, Vec<RealDll>);
    type IntoIter = btree_map::IntoIter<String, Vec<RealDll>>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.into_iter()
    }
}

impl<'a> IntoIterator for &'a ApiSetMapping {
    type Item = (&'a String, &'a Vec<RealDll>);
    type IntoIter = btree_map::Iter<'a, String, Vec<RealDll>>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.iter()
    }
}

fn primary(real_dlls: &[RealDll]) -> Option<&RealDll> {
    real_dlls
        .iter()
        .find(|real_dll| !real_dll.has_alias())
        .or_else(|| real_dlls.first())
}

//! Builder for synthetic version 6 API Set Namespaces.
//!
//! Layout produced by [`NamespaceBuilder::build`]:
//! header, contract entries, value entries, hash entries, then all names.

#![allow(dead_code)]

pub const HEADER_SIZE: usize = 28;
pub const CONTRACT_ENTRY_SIZE: usize = 24;
pub const VALUE_ENTRY_SIZE: usize = 20;
pub const HASH_ENTRY_SIZE: usize = 8;
pub const HASH_FACTOR: u32 = 0x1f;

// Byte positions of fields inside their records.
pub const HEADER_VERSION: usize = 0;
pub const HEADER_SIZE_FIELD: usize = 4;
pub const HEADER_COUNT: usize = 12;
pub const HEADER_ENTRY_OFFSET: usize = 16;
pub const HEADER_HASH_OFFSET: usize = 20;
pub const CONTRACT_NAME_OFFSET: usize = 4;
pub const CONTRACT_NAME_LENGTH: usize = 8;
pub const CONTRACT_VALUE_OFFSET: usize = 16;
pub const CONTRACT_VALUE_COUNT: usize = 20;
pub const VALUE_NAME_OFFSET: usize = 4;
pub const VALUE_NAME_LENGTH: usize = 8;
pub const VALUE_VALUE_OFFSET: usize = 12;
pub const VALUE_VALUE_LENGTH: usize = 16;

struct Contract {
    name: String,
    flags: u32,
    values: Vec<(String, String)>,
}

pub struct NamespaceBuilder {
    version: u32,
    flags: u32,
    contracts: Vec<Contract>,
}

impl NamespaceBuilder {
    pub fn new() -> Self {
        Self {
            version: 6,
            flags: 0,
            contracts: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Adds a contract. Each value is an `(alias, target)` pair, an empty alias is stored with zero length.
    pub fn contract(self, name: &str, values: &[(&str, &str)]) -> Self {
        self.contract_with_flags(name, 0, values)
    }

    pub fn contract_with_flags(mut self, name: &str, flags: u32, values: &[(&str, &str)]) -> Self {
        self.contracts.push(Contract {
            name: name.to_owned(),
            flags,
            values: values
                .iter()
                .map(|(alias, target)| (alias.to_string(), target.to_string()))
                .collect(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let count = self.contracts.len();
        let value_total = self.contracts.iter().map(|c| c.values.len()).sum::<usize>();

        let entry_offset = HEADER_SIZE;
        let value_offset = entry_offset + count * CONTRACT_ENTRY_SIZE;
        let hash_offset = value_offset + value_total * VALUE_ENTRY_SIZE;
        let mut bytes = vec![0u8; hash_offset + count * HASH_ENTRY_SIZE];

        let mut hashes = Vec::new();
        let mut value_index = 0;

        for (index, contract) in self.contracts.iter().enumerate() {
            let (name_offset, name_length) = append_string(&mut bytes, &contract.name);
            let hashed_name = match contract.name.rfind('-') {
                Some(hyphen) => &contract.name[..hyphen],
                None => contract.name.as_str(),
            };
            let hashed_length = hashed_name.encode_utf16().count() * 2;

            let entry = entry_offset + index * CONTRACT_ENTRY_SIZE;
            write_u32(&mut bytes, entry, contract.flags);
            write_u32(&mut bytes, entry + CONTRACT_NAME_OFFSET, name_offset);
            write_u32(&mut bytes, entry + CONTRACT_NAME_LENGTH, name_length);
            write_u32(&mut bytes, entry + 12, hashed_length as u32);
            write_u32(
                &mut bytes,
                entry + CONTRACT_VALUE_OFFSET,
                (value_offset + value_index * VALUE_ENTRY_SIZE) as u32,
            );
            write_u32(
                &mut bytes,
                entry + CONTRACT_VALUE_COUNT,
                contract.values.len() as u32,
            );

            for (alias, target) in &contract.values {
                let (alias_offset, alias_length) = if alias.is_empty() {
                    (0, 0)
                } else {
                    append_string(&mut bytes, alias)
                };
                let (target_offset, target_length) = append_string(&mut bytes, target);

                let value = value_offset + value_index * VALUE_ENTRY_SIZE;
                write_u32(&mut bytes, value + VALUE_NAME_OFFSET, alias_offset);
                write_u32(&mut bytes, value + VALUE_NAME_LENGTH, alias_length);
                write_u32(&mut bytes, value + VALUE_VALUE_OFFSET, target_offset);
                write_u32(&mut bytes, value + VALUE_VALUE_LENGTH, target_length);
                value_index += 1;
            }

            hashes.push((hash(&hashed_name.to_ascii_lowercase()), index as u32));
        }

        hashes.sort_unstable();
        for (position, (hash, index)) in hashes.into_iter().enumerate() {
            let entry = hash_offset + position * HASH_ENTRY_SIZE;
            write_u32(&mut bytes, entry, hash);
            write_u32(&mut bytes, entry + 4, index);
        }

        let size = bytes.len() as u32;
        write_u32(&mut bytes, HEADER_VERSION, self.version);
        write_u32(&mut bytes, HEADER_SIZE_FIELD, size);
        write_u32(&mut bytes, 8, self.flags);
        write_u32(&mut bytes, HEADER_COUNT, count as u32);
        write_u32(&mut bytes, HEADER_ENTRY_OFFSET, entry_offset as u32);
        write_u32(&mut bytes, HEADER_HASH_OFFSET, hash_offset as u32);
        write_u32(&mut bytes, 24, HASH_FACTOR);

        bytes
    }
}

pub fn hash(name: &str) -> u32 {
    name.encode_utf16().fold(0u32, |acc, unit| {
        acc.wrapping_mul(HASH_FACTOR).wrapping_add(u32::from(unit))
    })
}

pub fn read_u32(bytes: &[u8], position: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[position..position + 4]);
    u32::from_le_bytes(raw)
}

pub fn write_u32(bytes: &mut [u8], position: usize, value: u32) {
    bytes[position..position + 4].copy_from_slice(&value.to_le_bytes());
}

/// Position of the `index`-th contract entry.
pub fn contract_entry(index: usize) -> usize {
    HEADER_SIZE + index * CONTRACT_ENTRY_SIZE
}

/// Position of the `index`-th value entry, counted across all contracts, in a namespace with `contract_count` contracts.
pub fn value_entry(contract_count: usize, index: usize) -> usize {
    HEADER_SIZE + contract_count * CONTRACT_ENTRY_SIZE + index * VALUE_ENTRY_SIZE
}

fn append_string(bytes: &mut Vec<u8>, s: &str) -> (u32, u32) {
    let offset = bytes.len();
    bytes.extend(s.encode_utf16().flat_map(u16::to_le_bytes));
    (offset as u32, (bytes.len() - offset) as u32)
}

mod common;

use anyhow::Result;
use apiset_namespace::{
    contract_hash, ApiSetError, ApiSetNamespace, ContractEntryFlags, ContractLookup, NameDecoder,
    NamespaceFlags, SchemaVersion,
};

use common::*;

fn sample() -> Vec<u8> {
    NamespaceBuilder::new()
        .flags(NamespaceFlags::SEALED.bits())
        .contract(
            "api-ms-win-core-sysinfo-l1-2-3",
            &[("", "kernelbase.dll"), ("kernel32.dll", "kernel32legacy.dll")],
        )
        .contract("api-ms-win-core-file-l1-1-0", &[("", "kernelbase.dll")])
        .contract_with_flags(
            "ext-ms-win-ntuser-window-l1-1-4",
            ContractEntryFlags::IS_EXTENSION.bits(),
            &[("", "user32.dll")],
        )
        .build()
}

#[test]
fn header_fields() -> Result<()> {
    let bytes = sample();
    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;

    assert_eq!(namespace.version(), SchemaVersion::V6);
    assert_eq!(namespace.version().raw(), 6);
    assert_eq!(namespace.count(), 3);
    assert_eq!(namespace.size() as usize, bytes.len());
    assert_eq!(namespace.flags(), NamespaceFlags::SEALED);
    assert_eq!(ApiSetNamespace::read_version(&bytes)?, 6);

    Ok(())
}

#[test]
fn read_version_of_unsupported_namespace() -> Result<()> {
    let bytes = NamespaceBuilder::new().version(2).build();

    assert_eq!(ApiSetNamespace::read_version(&bytes)?, 2);
    assert_eq!(
        SchemaVersion::try_from(2).unwrap_err(),
        ApiSetError::UnsupportedVersion { version: 2 }
    );

    Ok(())
}

#[test]
fn view_is_limited_to_announced_size() -> Result<()> {
    let mut bytes = sample();
    let size = bytes.len();
    bytes.extend_from_slice(&[0xcc; 64]);

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;
    assert_eq!(namespace.as_bytes().len(), size);

    Ok(())
}

#[test]
fn announced_size_below_header_size_is_ignored() -> Result<()> {
    let mut bytes = sample();
    write_u32(&mut bytes, HEADER_SIZE_FIELD, 0);

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;
    assert_eq!(namespace.size(), 0);
    assert_eq!(namespace.as_bytes().len(), bytes.len());
    assert_eq!(namespace.contract_entries()?.len(), 3);

    Ok(())
}

#[test]
fn entry_iterators() -> Result<()> {
    let bytes = sample();
    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;
    let decoder = NameDecoder::default();

    let contract_entries = namespace.contract_entries()?;
    assert_eq!(contract_entries.len(), 3);

    let names = contract_entries
        .map(|entry| entry.name().map(|name| decoder.decode(name)))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        names,
        [
            "api-ms-win-core-sysinfo-l1-2-3",
            "api-ms-win-core-file-l1-1-0",
            "ext-ms-win-ntuser-window-l1-1-4",
        ]
    );

    let first = namespace.contract_entries()?.next().unwrap();
    assert_eq!(first.value_count(), 2);
    assert!(first.flags().is_empty());
    assert!(first.hashed_name()? == "api-ms-win-core-sysinfo-l1-2");

    let mut value_entries = first.value_entries()?;
    assert_eq!(value_entries.len(), 2);

    let default = value_entries.next().unwrap();
    assert!(!default.has_alias());
    assert!(default.alias()? == "");
    assert!(default.target()? == "kernelbase.dll");

    let aliased = value_entries.next().unwrap();
    assert!(aliased.has_alias());
    assert!(aliased.alias()? == "kernel32.dll");
    assert!(aliased.target()? == "kernel32legacy.dll");

    assert!(value_entries.next().is_none());
    assert!(value_entries.next().is_none());

    let extension = namespace.contract_entries()?.nth(2).unwrap();
    assert_eq!(extension.flags(), ContractEntryFlags::IS_EXTENSION);
    assert!(namespace.contract_entries()?.nth(3).is_none());
    assert!(namespace.contract_entries()?.nth(usize::MAX).is_none());

    Ok(())
}

#[test]
fn hash_table_is_sorted() -> Result<()> {
    let bytes = sample();
    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;
    let hash_table = namespace.hash_table()?;

    assert_eq!(hash_table.len(), 3);
    assert!(hash_table
        .windows(2)
        .all(|pair| pair[0].hash() <= pair[1].hash()));

    let sysinfo_hash = contract_hash("api-ms-win-core-sysinfo-l1-2", namespace.hash_factor());
    assert_eq!(sysinfo_hash, hash("api-ms-win-core-sysinfo-l1-2"));

    let sysinfo = hash_table
        .iter()
        .find(|entry| entry.hash() == sysinfo_hash)
        .unwrap();
    assert_eq!(sysinfo.index(), 0);

    Ok(())
}

#[test]
fn lookup_contract() -> Result<()> {
    let bytes = sample();
    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;

    for name in [
        "api-ms-win-core-sysinfo-l1-2-3",
        "api-ms-win-core-sysinfo-l1-2-0",
        "API-MS-Win-Core-SysInfo-L1-2-0.dll",
    ] {
        match namespace.lookup_contract(name)? {
            ContractLookup::Found {
                index,
                contract_entry,
            } => {
                assert_eq!(index, 0);
                assert!(contract_entry.name()? == "api-ms-win-core-sysinfo-l1-2-3");
            }
            other => panic!("{name} was not found: {other:?}"),
        }
    }

    let entry = namespace
        .lookup_contract("ext-ms-win-ntuser-window-l1-1-0.dll")?
        .into_contract_entry()
        .unwrap();
    assert!(entry.value_entries()?.next().unwrap().target()? == "user32.dll");

    for name in ["api-ms-win-core-sysinfo-l2-1-0", "kernel32", ""] {
        assert!(matches!(
            namespace.lookup_contract(name)?,
            ContractLookup::NotFound
        ));
    }

    Ok(())
}

#[test]
fn lookup_contract_with_corrupt_index() {
    let mut bytes = sample();
    let hash_offset = read_u32(&bytes, HEADER_HASH_OFFSET) as usize;
    for position in 0..3 {
        write_u32(&mut bytes, hash_offset + position * HASH_ENTRY_SIZE + 4, 1000);
    }

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes).unwrap();
    assert!(matches!(
        namespace.lookup_contract("api-ms-win-core-file-l1-1-0"),
        Ok(ContractLookup::IndexOutOfRange { index: 1000 })
    ));
}

#[test]
fn lookup_contract_reports_hash_collision() {
    let mut bytes = sample();
    let hash_offset = read_u32(&bytes, HEADER_HASH_OFFSET) as usize;

    // Point every record to the next contract, so no hash leads to its own name.
    for position in 0..3 {
        let index_position = hash_offset + position * HASH_ENTRY_SIZE + 4;
        let index = read_u32(&bytes, index_position);
        write_u32(&mut bytes, index_position, (index + 1) % 3);
    }

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes).unwrap();
    let lookup = namespace
        .lookup_contract("api-ms-win-core-sysinfo-l1-2-3")
        .unwrap();
    assert!(!lookup.is_found());
    assert!(matches!(lookup, ContractLookup::HashCollision { index: 1 }));
}

#[test]
fn hash_table_beyond_namespace() {
    let mut bytes = sample();
    write_u32(&mut bytes, HEADER_HASH_OFFSET, u32::MAX - 4);

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes).unwrap();
    assert!(matches!(
        namespace.lookup_contract("api-ms-win-core-file-l1-1-0"),
        Err(ApiSetError::HashTableOutOfBounds { .. })
    ));
}

#[test]
fn empty_hash_table_ignores_offset() -> Result<()> {
    let mut bytes = NamespaceBuilder::new().build();
    write_u32(&mut bytes, HEADER_HASH_OFFSET, 0x10000);

    let namespace = ApiSetNamespace::try_from_namespace_bytes(&bytes)?;
    assert!(namespace.hash_table()?.is_empty());
    assert!(matches!(
        namespace.lookup_contract("api-ms-win-core-file-l1-1-0")?,
        ContractLookup::NotFound
    ));

    Ok(())
}

use std::fs;

use anyhow::{bail, Result};
use apiset_namespace::{ApiSetNamespace, LocaleNarrowing, NamespaceAnalyser};
use pelite::pe64::PeFile;

fn main() -> Result<()> {
    let args = std::env::args().collect::<Vec<_>>();

    if args.len() != 2 {
        println!("Usage: dump_apiset_map <FILENAME>");
        println!("Example: dump_apiset_map C:\\Windows\\system32\\apisetschema.dll");
        bail!("Aborted");
    }

    let filename = &args[1];

    let dll = fs::read(filename)?;
    let pe_file = PeFile::from_bytes(&dll)?;
    let namespace = ApiSetNamespace::try_from_pe64(pe_file)?;

    // Narrow names like the C++ runtime does for the user's locale.
    let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|value| !value.is_empty()))
        .unwrap_or_default();
    let analyser = NamespaceAnalyser::new(LocaleNarrowing::from_locale_name(&locale));
    let mapping = analyser.analyse_namespace(&namespace)?;

    println!(
        "API Set Namespace v{} with {} contracts ({:?})",
        namespace.version().raw(),
        mapping.len(),
        namespace.flags()
    );

    for (contract_name, real_dlls) in &mapping {
        println!("● Contract: \"{}\"", contract_name);

        for real_dll in real_dlls {
            if real_dll.has_alias() {
                println!(
                    "  ○ \"{}\" (for \"{}\")",
                    real_dll.target_name(),
                    real_dll.alias_name()
                );
            } else {
                println!("  ○ \"{}\"", real_dll.target_name());
            }
        }
    }

    for duplicate in mapping.discarded_duplicates() {
        println!("Discarded duplicate contract \"{}\"", duplicate);
    }

    Ok(())
}

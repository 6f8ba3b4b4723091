use kiln_core::ProcessorDescriptor;

/// Whether every ABI-affecting annotation processor can run during interface
/// generation from source.
pub fn plugins_support_source_only_abi(processors: &[ProcessorDescriptor]) -> bool {
    processors
        .iter()
        .all(|p| !p.affects_abi || p.supports_abi_from_source)
}

/// The processors that run during source-only interface generation: only the
/// ABI-affecting ones; the rest would only produce implementation output the
/// interface does not need.
pub fn abi_processors_only(processors: &[ProcessorDescriptor]) -> Vec<ProcessorDescriptor> {
    processors
        .iter()
        .filter(|p| p.affects_abi)
        .cloned()
        .collect()
}

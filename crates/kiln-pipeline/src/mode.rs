use kiln_core::{AbiGenerationMode, ProcessorDescriptor};

use crate::config::CompilerConfig;
use crate::processor::plugins_support_source_only_abi;

/// Select the effective ABI-generation mode for one module.
///
/// Pure: starts from the module's explicit request (or the configured
/// default) and applies the downgrade rules in order. The result never names
/// a strategy the configuration disallows.
pub fn select_abi_mode(
    requested: Option<AbiGenerationMode>,
    config: &CompilerConfig,
    processors: &[ProcessorDescriptor],
    source_only_allowed: bool,
) -> AbiGenerationMode {
    let mode = requested.unwrap_or(config.abi_generation_mode);

    if mode == AbiGenerationMode::Class {
        return mode;
    }

    if !config.generate_source_abi && !config.generate_source_only_abi {
        return AbiGenerationMode::Class;
    }

    if mode != AbiGenerationMode::Source
        && (!source_only_allowed || !plugins_support_source_only_abi(processors))
    {
        return AbiGenerationMode::Source;
    }

    if mode == AbiGenerationMode::MigratingToSourceOnly && !config.migrate_to_source_only_abi {
        return AbiGenerationMode::Source;
    }

    if mode == AbiGenerationMode::SourceOnly && !config.generate_source_only_abi {
        return AbiGenerationMode::Source;
    }

    mode
}

//! A compiler backed by the `forge` toolchain
//!
//! Contracts are built with the compiler settings they are deployed &
//! verified with, then loaded back from forge's artifact layout:
//! `out/<Source>.sol/<Name>.json` for each contract and
//! `out/build-info/<id>.json` for the compiler input.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    process::Stdio,
    str::FromStr,
    time::SystemTime,
};

use alloy::primitives::{keccak256, Bytes};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    constants::{
        BUILD_COMMAND, BUILD_INFO_PATH_SEGMENT, FORGE_COMMAND, JSON_EXTENSION, OPTIMIZER_RUNS,
        OUT_PATH_SEGMENT, SOLC_VERSION,
    },
    errors::ScriptError,
    types::{CompilationOutput, CompiledContract, Contract, SourceBundle},
    utils::{command_success_or, export_abis},
};

use super::Compiler;

/// Compiles the contracts project with `forge build`.
///
/// Assumes that `forge` is locally available.
pub struct ForgeCompiler {
    /// The root of the contracts project
    project_root: PathBuf,
    /// Where to export ABIs after compiling, if anywhere
    abi_dir: Option<PathBuf>,
}

impl ForgeCompiler {
    /// Create a compiler for the project at `project_root`
    pub fn new(project_root: PathBuf, abi_dir: Option<PathBuf>) -> Self {
        Self {
            project_root,
            abi_dir,
        }
    }

    /// The directory forge writes artifacts to
    fn out_dir(&self) -> PathBuf {
        self.project_root.join(OUT_PATH_SEGMENT)
    }
}

#[async_trait]
impl Compiler for ForgeCompiler {
    async fn compile(&self) -> Result<CompilationOutput, ScriptError> {
        let mut build_cmd = Command::new(FORGE_COMMAND);
        build_cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        build_cmd.arg(BUILD_COMMAND);
        build_cmd.arg("--root");
        build_cmd.arg(&self.project_root);
        // Pin the compiler & optimizer settings the contracts are verified with
        build_cmd.arg("--use");
        build_cmd.arg(SOLC_VERSION);
        build_cmd.arg("--optimize");
        build_cmd.arg("--optimizer-runs");
        build_cmd.arg(OPTIMIZER_RUNS.to_string());
        // Build info carries the standard JSON input needed for verification
        build_cmd.arg("--build-info");

        command_success_or(build_cmd, "Failed to compile contracts").await?;

        let mut output = load_compilation(&self.out_dir())?;

        if let Some(abi_dir) = &self.abi_dir {
            let paths = export_abis(abi_dir, output.contracts.values())?;
            info!("Exported {} ABIs to {}", paths.len(), abi_dir.display());
            output.abi_dir = Some(abi_dir.clone());
        }

        Ok(output)
    }
}

// -------------
// | Artifacts |
// -------------

/// The subset of a forge artifact the scripts use
#[derive(Deserialize)]
struct ForgeArtifact {
    /// The contract ABI
    abi: Value,
    /// The creation bytecode
    bytecode: ForgeBytecode,
    /// The solc metadata
    metadata: ForgeMetadata,
}

/// Bytecode as it appears in a forge artifact
#[derive(Deserialize)]
struct ForgeBytecode {
    /// Hex-encoded bytecode, possibly containing unlinked library placeholders
    object: String,
}

/// Solc metadata as it appears in a forge artifact
#[derive(Deserialize)]
struct ForgeMetadata {
    /// The compiler settings
    settings: ForgeMetadataSettings,
    /// The hashes of the sources the artifact was compiled from
    #[serde(default)]
    sources: BTreeMap<String, ForgeMetadataSource>,
}

/// A source entry in the solc metadata
#[derive(Deserialize)]
struct ForgeMetadataSource {
    /// The keccak256 hash of the source file's contents
    keccak256: String,
}

/// The compiler settings recorded in the solc metadata
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForgeMetadataSettings {
    /// Maps the compiled source path to the contract name
    compilation_target: BTreeMap<String, String>,
}

/// A forge build info file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    /// The full compiler version
    solc_long_version: String,
    /// The standard JSON input
    input: Value,
}

/// Load every contract the scripts need from a forge output directory
pub fn load_compilation(out_dir: &Path) -> Result<CompilationOutput, ScriptError> {
    let contracts = Contract::ALL
        .into_iter()
        .map(|contract| Ok((contract, load_artifact(out_dir, contract)?)))
        .collect::<Result<HashMap<_, _>, ScriptError>>()?;

    Ok(CompilationOutput {
        contracts,
        abi_dir: None,
    })
}

/// Load a single contract's artifact, along with the source bundle of the
/// build that produced it, from a forge output directory
pub fn load_artifact(out_dir: &Path, contract: Contract) -> Result<CompiledContract, ScriptError> {
    let name = contract.artifact_name();
    let file_name = format!("{}.{}", name, JSON_EXTENSION);

    let artifact_path = fs::read_dir(out_dir)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", out_dir.display(), e)))?
        .find_map(|entry| {
            let path = entry.ok()?.path().join(&file_name);
            path.is_file().then_some(path)
        })
        .ok_or_else(|| {
            ScriptError::ContractCompilation(format!(
                "no artifact for {} in {}",
                name,
                out_dir.display()
            ))
        })?;
    debug!("Loading {} from {}", name, artifact_path.display());

    let contents = fs::read_to_string(&artifact_path)
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    let artifact: ForgeArtifact = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", name, e)))?;

    let bytecode = Bytes::from_str(&artifact.bytecode.object)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{} bytecode: {}", name, e)))?;
    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "{} has no bytecode, is it abstract?",
            name
        )));
    }

    let source_path = artifact
        .metadata
        .settings
        .compilation_target
        .into_iter()
        .find_map(|(path, target)| (target == name).then_some(path))
        .ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("no compilation target for {}", name))
        })?;

    let source_hash = artifact
        .metadata
        .sources
        .get(&source_path)
        .map(|source| source.keccak256.as_str());
    let source = load_source_bundle(out_dir, &source_path, source_hash)?;

    Ok(CompiledContract {
        contract,
        source_path,
        abi: artifact.abi,
        bytecode,
        source,
    })
}

/// Find the build info that compiled `source_path` in a forge output directory.
///
/// Incremental builds leave stale build info files behind, so several may
/// cover the same source. When the artifact records the hash of its source,
/// only build info whose copy of the source matches it is considered. Of the
/// remaining candidates the most recently written one is used.
pub fn load_source_bundle(
    out_dir: &Path,
    source_path: &str,
    source_hash: Option<&str>,
) -> Result<SourceBundle, ScriptError> {
    let build_info_dir = out_dir.join(BUILD_INFO_PATH_SEGMENT);
    let entries = fs::read_dir(&build_info_dir).map_err(|e| {
        ScriptError::ArtifactParsing(format!("{}: {}", build_info_dir.display(), e))
    })?;

    let mut newest: Option<(SystemTime, BuildInfo)> = None;
    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
            continue;
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        let build_info: BuildInfo = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        let Some(source) = build_info.input["sources"].get(source_path) else {
            continue;
        };
        if let Some(hash) = source_hash {
            let content = source["content"].as_str().unwrap_or_default();
            if !format!("{:#x}", keccak256(content)).eq_ignore_ascii_case(hash) {
                debug!("Skipping stale build info {}", path.display());
                continue;
            }
        }

        let modified = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        let is_newer = match &newest {
            Some((time, _)) => modified > *time,
            None => true,
        };
        if is_newer {
            newest = Some((modified, build_info));
        }
    }

    let (_, build_info) = newest.ok_or_else(|| {
        ScriptError::ArtifactParsing(format!("no build info covering {}", source_path))
    })?;
    Ok(SourceBundle {
        compiler_version: build_info.solc_long_version,
        standard_json_input: build_info.input,
    })
}

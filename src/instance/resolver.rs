//! Resolve the Piral instance from the pilet's project descriptors.
//!
//! # Resolution Order
//! 1. `pilet.json` → `piralInstances`: the entry marked `selected`,
//!    otherwise the first declared entry
//! 2. `package.json` → `piral.name`
//! 3. Nothing found → fatal

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::instance::{InstanceError, PiralInstance};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PiletJson {
    // serde_json is built with `preserve_order`, so the map keeps declaration order.
    piral_instances: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct PiralInstanceOptions {
    selected: Option<bool>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    piral: Option<PackagePiralSection>,
}

#[derive(Debug, Deserialize)]
struct PackagePiralSection {
    name: Option<String>,
}

/// Determine the instance from `pilet.json`, falling back to `package.json`.
pub fn find_piral_instance(
    pilet_json: &Path,
    package_json: &Path,
) -> Result<PiralInstance, InstanceError> {
    if pilet_json.is_file() {
        let pilet: PiletJson = read_json(pilet_json)?;

        if let Some(instance) = pilet.piral_instances.as_ref().and_then(select_instance) {
            tracing::debug!(name = %instance.name, source = %pilet_json.display(), "Instance from pilet.json");
            return Ok(instance);
        }
    }

    if package_json.is_file() {
        let package: PackageJson = read_json(package_json)?;

        if let Some(name) = package.piral.and_then(|piral| piral.name) {
            tracing::debug!(name = %name, source = %package_json.display(), "Instance from package.json");
            return Ok(PiralInstance::new(name, false));
        }
    }

    Err(InstanceError::NotFound)
}

fn select_instance(instances: &serde_json::Map<String, serde_json::Value>) -> Option<PiralInstance> {
    let parsed: Vec<(&String, PiralInstanceOptions)> = instances
        .iter()
        .map(|(name, value)| {
            let options = serde_json::from_value(value.clone()).unwrap_or_default();
            (name, options)
        })
        .collect();

    parsed
        .iter()
        .find(|(_, options)| options.selected.unwrap_or(false))
        .or_else(|| parsed.first())
        .map(|(name, options)| {
            let is_website = options.url.as_deref().is_some_and(|url| !url.is_empty());
            PiralInstance::new(name.as_str(), is_website)
        })
}

/// Files of a website emulator package.
///
/// Only packages whose `piralCLI.source` is an http(s) URL are emulators; for
/// anything else, or a missing manifest, the list is empty.
pub fn website_emulator_files(package_json: &Path) -> Vec<String> {
    #[derive(Debug, Deserialize)]
    struct EmulatorPackage {
        #[serde(rename = "piralCLI")]
        piral_cli: Option<BTreeMap<String, serde_json::Value>>,
        #[serde(default)]
        files: Vec<String>,
    }

    if !package_json.is_file() {
        return Vec::new();
    }

    let package: EmulatorPackage = match read_json(package_json) {
        Ok(package) => package,
        Err(e) => {
            tracing::warn!(path = %package_json.display(), error = %e, "Unreadable app shell package");
            return Vec::new();
        }
    };

    let source = package
        .piral_cli
        .as_ref()
        .and_then(|cli| cli.get("source"))
        .and_then(|source| source.as_str());

    match source {
        Some(source) if source.starts_with("http://") || source.starts_with("https://") => {
            package.files
        }
        _ => Vec::new(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, InstanceError> {
    let content = fs::read_to_string(path).map_err(|source| InstanceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| InstanceError::Parse {
        path: path.display().to_string(),
        source,
    })
}

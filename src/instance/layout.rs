//! Filesystem layout derived from the process arguments.

use std::path::{Path, PathBuf};

use crate::instance::PiralInstance;

/// Where everything lives for one pilet debugging session.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// The compiled application (`--applicationpath`).
    pub application_path: PathBuf,
    /// Directory containing the application.
    pub application_dir: PathBuf,
    /// Application file name without extension.
    pub app_id: String,
    /// Output directory (`--outdir`), as given.
    pub out_path: PathBuf,
    /// `<cwd>/<outdir>/<app id>`
    pub pilet_dir: PathBuf,
    /// Static web assets manifest of the application.
    pub static_assets_manifest: PathBuf,
}

impl ProjectLayout {
    /// Derive the layout relative to `cwd`.
    pub fn new(application_path: &Path, out_path: &Path, cwd: &Path) -> Self {
        let application_dir = application_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let app_id = application_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pilet_dir = cwd.join(out_path).join(&app_id);

        let runtime_manifest = application_path.with_extension("staticwebassets.runtime.json");
        let static_assets_manifest = if runtime_manifest.is_file() {
            runtime_manifest
        } else {
            application_path.with_extension("StaticWebAssets.xml")
        };

        Self {
            application_path: application_path.to_path_buf(),
            application_dir,
            app_id,
            out_path: out_path.to_path_buf(),
            pilet_dir,
            static_assets_manifest,
        }
    }

    pub fn pilet_json(&self) -> PathBuf {
        self.pilet_dir.join("pilet.json")
    }

    pub fn package_json(&self) -> PathBuf {
        self.pilet_dir.join("package.json")
    }

    /// Build output of the pilet, served under `<api>/0/`.
    pub fn dist_dir(&self) -> PathBuf {
        self.pilet_dir.join("dist")
    }

    /// Default location of the dev server settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.application_dir.join("blazor-devserversettings.json")
    }

    /// Installed app shell package.
    pub fn app_shell_root(&self, instance: &PiralInstance) -> PathBuf {
        self.pilet_dir.join("node_modules").join(&instance.name)
    }

    /// Physical files of the app shell.
    pub fn app_dir(&self, instance: &PiralInstance) -> PathBuf {
        self.app_shell_root(instance).join("app")
    }
}

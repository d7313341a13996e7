use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, LinearModel, ModelArtifacts, Predictor, TfidfVectorizer};

pub const ARTIFACTS_ENV_VAR: &str = "EMAIL_TRIAGE_ARTIFACTS";

const VECTORIZER_FILE: &str = "vectorizer.json";
const MODEL_FILE: &str = "model.json";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to parse {file_type} file: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid artifacts: {0}")]
    Invalid(#[from] ClassifierError),
}

/// SHA-256 digests of the artifact files, checked on load when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub vectorizer_sha256: String,
    pub model_sha256: String,
}

/// Locates, verifies and loads the persisted vectorizer/model pair.
///
/// An artifact directory holds `vectorizer.json`, `model.json` and an
/// optional `manifest.json` with their SHA-256 digests.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates an ArtifactStore reading from the default artifacts directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("email-triage").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("email-triage").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("email-triage").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> Self {
        Self {
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn get_vectorizer_path(&self) -> PathBuf {
        self.artifacts_dir.join(VECTORIZER_FILE)
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.artifacts_dir.join(MODEL_FILE)
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.artifacts_dir.join(MANIFEST_FILE)
    }

    /// Whether both artifact files exist
    pub fn is_available(&self) -> bool {
        let vectorizer_path = self.get_vectorizer_path();
        let model_path = self.get_model_path();
        log::debug!("Checking artifacts:");
        log::debug!("  Vectorizer path: {:?} (exists: {})", vectorizer_path, vectorizer_path.exists());
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        vectorizer_path.exists() && model_path.exists()
    }

    /// Reads the manifest, if the directory has one
    pub fn read_manifest(&self) -> Result<Option<ArtifactManifest>, ArtifactError> {
        let path = self.get_manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let manifest = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::ParseError {
            file_type: "manifest".to_string(),
            source,
        })?;
        Ok(Some(manifest))
    }

    /// Checks both files against the manifest, using the same digest check
    /// as `load`.
    ///
    /// Returns `false` when either file is missing or a digest differs, and
    /// `true` when both match or there is no manifest to check against.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        if !self.is_available() {
            log::info!("One or both artifact files do not exist");
            return Ok(false);
        }
        let Some(manifest) = self.read_manifest()? else {
            log::info!("No manifest in {:?}, skipping digest check", self.artifacts_dir);
            return Ok(true);
        };

        let vectorizer_ok =
            self.matches_manifest(&self.get_vectorizer_path(), "vectorizer", &manifest.vectorizer_sha256)?;
        let model_ok = self.matches_manifest(&self.get_model_path(), "model", &manifest.model_sha256)?;

        log::info!("Verification results:");
        log::info!("  Vectorizer hash verification: {}", vectorizer_ok);
        log::info!("  Model hash verification: {}", model_ok);

        Ok(vectorizer_ok && model_ok)
    }

    fn matches_manifest(&self, path: &Path, file_type: &str, expected: &str) -> Result<bool, ArtifactError> {
        match self.read_checked(path, file_type, Some(expected)) {
            Ok(_) => Ok(true),
            Err(ArtifactError::HashMismatch { .. } | ArtifactError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Loads the vectorizer and model as one unit.
    ///
    /// # Errors
    /// - `NotFound` if either file is missing
    /// - `HashMismatch` if a manifest is present and a digest differs
    /// - `ParseError` if a file is not a valid artifact
    /// - `Invalid` if the vectorizer and model widths disagree
    pub fn load(&self) -> Result<ModelArtifacts, ArtifactError> {
        log::info!("Loading artifacts from {:?}", self.artifacts_dir);
        let manifest = self.read_manifest()?;

        let vectorizer_bytes = self.read_checked(
            &self.get_vectorizer_path(),
            "vectorizer",
            manifest.as_ref().map(|m| m.vectorizer_sha256.as_str()),
        )?;
        let model_bytes = self.read_checked(
            &self.get_model_path(),
            "model",
            manifest.as_ref().map(|m| m.model_sha256.as_str()),
        )?;

        let vectorizer: TfidfVectorizer =
            serde_json::from_slice(&vectorizer_bytes).map_err(|source| ArtifactError::ParseError {
                file_type: "vectorizer".to_string(),
                source,
            })?;
        let model: LinearModel = serde_json::from_slice(&model_bytes).map_err(|source| ArtifactError::ParseError {
            file_type: "model".to_string(),
            source,
        })?;

        log::info!(
            "Loaded vectorizer ({} terms) and model ({} classes)",
            vectorizer.vocabulary_size(),
            model.classes().len()
        );
        Ok(ModelArtifacts::new(vectorizer, model)?)
    }

    /// Loads the artifacts, or returns `None` after logging why they could
    /// not be loaded. The caller then runs heuristic-only.
    pub fn load_or_absent(&self) -> Option<ModelArtifacts> {
        match self.load() {
            Ok(artifacts) => Some(artifacts),
            Err(e) => {
                log::warn!("Model or vectorizer not loaded ({}); running heuristic-only", e);
                None
            }
        }
    }

    /// Writes a fitted vectorizer and model into the directory, along with a
    /// manifest of their digests.
    pub fn save(&self, vectorizer: &TfidfVectorizer, model: &LinearModel) -> Result<ArtifactManifest, ArtifactError> {
        fs::create_dir_all(&self.artifacts_dir)?;

        let vectorizer_bytes = serde_json::to_vec_pretty(vectorizer).map_err(|source| ArtifactError::ParseError {
            file_type: "vectorizer".to_string(),
            source,
        })?;
        let model_bytes = serde_json::to_vec_pretty(model).map_err(|source| ArtifactError::ParseError {
            file_type: "model".to_string(),
            source,
        })?;

        let manifest = ArtifactManifest {
            vectorizer_sha256: sha256_hex(&vectorizer_bytes),
            model_sha256: sha256_hex(&model_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|source| ArtifactError::ParseError {
            file_type: "manifest".to_string(),
            source,
        })?;

        log::info!("Writing artifacts to {:?}", self.artifacts_dir);
        fs::write(self.get_vectorizer_path(), vectorizer_bytes)?;
        fs::write(self.get_model_path(), model_bytes)?;
        fs::write(self.get_manifest_path(), manifest_bytes)?;
        Ok(manifest)
    }

    fn read_checked(&self, path: &Path, file_type: &str, expected_hash: Option<&str>) -> Result<Vec<u8>, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        log::debug!("Read {} bytes from {:?}", bytes.len(), path);

        if let Some(expected) = expected_hash {
            let actual = sha256_hex(&bytes);
            if actual != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
                return Err(ArtifactError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(bytes)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

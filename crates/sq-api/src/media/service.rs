use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const SIGNATURE_ALGORITHM: &str = "sha256";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Everything the browser needs to upload one file directly.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUpload {
    pub upload_url: String,
    pub api_key: String,
    pub cloud_name: String,
    pub folder: String,
    pub timestamp: i64,
    pub signature: String,
    pub signature_algorithm: &'static str,
}

#[derive(Clone)]
pub struct MediaService {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_folder: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl MediaService {
    pub fn new(
        cloud_name: &str,
        api_key: &str,
        api_secret: &str,
        base_folder: &str,
    ) -> anyhow::Result<Self> {
        let base_folder = base_folder.trim_matches('/');
        if !is_valid_folder(base_folder) {
            anyhow::bail!("MEDIA_FOLDER '{base_folder}' is not a valid folder name");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            base_folder: base_folder.to_string(),
        })
    }

    /// SHA-256 over `k=v` pairs sorted by key and joined with `&`, followed
    /// by the API secret, hex encoded.
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let joined = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Sign an upload into the base folder, or a subfolder of it.
    pub fn sign_upload(
        &self,
        resource_type: ResourceType,
        subfolder: Option<&str>,
        timestamp: i64,
    ) -> Result<SignedUpload, ApiError> {
        let folder = match subfolder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            Some(sub) if is_valid_folder(sub) => format!("{}/{sub}", self.base_folder),
            Some(_) => {
                return Err(ApiError::Validation(
                    "Folder may only contain lowercase letters, digits, '-', '_' and '/'"
                        .to_string(),
                ));
            }
            None => self.base_folder.clone(),
        };

        let params = BTreeMap::from([
            ("folder", folder.clone()),
            ("timestamp", timestamp.to_string()),
        ]);

        Ok(SignedUpload {
            upload_url: format!(
                "{API_BASE}/{}/{}/upload",
                self.cloud_name,
                resource_type.as_str()
            ),
            api_key: self.api_key.clone(),
            cloud_name: self.cloud_name.clone(),
            folder,
            timestamp,
            signature: self.sign(&params),
            signature_algorithm: SIGNATURE_ALGORITHM,
        })
    }

    /// Assets outside the base folder belong to someone else.
    pub fn owns_public_id(&self, public_id: &str) -> bool {
        public_id
            .strip_prefix(&self.base_folder)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|rest| !rest.is_empty() && !rest.split('/').any(|s| s == ".."))
    }

    /// Delete an asset. Returns the provider's result (`ok` or `not found`).
    pub async fn destroy(
        &self,
        resource_type: ResourceType,
        public_id: &str,
        timestamp: i64,
    ) -> Result<String, ApiError> {
        let params = BTreeMap::from([
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ]);
        let signature = self.sign(&params);

        let body = serde_json::json!({
            "public_id": public_id,
            "timestamp": timestamp,
            "api_key": self.api_key,
            "signature": signature,
            "signature_algorithm": SIGNATURE_ALGORITHM,
        });

        let url = format!(
            "{API_BASE}/{}/{}/destroy",
            self.cloud_name,
            resource_type.as_str()
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Media(format!("Destroy request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Media(format!("Provider returned {status}: {text}")));
        }

        let parsed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Media(format!("Unexpected destroy response: {e}")))?;

        Ok(parsed.result)
    }
}

fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder.len() <= 100
        && folder.split('/').all(|segment| {
            !segment.is_empty()
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        })
}

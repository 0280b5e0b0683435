use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Storage backend trait for persisting credential state
///
/// Abstracts over the OS keyring and the encrypted-filesystem fallback so
/// token storage does not care where the bytes live.
pub trait StorageBackend: Send + Sync {
    /// Write data to storage at the specified relative path
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;

    /// Read data from storage at the specified relative path
    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>>;

    /// Check whether anything is stored at the specified relative path
    fn exists(&self, path: &str) -> bool;

    /// Remove whatever is stored at the specified relative path
    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}

/// Storage errors
#[derive(Debug)]
pub enum StorageError {
    /// IO error
    Io(std::io::Error),
    /// Configuration or serialization error
    Config(String),
    /// Keyring error
    Keyring(String),
    /// Path error
    Path(String),
    /// Encryption error
    Encryption(String),
    /// Encryption key handling error
    KeyStorage(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Config(msg) => write!(f, "Configuration error: {}", msg),
            StorageError::Keyring(msg) => write!(f, "Keyring error: {}", msg),
            StorageError::Path(msg) => write!(f, "Path error: {}", msg),
            StorageError::Encryption(msg) => write!(f, "Encryption error: {}", msg),
            StorageError::KeyStorage(msg) => write!(f, "Key storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<keyring::Error> for StorageError {
    fn from(err: keyring::Error) -> Self {
        StorageError::Keyring(err.to_string())
    }
}

/// The on-disk configuration directory for this client
///
/// `CRAEDL_CONFIG_DIR` overrides the default, which is the platform
/// configuration directory plus `craedl` (`~/.config/craedl` on Linux).
pub fn config_dir() -> Result<PathBuf, StorageError> {
    if let Ok(dir) = std::env::var("CRAEDL_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join("craedl"))
        .ok_or_else(|| StorageError::Path("cannot determine configuration directory".to_string()))
}

/// Keyring-based storage for secure credentials
///
/// Uses the OS-native credential store: Keychain on macOS, Secret Service
/// on Linux, Credential Manager on Windows.
pub struct KeyringStorage {
    service_name: String,
}

impl KeyringStorage {
    /// Create a new keyring storage with the specified service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, path: &str) -> Result<keyring::Entry, StorageError> {
        // The relative path doubles as the account identifier.
        keyring::Entry::new(&self.service_name, path)
            .map_err(|e| StorageError::Keyring(format!("Failed to create keyring entry: {}", e)))
    }
}

impl StorageBackend for KeyringStorage {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();
        let data = data.to_vec();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            let data_str = String::from_utf8(data)
                .map_err(|e| StorageError::Config(format!("Invalid UTF-8 data: {}", e)))?;

            entry.set_password(&data_str)?;
            tracing::debug!(
                "Stored entry in keyring: service={}, path={}",
                service_name,
                path
            );
            Ok(())
        })
    }

    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>> {
        let path = path.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            let password = entry.get_password()?;
            Ok(password.into_bytes())
        })
    }

    fn exists(&self, path: &str) -> bool {
        if let Ok(entry) = self.entry(path) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }

    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            entry.delete_credential()?;
            tracing::debug!(
                "Removed entry from keyring: service={}, path={}",
                service_name,
                path
            );
            Ok(())
        })
    }
}

/// Encrypted filesystem storage, the fallback when no keyring is available
///
/// Data is encrypted at rest with `age` (x25519). The key comes from the
/// `CRAEDL_ENCRYPTION_KEY` environment variable (base64-encoded identity)
/// or is generated on first use and stored next to the data with 0600
/// permissions.
pub struct EncryptedFilesystemStorage {
    base_path: PathBuf,
    recipient: age::x25519::Recipient,
    identity: age::x25519::Identity,
}

impl EncryptedFilesystemStorage {
    /// Open the default encrypted storage under [`config_dir`]
    pub async fn open_default() -> Result<Self, StorageError> {
        Self::new(config_dir()?).await
    }

    /// Create an encrypted storage rooted at `base_path`
    ///
    /// The encryption key lives at `base_path/encryption.key` unless
    /// `CRAEDL_ENCRYPTION_KEY` is set.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        if !base_path.exists() {
            tokio::fs::create_dir_all(&base_path).await?;
        }

        let key_path = base_path.join("encryption.key");
        let (recipient, identity) = Self::setup_encryption(&key_path).await?;

        Ok(Self {
            base_path,
            recipient,
            identity,
        })
    }

    async fn setup_encryption(
        key_path: &Path,
    ) -> Result<(age::x25519::Recipient, age::x25519::Identity), StorageError> {
        if let Ok(key_base64) = std::env::var("CRAEDL_ENCRYPTION_KEY") {
            tracing::debug!("Using encryption key from CRAEDL_ENCRYPTION_KEY");
            return Self::load_key_from_string(&key_base64);
        }

        if key_path.exists() {
            tracing::debug!("Loading encryption key from {:?}", key_path);
            Self::load_key_from_file(key_path).await
        } else {
            tracing::info!("Generating new encryption key at {:?}", key_path);
            Self::generate_and_store_key(key_path).await
        }
    }

    fn load_key_from_string(
        key_base64: &str,
    ) -> Result<(age::x25519::Recipient, age::x25519::Identity), StorageError> {
        use base64::{engine::general_purpose, Engine as _};

        let key_bytes = general_purpose::STANDARD
            .decode(key_base64)
            .map_err(|e| StorageError::KeyStorage(format!("Invalid base64 key: {}", e)))?;

        let key_str = String::from_utf8(key_bytes)
            .map_err(|e| StorageError::KeyStorage(format!("Invalid UTF-8 in key: {}", e)))?;

        let identity = key_str
            .parse::<age::x25519::Identity>()
            .map_err(|e| StorageError::KeyStorage(format!("Invalid age identity: {}", e)))?;

        let recipient = identity.to_public();

        Ok((recipient, identity))
    }

    async fn load_key_from_file(
        key_path: &Path,
    ) -> Result<(age::x25519::Recipient, age::x25519::Identity), StorageError> {
        let key_contents = tokio::fs::read_to_string(key_path)
            .await
            .map_err(|e| StorageError::KeyStorage(format!("Failed to read key file: {}", e)))?;

        Self::load_key_from_string(key_contents.trim())
    }

    async fn generate_and_store_key(
        key_path: &Path,
    ) -> Result<(age::x25519::Recipient, age::x25519::Identity), StorageError> {
        use base64::{engine::general_purpose, Engine as _};
        use secrecy::ExposeSecret;

        let identity = age::x25519::Identity::generate();
        let identity_str = identity.to_string();
        let key_base64 = general_purpose::STANDARD.encode(identity_str.expose_secret().as_bytes());

        if let Some(parent) = key_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::KeyStorage(format!("Failed to create key directory: {}", e))
            })?;
        }

        tokio::fs::write(key_path, &key_base64)
            .await
            .map_err(|e| StorageError::KeyStorage(format!("Failed to write key file: {}", e)))?;

        // Owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(key_path, permissions).map_err(|e| {
                StorageError::KeyStorage(format!("Failed to set key file permissions: {}", e))
            })?;
        }

        let recipient = identity.to_public();

        Ok((recipient, identity))
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn encrypt_data(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        use std::io::Write;

        let encryptor = age::Encryptor::with_recipients(vec![Box::new(self.recipient.clone())])
            .ok_or_else(|| StorageError::Encryption("No encryption recipient".to_string()))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| StorageError::Encryption(format!("Failed to wrap output: {}", e)))?;

        writer
            .write_all(data)
            .map_err(|e| StorageError::Encryption(format!("Failed to encrypt data: {}", e)))?;

        writer.finish().map_err(|e| {
            StorageError::Encryption(format!("Failed to finalize encryption: {}", e))
        })?;

        Ok(encrypted)
    }

    fn decrypt_data(&self, encrypted: &[u8]) -> Result<Vec<u8>, StorageError> {
        use std::io::Read;

        let decryptor = match age::Decryptor::new(encrypted)
            .map_err(|e| StorageError::Encryption(format!("Failed to create decryptor: {}", e)))?
        {
            age::Decryptor::Recipients(d) => d,
            _ => {
                return Err(StorageError::Encryption(
                    "Unexpected decryptor type".to_string(),
                ))
            }
        };

        let mut decrypted = Vec::new();
        let mut reader = decryptor
            .decrypt(std::iter::once(&self.identity as &dyn age::Identity))
            .map_err(|e| StorageError::Encryption(format!("Failed to decrypt data: {}", e)))?;

        reader.read_to_end(&mut decrypted).map_err(|e| {
            StorageError::Encryption(format!("Failed to read decrypted data: {}", e))
        })?;

        Ok(decrypted)
    }
}

impl StorageBackend for EncryptedFilesystemStorage {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);
        let data = data.to_vec();

        Box::pin(async move {
            let encrypted = self.encrypt_data(&data)?;

            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            tokio::fs::write(&full_path, encrypted).await?;
            tracing::debug!("Wrote encrypted data to {:?}", full_path);
            Ok(())
        })
    }

    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);

        Box::pin(async move {
            let encrypted = tokio::fs::read(&full_path).await?;
            let decrypted = self.decrypt_data(&encrypted)?;
            tracing::debug!("Read encrypted data from {:?}", full_path);
            Ok(decrypted)
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).exists()
    }

    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);

        Box::pin(async move {
            tokio::fs::remove_file(&full_path).await?;
            tracing::debug!("Removed encrypted file {:?}", full_path);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn encrypted_storage_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let storage = EncryptedFilesystemStorage::new(temp_dir.path().join("store"))
            .await
            .unwrap();

        let data = b"sensitive data";
        storage.write("secret.json", data).await.unwrap();

        assert!(storage.exists("secret.json"));

        let read_back = storage.read("secret.json").await.unwrap();
        assert_eq!(read_back, data);
    }

    #[tokio::test]
    async fn encrypted_storage_is_not_plaintext_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("store");
        let storage = EncryptedFilesystemStorage::new(&base).await.unwrap();

        let data = b"this must be encrypted";
        storage.write("data.bin", data).await.unwrap();

        let raw = std::fs::read(base.join("data.bin")).unwrap();
        assert_ne!(raw.as_slice(), data);
        assert!(raw.len() > data.len());

        let decrypted = storage.read("data.bin").await.unwrap();
        assert_eq!(decrypted, data);
    }

    #[tokio::test]
    async fn encrypted_storage_remove() {
        let temp_dir = TempDir::new().unwrap();
        let storage = EncryptedFilesystemStorage::new(temp_dir.path().join("store"))
            .await
            .unwrap();

        storage.write("file.json", b"x").await.unwrap();
        assert!(storage.exists("file.json"));

        storage.remove("file.json").await.unwrap();
        assert!(!storage.exists("file.json"));
    }

    #[tokio::test]
    async fn encrypted_storage_tampered_file_fails_to_decrypt() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("store");
        let storage = EncryptedFilesystemStorage::new(&base).await.unwrap();

        storage
            .write("token.json", b"{\"token\": \"secret\"}")
            .await
            .unwrap();

        let file_path = base.join("token.json");
        let mut contents = std::fs::read(&file_path).unwrap();
        if contents.len() > 50 {
            contents[25] = contents[25].wrapping_add(1);
            contents[30] = contents[30].wrapping_sub(1);
            std::fs::write(&file_path, contents).unwrap();
        }

        assert!(storage.read("token.json").await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn encrypted_storage_env_var_key_is_shared_across_instances() {
        use base64::Engine;
        use secrecy::ExposeSecret;

        let identity = age::x25519::Identity::generate();
        let key_base64 = base64::engine::general_purpose::STANDARD
            .encode(identity.to_string().expose_secret().as_bytes());
        std::env::set_var("CRAEDL_ENCRYPTION_KEY", &key_base64);

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("store");

        let storage1 = EncryptedFilesystemStorage::new(&base).await.unwrap();
        storage1.write("data.json", b"persistent").await.unwrap();
        drop(storage1);

        let storage2 = EncryptedFilesystemStorage::new(&base).await.unwrap();
        let read_back = storage2.read("data.json").await.unwrap();
        assert_eq!(read_back, b"persistent");

        std::env::remove_var("CRAEDL_ENCRYPTION_KEY");
    }

    #[tokio::test]
    #[serial]
    #[cfg(unix)]
    async fn encrypted_storage_key_file_has_0600_permissions() {
        use std::os::unix::fs::PermissionsExt;

        std::env::remove_var("CRAEDL_ENCRYPTION_KEY");

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("store");
        let _storage = EncryptedFilesystemStorage::new(&base).await.unwrap();

        let key_path = base.join("encryption.key");
        assert!(key_path.exists());

        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    #[serial]
    async fn config_dir_honors_override() {
        std::env::set_var("CRAEDL_CONFIG_DIR", "/tmp/craedl-test-config");
        let dir = config_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/craedl-test-config"));
        std::env::remove_var("CRAEDL_CONFIG_DIR");
    }

    #[tokio::test]
    async fn keyring_storage_roundtrip_when_available() {
        let storage = KeyringStorage::new("craedl-test");

        let data = b"{\"token\": \"abc\"}";
        if let Err(e) = storage.write("test-entry", data).await {
            // Headless environments have no keyring; nothing to assert.
            eprintln!("Skipping keyring test - keyring unavailable: {}", e);
            return;
        }

        if !storage.exists("test-entry") {
            let _ = storage.remove("test-entry").await;
            return;
        }

        match storage.read("test-entry").await {
            Ok(read_back) => {
                assert_eq!(read_back, data);
                storage.remove("test-entry").await.unwrap();
                assert!(!storage.exists("test-entry"));
            }
            Err(e) => {
                eprintln!("Skipping keyring test - read failed: {}", e);
                let _ = storage.remove("test-entry").await;
            }
        }
    }
}

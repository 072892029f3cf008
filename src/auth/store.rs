use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::AuthError;
use super::token::Token;

/// File name used under the home directory when no token file is given.
pub const DEFAULT_TOKEN_FILE: &str = ".st_token.json";

/// Storage abstraction for a persisted OAuth token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Token, AuthError>;
    fn save(&self, token: &Token) -> Result<(), AuthError>;
}

/// Token store backed by a single JSON file.
///
/// # Example
/// ```no_run
/// use smartthings::auth::{FileTokenStore, Token, TokenStore};
///
/// let store = FileTokenStore::from_name("")?; // ~/.st_token.json
/// store.save(&Token::bearer("access"))?;
/// let token = store.load()?;
/// # Ok::<(), smartthings::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build a store for `name`, resolved with [`resolve_token_path`].
    pub fn from_name(name: &str) -> Result<Self, AuthError> {
        Ok(Self::new(resolve_token_path(name)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Token, AuthError> {
        load_token(&self.path)
    }

    fn save(&self, token: &Token) -> Result<(), AuthError> {
        save_token(&self.path, token)
    }
}

/// Resolve the token file location.
///
/// Absolute paths are returned unchanged, other non-empty names are placed in
/// the user's home directory, and an empty name maps to
/// [`DEFAULT_TOKEN_FILE`] in the home directory.
pub fn resolve_token_path(name: &str) -> Result<PathBuf, AuthError> {
    if Path::new(name).is_absolute() {
        return Ok(PathBuf::from(name));
    }
    let home = user_home_dir()?;
    Ok(resolve_in_home(&home, name))
}

/// Read and decode a token file.
pub fn load_token(path: impl AsRef<Path>) -> Result<Token, AuthError> {
    let path = path.as_ref();
    let raw = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AuthError::NotFound(path.to_path_buf()))
        }
        Err(err) => return Err(AuthError::Io(err.to_string())),
    };
    let token: Token = serde_json::from_slice(&raw)?;
    debug!(path = %path.display(), "loaded token");
    Ok(token)
}

/// Encode and write a token file readable by the owner only.
///
/// Tokens without an access credential are rejected before anything is
/// written, so a failed authorization never overwrites a good file.
pub fn save_token(path: impl AsRef<Path>, token: &Token) -> Result<(), AuthError> {
    let path = path.as_ref();
    if token.access_token.is_empty() {
        return Err(AuthError::InvalidToken(
            "refusing to save a token without an access token".to_string(),
        ));
    }
    let blob = serde_json::to_vec(token)?;
    let mut file = open_private(path)?;
    file.write_all(&blob)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    debug!(path = %path.display(), "saved token");
    Ok(())
}

fn open_private(path: &Path) -> Result<fs::File, AuthError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

fn resolve_in_home(home: &Path, name: &str) -> PathBuf {
    if name.is_empty() {
        home.join(DEFAULT_TOKEN_FILE)
    } else {
        home.join(name)
    }
}

fn user_home_dir() -> Result<PathBuf, AuthError> {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| AuthError::Resolution("cannot determine home directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_token() -> Token {
        Token {
            access_token: "access".to_string(),
            token_type: "tokentype".to_string(),
            refresh_token: "refresh".to_string(),
            expiry: Some(Utc::now() + Duration::hours(72)),
        }
    }

    #[test]
    fn token_round_trip_works() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        let token = sample_token();
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), token);
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "x".repeat(4096)).unwrap();
        save_token(&path, &Token::bearer("short")).unwrap();
        assert_eq!(load_token(&path).unwrap().access_token, "short");
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        save_token(&path, &sample_token()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_rejects_empty_token_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let empty = Token::bearer("");
        let err = save_token(&path, &empty).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert!(!path.exists());
    }

    #[test]
    fn save_into_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("non/existing/dir/test");
        let err = save_token(&path, &sample_token()).unwrap_err();
        assert!(matches!(err, AuthError::Io(_)));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        match load_token(&path) {
            Err(AuthError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_malformed_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_token(&path), Err(AuthError::Decode(_))));
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let dir = TempDir::new().unwrap();
        let absolute = dir.path().join("token.json");
        let name = absolute.to_str().unwrap();
        assert_eq!(resolve_token_path(name).unwrap(), absolute);
    }

    #[test]
    fn resolve_places_names_under_home() {
        let home = Path::new("/home/someone");
        assert_eq!(
            resolve_in_home(home, ""),
            PathBuf::from("/home/someone/.st_token.json")
        );
        assert_eq!(
            resolve_in_home(home, "mytoken.json"),
            PathBuf::from("/home/someone/mytoken.json")
        );
    }
}

//! Craedl command-line interface
//!
//! Stores the access token generated on the Craedl website (`craedl token`)
//! and copies data between the local filesystem and Craedl projects
//! (`craedl cp`).

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use craedl::{
    auth_with_base_url, save_token, CraedlError, Directory, Entry, TOKEN_VALIDITY_DAYS,
};

#[derive(Parser)]
#[command(name = "craedl", version, about = "Command-line client for craedl.org")]
struct Cli {
    /// Craedl API base URL
    #[arg(long, env = "CRAEDL_BASE_URL", default_value = craedl::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a Craedl access token for future use
    ///
    /// Generate the token in your account settings at https://craedl.org,
    /// then paste it here. Tokens remain valid for 28 days.
    Token,
    /// Show the authenticated profile
    Whoami,
    /// Copy data to or from Craedl
    ///
    /// One side is a local path and the other a Craedl path of the form
    /// `project:path/in/project`. A remote source may carry a version
    /// suffix, e.g. `project:data/run.csv@3`.
    Cp {
        /// Source path (local, or `project:path[@version]`)
        source: String,
        /// Destination path (local, or `project:path`)
        dest: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Token => cmd_token().await,
        Command::Whoami => cmd_whoami(&cli.base_url).await,
        Command::Cp { source, dest } => cmd_cp(&cli.base_url, &source, &dest).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_token() -> Result<(), CraedlError> {
    print!("Paste your Craedl access token: ");
    std::io::stdout().flush().map_err(CraedlError::Io)?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(CraedlError::Io)?;

    let token = input.trim();
    if token.is_empty() {
        return Err(CraedlError::Config("no token entered".to_string()));
    }

    save_token(token).await?;
    println!(
        "Token saved. It is valid for {} days; run `craedl token` again after it expires.",
        TOKEN_VALIDITY_DAYS
    );
    Ok(())
}

async fn cmd_whoami(base_url: &str) -> Result<(), CraedlError> {
    let profile = auth_with_base_url(base_url).await?;

    let data = profile.data();
    match (&data.first_name, &data.last_name) {
        (Some(first), Some(last)) => println!("{} {}", first, last),
        _ => println!("profile {}", profile.id()),
    }
    if let Some(username) = profile.username() {
        println!("username: {}", username);
    }
    if let Some(email) = profile.email() {
        println!("email: {}", email);
    }
    Ok(())
}

/// A parsed `project:path[@version]` remote locator
struct RemotePath {
    project: String,
    path: String,
    version: Option<u64>,
}

/// Parse a cp argument as a remote locator, if it is one
///
/// Windows drive letters (`C:\...`) are single characters before the
/// colon and do not name Craedl projects, so a one-character prefix is
/// treated as local.
fn parse_remote(arg: &str) -> Option<RemotePath> {
    let (project, rest) = arg.split_once(':')?;
    if project.len() <= 1 {
        return None;
    }

    let (path, version) = match rest.rsplit_once('@') {
        Some((p, v)) => match v.parse::<u64>() {
            Ok(vid) => (p.to_string(), Some(vid)),
            Err(_) => (rest.to_string(), None),
        },
        None => (rest.to_string(), None),
    };

    Some(RemotePath {
        project: project.to_string(),
        path,
        version,
    })
}

async fn cmd_cp(base_url: &str, source: &str, dest: &str) -> Result<(), CraedlError> {
    match (parse_remote(source), parse_remote(dest)) {
        (Some(remote), None) => cp_download(base_url, remote, Path::new(dest)).await,
        (None, Some(remote)) => cp_upload(base_url, Path::new(source), remote).await,
        (Some(_), Some(_)) => Err(CraedlError::Config(
            "copying between two Craedl paths is not supported".to_string(),
        )),
        (None, None) => Err(CraedlError::Config(
            "one of SOURCE or DEST must be a Craedl path (project:path)".to_string(),
        )),
    }
}

async fn cp_download(
    base_url: &str,
    remote: RemotePath,
    dest: &Path,
) -> Result<(), CraedlError> {
    let profile = auth_with_base_url(base_url).await?;
    let project = profile.get_project(&remote.project).await?;
    let root = project.get_data().await?;

    match root.get(&remote.path).await? {
        Entry::File(file) => {
            let written = file.download(dest, remote.version).await?;
            println!("{}", written.display());
            Ok(())
        }
        Entry::Directory(_) => Err(CraedlError::Config(format!(
            "{}:{} is a directory; only files can be downloaded",
            remote.project, remote.path
        ))),
    }
}

async fn cp_upload(base_url: &str, source: &Path, remote: RemotePath) -> Result<(), CraedlError> {
    if !source.exists() {
        return Err(CraedlError::NotFound(source.display().to_string()));
    }
    if remote.version.is_some() {
        return Err(CraedlError::Config(
            "version suffixes only apply to downloads".to_string(),
        ));
    }

    let profile = auth_with_base_url(base_url).await?;
    let project = profile.get_project(&remote.project).await?;
    let mut target: Directory = project.get_data().await?;

    // Walk (creating as needed) down to the remote destination directory.
    for component in remote.path.split('/').filter(|c| !c.is_empty() && *c != ".") {
        target = target.ensure_directory(component).await?;
    }

    let updated = target.create_file(source).await?;
    println!(
        "uploaded {} to {}:{}",
        source.display(),
        remote.project,
        remote.path
    );
    tracing::debug!(
        "Destination directory {} now has {} children",
        updated.id(),
        updated.children().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_remote_with_path() {
        let remote = parse_remote("myproject:data/results.csv").unwrap();
        assert_eq!(remote.project, "myproject");
        assert_eq!(remote.path, "data/results.csv");
        assert_eq!(remote.version, None);
    }

    #[test]
    fn parse_remote_with_version() {
        let remote = parse_remote("myproject:data/results.csv@3").unwrap();
        assert_eq!(remote.path, "data/results.csv");
        assert_eq!(remote.version, Some(3));
    }

    #[test]
    fn parse_remote_non_numeric_version_is_part_of_name() {
        let remote = parse_remote("proj:notes@draft.txt").unwrap();
        assert_eq!(remote.path, "notes@draft.txt");
        assert_eq!(remote.version, None);
    }

    #[test]
    fn local_paths_are_not_remote() {
        assert!(parse_remote("/tmp/file.txt").is_none());
        assert!(parse_remote("file.txt").is_none());
        assert!(parse_remote("C:\\Users\\me\\file.txt").is_none());
    }
}

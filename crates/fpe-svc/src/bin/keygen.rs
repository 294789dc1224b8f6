//! `fpe-keygen`: write a fresh random key file.
//!
//! ```text
//! fpe-keygen <path> [len]
//! ```
//!
//! `len` defaults to 16 bytes. The file must not already exist: overwriting
//! a key makes everything encrypted under it undecryptable.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fpe::{Key, DEFAULT_KEY_LEN};

#[derive(Parser, Debug)]
#[command(
    name = "fpe-keygen",
    version,
    about = "Write a fresh random key file for format-preserving encryption"
)]
struct Cli {
    /// Where to write the key. Must not exist yet.
    path: PathBuf,

    /// Key length in bytes
    #[arg(default_value_t = DEFAULT_KEY_LEN)]
    len: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let key = write_key(&cli)?;

    if key.is_short() {
        eprintln!("warning: {}-byte key is shorter than recommended", cli.len);
    }
    println!(
        "wrote {}-byte key to {} (fingerprint {})",
        cli.len,
        cli.path.display(),
        key.fingerprint()
    );
    Ok(())
}

fn write_key(cli: &Cli) -> Result<Key> {
    let key = Key::generate(cli.len).context("failed to generate key")?;
    let path = cli.path.display();

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&cli.path)
        .with_context(|| format!("failed to create {path}"))?;
    file.write_all(key.as_bytes())
        .and_then(|()| file.sync_all())
        .with_context(|| format!("failed to write {path}"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn length_defaults() {
        let cli = Cli::try_parse_from(["fpe-keygen", "fpe.key"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("fpe.key"));
        assert_eq!(cli.len, DEFAULT_KEY_LEN);
    }

    #[test]
    fn help_flag_is_not_a_path() {
        let err = Cli::try_parse_from(["fpe-keygen", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn extra_arguments_rejected() {
        let err = Cli::try_parse_from(["fpe-keygen", "a.key", "32", "extra"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn bad_length_rejected() {
        let err = Cli::try_parse_from(["fpe-keygen", "a.key", "many"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn writes_key_and_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            path: dir.path().join("fpe.key"),
            len: 32,
        };

        let key = write_key(&cli).unwrap();
        assert_eq!(std::fs::read(&cli.path).unwrap(), key.as_bytes());

        assert!(write_key(&cli).is_err());
        assert_eq!(std::fs::read(&cli.path).unwrap(), key.as_bytes());
    }
}

//! Verification phase - checks that the binary runs and reports an
//! acceptable version.

use std::path::Path;

use crate::capability::Verifier;
use crate::error::AcquireError;
use crate::spec::VerifyPolicy;

use super::DEFAULT_TEST_ARGS;

pub async fn verify(
    path: &Path,
    range: Option<&str>,
    policy: VerifyPolicy,
    test_args: &[String],
    verifier: &dyn Verifier,
) -> Result<(), AcquireError> {
    let Some(range) = range else {
        return probe(path, test_args, verifier).await;
    };

    if policy == VerifyPolicy::ProbeThenVersion {
        probe(path, test_args, verifier).await?;
    }

    // The verifier asks for the version its own way unless told otherwise
    let version_args = (!is_default_args(test_args)).then_some(test_args);
    verifier
        .check_version(path, range, version_args)
        .await
        .map_err(AcquireError::from)
}

async fn probe(path: &Path, args: &[String], verifier: &dyn Verifier) -> Result<(), AcquireError> {
    let works = verifier
        .check_works(path, args)
        .await
        .map_err(|source| AcquireError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    if works {
        Ok(())
    } else {
        Err(AcquireError::VerificationFailed {
            path: path.to_path_buf(),
        })
    }
}

fn is_default_args(args: &[String]) -> bool {
    args.len() == DEFAULT_TEST_ARGS.len()
        && args.iter().zip(DEFAULT_TEST_ARGS).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default_args() {
        assert!(is_default_args(&["--version".to_string()]));
        assert!(!is_default_args(&["-V".to_string()]));
        assert!(!is_default_args(&[]));
        assert!(!is_default_args(&[
            "--version".to_string(),
            "--verbose".to_string()
        ]));
    }
}

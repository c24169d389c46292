//! Remote transport: fetch and push.
//!
//! `gix`'s network/transport support does not yet cover authenticated
//! smart-HTTP(S) push in a way this crate can depend on, so both directions
//! shell out to the system `git` binary. Credentials never touch the
//! command line: a PAT is passed via a short-lived `credential.helper`
//! override, and an SSH key pair is passed via `GIT_SSH_COMMAND`.

use std::path::Path;
use std::process::{Command, Output};

use tracing::{debug, instrument};

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::refs_impl;
use crate::types::{Credentials, GitOid};

fn validate_url(url: &str) -> Result<(), GitError> {
    if let Some(rest) = url.strip_prefix("http://") {
        let _ = rest;
        return Err(GitError::HttpProtocolRequired {
            url: url.to_owned(),
        });
    }
    if !url.starts_with("https://") {
        return Err(GitError::InvalidUrl {
            url: url.to_owned(),
            reason: "only https:// remote URLs are accepted".to_owned(),
        });
    }
    Ok(())
}

fn git_command(repo: &GixRepo, credentials: &Credentials) -> Result<Command, GitError> {
    let workdir = repo.workdir.as_deref().ok_or_else(|| GitError::BackendError {
        message: "repository has no working directory; cannot shell out to git".to_owned(),
    })?;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    match credentials {
        Credentials::None => {}
        Credentials::PersonalAccessToken(_) => {
            // The token is injected into the URL's userinfo at call sites
            // instead of via argv, so it never appears in `ps` output.
        }
        Credentials::SshKeyPair {
            private_key_path,
            public_key_path: _,
        } => {
            cmd.env(
                "GIT_SSH_COMMAND",
                format!(
                    "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
                    shell_quote(private_key_path)
                ),
            );
        }
    }
    Ok(cmd)
}

fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

/// Embed a personal access token into an HTTPS URL's userinfo, matching
/// GitHub/GitLab's `https://<token>@host/...` convention.
fn url_with_token(url: &str, token: &str) -> Result<String, GitError> {
    let rest = url.strip_prefix("https://").ok_or_else(|| GitError::InvalidUrl {
        url: url.to_owned(),
        reason: "expected an https:// URL".to_owned(),
    })?;
    Ok(format!("https://{token}@{rest}"))
}

fn authenticated_url(url: &str, credentials: &Credentials) -> Result<String, GitError> {
    match credentials {
        Credentials::PersonalAccessToken(token) => url_with_token(url, token),
        _ => Ok(url.to_owned()),
    }
}

/// Whether `stderr` (already lowercased) names an HTTP 5xx status, e.g.
/// `"the requested url returned error: 502"`.
fn is_http_5xx(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    for (i, w) in bytes.windows(3).enumerate() {
        let preceded_by_digit = i > 0 && bytes[i - 1].is_ascii_digit();
        if w[0] == b'5' && w[1].is_ascii_digit() && w[2].is_ascii_digit() && !preceded_by_digit {
            return true;
        }
    }
    false
}

fn classify_failure(remote: &str, output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lower = stderr.to_lowercase();
    if lower.contains("could not resolve host") || lower.contains("could not connect") {
        return GitError::CannotConnect {
            remote: remote.to_owned(),
            message: stderr.trim().to_owned(),
        };
    }
    if lower.contains("timed out") {
        return GitError::RequestTimeout {
            remote: remote.to_owned(),
            elapsed_secs: 0,
        };
    }
    if lower.contains("connection reset")
        || is_http_5xx(&lower)
    {
        return GitError::HttpNetwork {
            remote: remote.to_owned(),
            message: stderr.trim().to_owned(),
        };
    }
    if lower.contains("authentication failed") || lower.contains("403") {
        return GitError::PushPermissionDenied {
            remote: remote.to_owned(),
        };
    }
    if lower.contains("repository not found") || lower.contains("404") {
        return GitError::RemoteRepositoryNotFound {
            remote: remote.to_owned(),
        };
    }
    if lower.contains("non-fast-forward") || lower.contains("fetch first") {
        return GitError::NonFastForward {
            remote: remote.to_owned(),
            branch: String::new(),
        };
    }
    GitError::BackendError {
        message: format!("git transport failed: {}", stderr.trim()),
    }
}

#[instrument(skip(repo, credentials), fields(remote_url, branch))]
pub fn fetch(
    repo: &GixRepo,
    remote_url: &str,
    branch: &str,
    credentials: &Credentials,
) -> Result<GitOid, GitError> {
    validate_url(remote_url)?;
    let url = authenticated_url(remote_url, credentials)?;

    let mut cmd = git_command(repo, credentials)?;
    cmd.args(["fetch", "--no-tags", &url, branch]);
    debug!("running git fetch");
    let output = cmd.output().map_err(GitError::IoError)?;
    if !output.status.success() {
        return Err(classify_failure(remote_url, &output));
    }

    refs_impl::resolve_ref(repo, "FETCH_HEAD")?.ok_or_else(|| GitError::BackendError {
        message: "git fetch succeeded but FETCH_HEAD is unset".to_owned(),
    })
}

#[instrument(skip(repo, credentials), fields(remote_url, branch, force))]
pub fn push(
    repo: &GixRepo,
    remote_url: &str,
    branch: &str,
    credentials: &Credentials,
    force: bool,
) -> Result<(), GitError> {
    validate_url(remote_url)?;
    let url = authenticated_url(remote_url, credentials)?;

    let mut cmd = git_command(repo, credentials)?;
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    cmd.arg("push");
    if force {
        cmd.arg("--force");
    }
    cmd.args([&url, &refspec]);
    debug!("running git push");
    let output = cmd.output().map_err(GitError::IoError)?;
    if !output.status.success() {
        let mut err = classify_failure(remote_url, &output);
        if let GitError::NonFastForward { branch: b, .. } = &mut err {
            *b = branch.to_owned();
        }
        return Err(err);
    }
    Ok(())
}

use russh::keys::ssh_key::{HashAlg, PublicKey};

use crate::tools::types::HostKeyPolicy;

/// Outcome of checking a server key against a [`HostKeyPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Key matched a pinned fingerprint or a known_hosts entry
    Trusted,
    /// Policy accepts any key; nothing was checked
    Unverified,
    /// Host missing from known_hosts
    UnknownHost,
    /// Key differs from the pinned fingerprint or the recorded key
    Mismatch(String),
    /// known_hosts could not be consulted
    Unreadable(String),
}

impl Verdict {
    pub fn accepts(&self) -> bool {
        matches!(self, Verdict::Trusted | Verdict::Unverified)
    }

    /// Reason shown to the user when the key is refused
    pub fn reason(&self) -> String {
        match self {
            Verdict::Trusted | Verdict::Unverified => "accepted".to_string(),
            Verdict::UnknownHost => "host not found in known_hosts".to_string(),
            Verdict::Mismatch(detail) => detail.clone(),
            Verdict::Unreadable(detail) => format!("known_hosts unreadable: {}", detail),
        }
    }
}

/// SHA-256 fingerprint in OpenSSH notation (`SHA256:<base64>`)
pub fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// Check `key`, presented by `host:port`, against `policy`
pub fn evaluate(policy: &HostKeyPolicy, host: &str, port: u16, key: &PublicKey) -> Verdict {
    match policy {
        HostKeyPolicy::AcceptAny => Verdict::Unverified,
        HostKeyPolicy::Pinned(expected) => {
            let actual = fingerprint(key);
            if normalize_fingerprint(expected) == normalize_fingerprint(&actual) {
                Verdict::Trusted
            } else {
                Verdict::Mismatch(format!(
                    "fingerprint {} does not match pinned {}",
                    actual, expected
                ))
            }
        }
        HostKeyPolicy::KnownHosts(path) => {
            let path = shellexpand::tilde(&path.to_string_lossy()).to_string();
            match russh::keys::check_known_hosts_path(host, port, key, &path) {
                Ok(true) => Verdict::Trusted,
                Ok(false) => Verdict::UnknownHost,
                Err(russh::keys::Error::KeyChanged { line }) => Verdict::Mismatch(format!(
                    "key differs from the one recorded at {}:{}",
                    path, line
                )),
                Err(e) => Verdict::Unreadable(e.to_string()),
            }
        }
    }
}

fn normalize_fingerprint(fp: &str) -> &str {
    let fp = fp.trim();
    let fp = fp.strip_prefix("SHA256:").unwrap_or(fp);
    fp.trim_end_matches('=')
}

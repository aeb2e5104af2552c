// This module resolves who we are deploying for, exactly once, at startup.
//
// The result, a `DeployContext`, is passed explicitly to the driver and every hook.
// Hooks never read `USER`, `SUDO_USER` or `HOME` themselves: when the binary runs
// through `sudo`, the process environment describes root while the dotfiles that
// need editing belong to the invoking user.

use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use colored::Colorize;

use crate::{log_debug, log_warn};

// Upper bound for the getpwnam_r scratch buffer when it keeps reporting ERANGE.
const MAX_PASSWD_BUFFER: usize = 1 << 20;

/// Numeric owner that files created on the user's behalf are handed back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

/// Identity of the user the tools are deployed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    /// Login name of the invoking user (`SUDO_USER` when elevated).
    pub user: String,
    /// That user's home directory; all dotfiles and prefixes live below it.
    pub home: PathBuf,
    /// Login shell from the passwd entry, if known.
    pub login_shell: Option<String>,
    /// Whether the process runs with an effective uid of 0.
    pub elevated: bool,
    /// Set when elevated on behalf of another user: files we create must be chowned to it.
    pub owner: Option<Owner>,
}

/// The parts of a passwd entry we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    pub shell: String,
}

impl DeployContext {
    /// A context for an unelevated user, with no passwd lookup.
    #[cfg(test)]
    pub fn for_user(user: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        DeployContext {
            user: user.into(),
            home: home.into(),
            login_shell: None,
            elevated: false,
            owner: None,
        }
    }

    /// Resolves the invoking user from the process identity and environment.
    ///
    /// # Resolution order
    /// 1. Elevated (euid 0): `SUDO_USER`, falling back to `root` when not started through sudo.
    /// 2. Unelevated: `USER`, then `LOGNAME`.
    /// 3. Home directory and login shell come from the passwd entry of that user, as
    ///    resolved through NSS, falling back to `dirs::home_dir()` for the home directory.
    pub fn resolve() -> Result<Self> {
        let elevated = effective_uid_is_root();
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let user = if elevated {
            env("SUDO_USER").unwrap_or_else(|| "root".to_string())
        } else {
            env("USER")
                .or_else(|| env("LOGNAME"))
                .ok_or_else(|| {
                    anyhow!("neither USER nor LOGNAME is set; cannot tell who to deploy for")
                })?
        };

        let entry = lookup_user(&user);
        if entry.is_none() {
            log_warn!(
                "[Context] No passwd entry for {}; using this process's home directory",
                user.yellow()
            );
        }

        let home = match &entry {
            Some(entry) => entry.home.clone(),
            None => dirs::home_dir()
                .with_context(|| format!("could not determine the home directory of '{}'", user))?,
        };

        // Only hand files back when we are root acting for somebody else.
        let owner = if elevated && user != "root" {
            let from_env = |key: &str| env(key).and_then(|v| v.parse::<u32>().ok());
            match (from_env("SUDO_UID"), from_env("SUDO_GID")) {
                (Some(uid), Some(gid)) => Some(Owner { uid, gid }),
                _ => entry.as_ref().map(|e| Owner { uid: e.uid, gid: e.gid }),
            }
        } else {
            None
        };

        let context = DeployContext {
            user,
            home,
            login_shell: entry.map(|e| e.shell),
            elevated,
            owner,
        };
        log_debug!(
            "[Context] Deploying for user {} (home: {}, elevated: {})",
            context.user.bold(),
            context.home.display().to_string().cyan(),
            context.elevated
        );
        Ok(context)
    }

    /// `<home>/<relative>`.
    pub fn home_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.home.join(relative)
    }
}

/// Looks `user` up in the passwd database through NSS, so LDAP and sssd users
/// resolve the same way local ones do.
pub fn lookup_user(user: &str) -> Option<PasswdEntry> {
    let name = CString::new(user).ok()?;
    // SAFETY: sysconf has no preconditions.
    let mut capacity = match unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) } {
        n if n > 0 => n as usize,
        _ => 1024,
    };

    loop {
        let mut buffer: Vec<libc::c_char> = vec![0; capacity];
        // SAFETY: passwd is a plain C struct; all-zero is a valid value to be overwritten.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: every pointer is valid for the duration of the call and the buffer
        // length matches its allocation.
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &mut pwd,
                buffer.as_mut_ptr(),
                buffer.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && capacity < MAX_PASSWD_BUFFER {
            capacity *= 2;
            continue;
        }
        if rc != 0 || result.is_null() {
            log_debug!("[Context] getpwnam_r for {} returned {}", user, rc);
            return None;
        }

        // SAFETY: on success the string fields are NUL-terminated and point into
        // `buffer`, which outlives these reads.
        let bytes = |field: *const libc::c_char| -> Vec<u8> {
            if field.is_null() {
                Vec::new()
            } else {
                unsafe { CStr::from_ptr(field) }.to_bytes().to_vec()
            }
        };
        return Some(PasswdEntry {
            name: String::from_utf8_lossy(&bytes(pwd.pw_name)).into_owned(),
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
            home: PathBuf::from(OsStr::from_bytes(&bytes(pwd.pw_dir))),
            shell: String::from_utf8_lossy(&bytes(pwd.pw_shell)).into_owned(),
        });
    }
}

fn effective_uid_is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

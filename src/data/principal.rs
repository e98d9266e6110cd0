// src/data/principal.rs

//! The read-only [`PrincipalDirectory`] consulted when reading an indexed
//! table, and its implementations [`PrincipalMap`] and
//! [`PasswdDirectory`].
//!
//! A "principal" is a numeric user id (uid) and an optional user name.

use crate::common::FPath;
use crate::{de_wrn, e_wrn};

use std::collections::BTreeMap;
use std::io::{Error, Result};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Principal id, a numeric user id
pub type PrincipalId = u32;

/// Default path of the passwd-format principal directory.
pub const PASSWD_PATH_DEFAULT: &str = "/etc/passwd";

/// Read-only capability to enumerate principal ids and map an id to a name.
///
/// Implementations are never modified by readers and may be shared among
/// threads.
pub trait PrincipalDirectory: Sync {
    /// All known principal ids in ascending order, without duplicates.
    fn ids(&self) -> Vec<PrincipalId>;

    /// The name of principal `id`, if known.
    fn name(&self, id: PrincipalId) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

/// In-memory [`PrincipalDirectory`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrincipalMap {
    map: BTreeMap<PrincipalId, String>,
}

impl PrincipalMap {
    pub fn new() -> PrincipalMap {
        PrincipalMap::default()
    }

    /// Add a principal. The first name inserted for an `id` is kept.
    ///
    /// Returns `false` if `id` was already present.
    pub fn insert(&mut self, id: PrincipalId, name: &str) -> bool {
        if self.map.contains_key(&id) {
            return false;
        }
        self.map.insert(id, String::from(name));

        true
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl FromIterator<(PrincipalId, String)> for PrincipalMap {
    fn from_iter<I: IntoIterator<Item = (PrincipalId, String)>>(iter: I) -> Self {
        let mut pm = PrincipalMap::new();
        for (id, name) in iter {
            pm.insert(id, name.as_str());
        }

        pm
    }
}

impl PrincipalDirectory for PrincipalMap {
    fn ids(&self) -> Vec<PrincipalId> {
        // `BTreeMap` keys iterate in ascending order
        self.map.keys().copied().collect()
    }

    fn name(&self, id: PrincipalId) -> Option<&str> {
        self.map.get(&id).map(|s| s.as_str())
    }
}

/// [`PrincipalDirectory`] read from a [`passwd(5)`] format file, e.g.
/// `/etc/passwd` of the system being examined.
///
/// Blank lines, `#` comments, and lines that lack a numeric uid field are
/// skipped.
///
/// [`passwd(5)`]: https://man7.org/linux/man-pages/man5/passwd.5.html
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PasswdDirectory {
    path: FPath,
    principals: PrincipalMap,
    /// count of lines that could not be parsed
    lines_skipped: usize,
}

impl PasswdDirectory {
    /// Read and parse the passwd-format file at `path`.
    pub fn from_path(path: &FPath) -> Result<PasswdDirectory> {
        defn!("({:?})", path);
        let data: Vec<u8> = match std::fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                defx!("read error {}", err);
                return Err(Error::new(
                    err.kind(),
                    format!("{} for principal directory {:?}", err, path),
                ));
            }
        };
        let text = String::from_utf8_lossy(&data);
        let mut pd = PasswdDirectory::parse(text.as_ref());
        pd.path = path.clone();
        if pd.lines_skipped != 0 {
            e_wrn!("skipped {} malformed lines in {:?}", pd.lines_skipped, path);
        }
        defx!("return {} principals", pd.principals.len());

        Ok(pd)
    }

    /// Parse passwd-format `text`.
    pub fn parse(text: &str) -> PasswdDirectory {
        let mut principals = PrincipalMap::new();
        let mut lines_skipped: usize = 0;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // name:password:uid:gid:gecos:home:shell
            let mut fields = line.split(':');
            let name = fields.next().unwrap_or("");
            let uid = fields.nth(1).map(|s| s.trim().parse::<PrincipalId>());
            match uid {
                Some(Ok(uid)) if !name.is_empty() => {
                    if !principals.insert(uid, name) {
                        de_wrn!("line {}: duplicate uid {}; kept first name", lineno + 1, uid);
                    }
                }
                _ => {
                    defo!("line {}: skip {:?}", lineno + 1, line);
                    lines_skipped += 1;
                }
            }
        }

        PasswdDirectory {
            path: FPath::new(),
            principals,
            lines_skipped,
        }
    }

    /// The source path, empty if parsed from text.
    pub fn path(&self) -> &FPath {
        &self.path
    }

    pub const fn lines_skipped(&self) -> usize {
        self.lines_skipped
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }
}

impl PrincipalDirectory for PasswdDirectory {
    fn ids(&self) -> Vec<PrincipalId> {
        self.principals.ids()
    }

    fn name(&self, id: PrincipalId) -> Option<&str> {
        self.principals.name(id)
    }
}

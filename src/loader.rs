//! This module provides the `ProgramLoader` struct, responsible for loading rule tables
//! from files, from strings, and from a suite directory laid out as `<root>/<group>/<file>`.

use crate::parser::compile;
use crate::program::Program;
use crate::types::{LoadError, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// A rule table found in a suite directory.
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    /// Name of the directory the file sits in, e.g. `double`.
    pub group: String,
    pub path: PathBuf,
    pub program: Program,
}

/// `ProgramLoader` is a utility struct for loading rule tables.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads and compiles a single rule table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is read and compiled.
    /// * `Err(LoadError::Io)` if the file cannot be read.
    /// * `Err(LoadError::TooLarge)` if the file exceeds `MAX_PROGRAM_SIZE`.
    /// * `Err(LoadError::Code)` if the content is not a valid rule table.
    pub fn load_program(path: &Path) -> Result<Program, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::load_program_from_string(&content)
    }

    /// Compiles a rule table held in memory, e.g. piped in by the user.
    pub fn load_program_from_string(content: &str) -> Result<Program, LoadError> {
        if content.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: content.len(),
            });
        }

        Ok(compile(content)?)
    }

    /// Loads every rule table under `root`, one directory level deep.
    ///
    /// Each subdirectory of `root` is a group named after the directory; every regular,
    /// non-hidden file inside it is compiled. Results are sorted by group, then path, and
    /// a file that fails to load yields an `Err` without stopping the others.
    pub fn load_suite(root: &Path) -> Vec<Result<LoadedProgram, LoadError>> {
        let groups = match sorted_entries(root) {
            Ok(groups) => groups,
            Err(e) => return vec![Err(e)],
        };

        let mut results = Vec::new();
        for group_dir in groups.into_iter().filter(|path| path.is_dir()) {
            let group = file_name(&group_dir);

            let files = match sorted_entries(&group_dir) {
                Ok(files) => files,
                Err(e) => {
                    results.push(Err(e));
                    continue;
                }
            };

            for path in files {
                if !path.is_file() || file_name(&path).starts_with('.') {
                    continue;
                }

                let loaded = Self::load_program(&path).map(|program| LoadedProgram {
                    group: group.clone(),
                    path: path.clone(),
                    program,
                });
                if let Err(e) = &loaded {
                    log::warn!("skipping {}: {}", path.display(), e);
                }
                results.push(loaded);
            }
        }

        results
    }
}

/// Lists the entries of `dir` sorted by path.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    paths.sort();

    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

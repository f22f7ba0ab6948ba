// Fetches skill files into `<skills_dir>/<name>/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;
use crate::model::skill::{InstalledSkill, MARKER_FILE, SKILL_FILES, SkillName, SkillNameError};
use crate::net::{FetchError, Fetcher};

#[derive(Debug)]
pub enum InstallOutcome {
    Installed {
        path: PathBuf,
        files: Vec<&'static str>,
    },
    AlreadyInstalled {
        path: PathBuf,
    },
    MissingName,
    InvalidName(String),
    /// The marker file could not be retrieved; nothing was left on disk.
    NotFound {
        name: String,
        reason: String,
    },
}

#[derive(Debug)]
pub enum RemoveOutcome {
    Removed { path: PathBuf },
    NotInstalled { name: String },
    MissingName,
    InvalidName(String),
}

/// Result of re-fetching one installed skill.
#[derive(Debug)]
pub struct UpdateResult {
    pub name: String,
    pub refreshed: Vec<&'static str>,
    pub error: Option<String>,
}

enum FileFetch {
    Written,
    Missing,
    Skipped(String),
}

pub struct SkillInstaller<'a> {
    config: &'a AppConfig,
    fetcher: &'a dyn Fetcher,
}

impl<'a> SkillInstaller<'a> {
    pub fn new(config: &'a AppConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn skill_dir(&self, name: &SkillName) -> PathBuf {
        self.config.skills_dir().join(name.as_str())
    }

    /// Install `raw_name`. Only local filesystem failures surface as errors.
    pub fn install(&self, raw_name: &str) -> io::Result<InstallOutcome> {
        let name = match SkillName::parse(raw_name) {
            Ok(name) => name,
            Err(SkillNameError::Empty) => return Ok(InstallOutcome::MissingName),
            Err(SkillNameError::Invalid(raw)) => return Ok(InstallOutcome::InvalidName(raw)),
        };

        let dir = self.skill_dir(&name);
        if dir.exists() {
            tracing::info!("skill {name} already present at {}", dir.display());
            return Ok(InstallOutcome::AlreadyInstalled { path: dir });
        }

        fs::create_dir_all(&dir)?;
        tracing::info!("installing skill {name} into {}", dir.display());

        let mut files = Vec::new();
        let mut marker_failure = None;
        for file in SKILL_FILES {
            match self.fetch_file(&name, file, &dir) {
                Ok(FileFetch::Written) => files.push(file),
                Ok(FileFetch::Missing) => {
                    tracing::debug!("{name}/{file} not published, skipping");
                    if file == MARKER_FILE {
                        marker_failure = Some(format!("{MARKER_FILE} not found"));
                    }
                }
                Ok(FileFetch::Skipped(reason)) => {
                    tracing::warn!("skipping {name}/{file}: {reason}");
                    if file == MARKER_FILE {
                        marker_failure = Some(reason);
                    }
                }
                Err(err) => {
                    remove_quietly(&dir);
                    return Err(err);
                }
            }
        }

        if let Some(reason) = marker_failure {
            remove_quietly(&dir);
            return Ok(InstallOutcome::NotFound {
                name: name.to_string(),
                reason,
            });
        }

        Ok(InstallOutcome::Installed { path: dir, files })
    }

    pub fn remove(&self, raw_name: &str) -> io::Result<RemoveOutcome> {
        let name = match SkillName::parse(raw_name) {
            Ok(name) => name,
            Err(SkillNameError::Empty) => return Ok(RemoveOutcome::MissingName),
            Err(SkillNameError::Invalid(raw)) => return Ok(RemoveOutcome::InvalidName(raw)),
        };

        let dir = self.skill_dir(&name);
        if !dir.is_dir() {
            return Ok(RemoveOutcome::NotInstalled {
                name: name.to_string(),
            });
        }

        fs::remove_dir_all(&dir)?;
        tracing::info!("removed skill {name}");
        Ok(RemoveOutcome::Removed { path: dir })
    }

    /// Skill directories under the skills root, sorted by name.
    pub fn installed(&self) -> io::Result<Vec<InstalledSkill>> {
        list_installed(self.config.skills_dir())
    }

    /// Re-fetch every installed skill in place. Files are only overwritten
    /// when the remote copy was retrieved.
    pub fn update_all(&self) -> io::Result<Vec<UpdateResult>> {
        let mut results = Vec::new();
        for skill in self.installed()? {
            let Ok(name) = SkillName::parse(&skill.name) else {
                continue;
            };

            let mut refreshed = Vec::new();
            let mut error = None;
            for file in SKILL_FILES {
                match self.fetch_file(&name, file, &skill.path)? {
                    FileFetch::Written => refreshed.push(file),
                    FileFetch::Missing if file == MARKER_FILE => {
                        error = Some(format!("{MARKER_FILE} no longer published"));
                        break;
                    }
                    FileFetch::Missing => {}
                    FileFetch::Skipped(reason) => {
                        tracing::warn!("update {name}/{file}: {reason}");
                        if file == MARKER_FILE {
                            error = Some(reason);
                            break;
                        }
                    }
                }
            }

            results.push(UpdateResult {
                name: skill.name,
                refreshed,
                error,
            });
        }
        Ok(results)
    }

    fn fetch_file(&self, name: &SkillName, file: &str, dir: &Path) -> io::Result<FileFetch> {
        let url = self.config.skill_file_url(name.as_str(), file);
        match self.fetcher.get(&url) {
            Ok(response) if response.is_success() => {
                fs::write(dir.join(file), &response.body)?;
                Ok(FileFetch::Written)
            }
            Ok(response) if response.status == 404 => Ok(FileFetch::Missing),
            Ok(response) => Ok(FileFetch::Skipped(
                FetchError::Status {
                    url,
                    status: response.status,
                }
                .to_string(),
            )),
            Err(err) => Ok(FileFetch::Skipped(err.to_string())),
        }
    }
}

pub fn list_installed(root: &Path) -> io::Result<Vec<InstalledSkill>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut skills: Vec<InstalledSkill> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| InstalledSkill::read(&entry.path()))
        .collect();
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

fn remove_quietly(dir: &Path) {
    if let Err(err) = fs::remove_dir_all(dir) {
        tracing::warn!("failed to clean up {}: {err}", dir.display());
    }
}

use std::path::{Component, Path, PathBuf};

use super::experiment::{Datapath, Switching};

/// Fold `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => (),
                _ => normalized.push("..")
            },
            other => normalized.push(other.as_os_str())
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Today's date in the format used for the output directory, dd-mm-YYYY
pub fn today() -> String {
    chrono::Local::now().format("%d-%m-%Y").to_string()
}

/// # OutputLayout
/// Directory layout of the acquired data:
/// `<root>/<date>/<AFC>_<FMC>/<datapath>[/<sweep step>]/sw_<state>/data_<n>_<datapath>/data_<n>_<datapath>.txt`
///
/// Every run gets a fresh `n`, so earlier runs of the same day are never overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    root: PathBuf,
    date: String,
    boards: String
}

impl OutputLayout {

    pub fn new(root: &Path, date: &str, afc: &str, fmc: &str) -> Self {
        OutputLayout { root: normalize(root), date: date.to_string(), boards: format!("{}_{}", afc, fmc) }
    }

    pub fn data_file(&self, datapath: Datapath, sweep_step: Option<&str>, switching: Switching, n: u32) -> PathBuf {
        let name = format!("data_{}_{}", n, datapath);
        let mut path = self.root.join(&self.date).join(&self.boards).join(datapath.as_str());
        if let Some(step) = sweep_step {
            path = path.join(step);
        }
        path.join(format!("sw_{}", switching)).join(&name).join(format!("{}.txt", name))
    }

    /// Probe `n = counter, counter + 1, ...` until no datapath has a file with that number.
    /// The counter is left one past the number used.
    pub fn unique_data_files(&self, datapaths: &[Datapath], sweep_step: Option<&str>, switching: Switching, counter: &mut u32) -> Vec<PathBuf> {
        loop {
            let files: Vec<PathBuf> = datapaths.iter()
                .map(|dp| self.data_file(*dp, sweep_step, switching, *counter))
                .collect();
            *counter += 1;
            if files.iter().all(|f| !f.exists()) {
                return files;
            }
        }
    }
}

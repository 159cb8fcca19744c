// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use super::error::StoreError;

const SCENES_FILE: &str = "scenes.yml";
const STAGES_FILE: &str = "stages.yml";

/// A stored scene.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SceneRecord {
    pub name: String,
    pub speed: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub fixture_group: String,
}

/// Stored calibration for one fixture within a stage.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Calibration {
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub reversed: bool,
    pub focus: Option<u8>,
    pub pan: f64,
    pub tilt: f64,
}

/// A stored stage: calibration by fixture name.
pub type StageRecord = BTreeMap<String, Calibration>;

/// The scene and stage collections kept in the data directory.
///
/// Files are read on every lookup and rewritten only on save. A save reloads the
/// collection, replaces the one record, and atomically swaps the file in so other
/// records survive.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Creates a new store rooted at the data directory.
    pub fn new(dir: &Path) -> Store {
        Store {
            dir: dir.to_path_buf(),
        }
    }

    /// Gets the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Looks up a scene by id.
    pub fn scene(&self, id: u8) -> Result<Option<SceneRecord>, StoreError> {
        Ok(self.read::<u8, SceneRecord>(SCENES_FILE)?.remove(&id))
    }

    /// Saves a scene, keeping every other scene in the file.
    pub fn save_scene(&self, id: u8, record: &SceneRecord) -> Result<(), StoreError> {
        self.merge(SCENES_FILE, id, record.clone())
    }

    /// Looks up a stage by name.
    pub fn stage(&self, name: &str) -> Result<Option<StageRecord>, StoreError> {
        Ok(self.read::<String, StageRecord>(STAGES_FILE)?.remove(name))
    }

    /// Saves a stage, keeping every other stage in the file.
    pub fn save_stage(&self, name: &str, record: &StageRecord) -> Result<(), StoreError> {
        self.merge(STAGES_FILE, name.to_string(), record.clone())
    }

    fn read<K, V>(&self, file: &str) -> Result<BTreeMap<K, V>, StoreError>
    where
        K: Ord + DeserializeOwned,
        V: DeserializeOwned,
    {
        let path = self.dir.join(file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    path = path.display().to_string(),
                    "No stored data yet, will create when saved."
                );
                return Ok(BTreeMap::new());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yml::from_str(&contents).map_err(|source| StoreError::Yaml { path, source })
    }

    fn merge<K, V>(&self, file: &str, key: K, value: V) -> Result<(), StoreError>
    where
        K: Ord + Serialize + DeserializeOwned,
        V: Serialize + DeserializeOwned,
    {
        let path = self.dir.join(file);
        let mut records = self.read::<K, V>(file)?;
        records.insert(key, value);

        let serialized = serde_yml::to_string(&records).map_err(|source| StoreError::Yaml {
            path: path.clone(),
            source,
        })?;
        let io_error = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        let tmp = path.with_extension("yml.tmp");
        fs::write(&tmp, serialized.as_bytes()).map_err(io_error)?;
        fs::rename(&tmp, &path).map_err(io_error)?;

        info!(
            path = path.display().to_string(),
            records = records.len(),
            "Wrote stored data."
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use super::*;

    fn scene(name: &str, x: f64, y: f64, z: f64, group: &str) -> SceneRecord {
        SceneRecord {
            name: name.to_string(),
            speed: 40.0,
            x,
            y,
            z,
            fixture_group: group.to_string(),
        }
    }

    #[test]
    fn test_missing_store_is_empty() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(&dir.path().join("data"));
        assert_eq!(None, store.scene(1)?);
        assert_eq!(None, store.stage("main")?);
        Ok(())
    }

    #[test]
    fn test_save_scene_and_reload() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        store.save_scene(3, &scene("opener", 4.0, 4.0, 2.0, "all"))?;
        store.save_scene(7, &scene("7", 1.0, 2.0, 5.0, "stage-left"))?;

        let reloaded = Store::new(dir.path()).scene(7)?.ok_or("scene 7 missing")?;
        assert_eq!((1.0, 2.0, 5.0), (reloaded.x, reloaded.y, reloaded.z));
        assert_eq!("stage-left", reloaded.fixture_group);
        assert_eq!(
            Some(scene("opener", 4.0, 4.0, 2.0, "all")),
            store.scene(3)?
        );
        assert!(!dir.path().join("scenes.yml.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_save_replaces_only_its_record() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(SCENES_FILE),
            "1:\n  name: intro\n  speed: 40\n  x: 1\n  y: 1\n  z: 5\n  fixture_group: all\n",
        )?;
        let store = Store::new(dir.path());
        store.save_scene(1, &scene("intro", 9.0, 1.0, 5.0, "all"))?;
        store.save_scene(2, &scene("second", 1.0, 1.0, 5.0, "all"))?;

        assert_eq!(Some(9.0), store.scene(1)?.map(|scene| scene.x));
        assert_eq!(Some(1.0), store.scene(2)?.map(|scene| scene.x));
        Ok(())
    }

    #[test]
    fn test_stage_records() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let calibration = Calibration {
            inverted: true,
            reversed: false,
            focus: Some(80),
            pan: 1000.0,
            tilt: 2000.0,
        };
        store.save_stage(
            "main",
            &StageRecord::from([("left".to_string(), calibration.clone())]),
        )?;
        store.save_stage("tour", &StageRecord::new())?;

        let main = store.stage("main")?.ok_or("main missing")?;
        assert_eq!(Some(&calibration), main.get("left"));
        assert_eq!(Some(StageRecord::new()), store.stage("tour")?);
        Ok(())
    }

    #[test]
    fn test_corrupt_store_is_an_error() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(SCENES_FILE), "[not, a, map")?;
        let store = Store::new(dir.path());
        assert!(matches!(store.scene(1), Err(StoreError::Yaml { .. })));
        Ok(())
    }
}

// Text source for the CSV resources and the group loaders built on it.
//
// The housing-cycle files are one logical group: every file is read before
// any of them is parsed, and a single failed read degrades the whole group to
// its empty shape. Macro series are independent and degrade one at a time.
use crate::config::DataPaths;
use crate::error::{IngestError, Result};
use crate::loader::{
    parse_affordability, parse_health_index, parse_lagging_model, parse_leading_model,
    parse_macro_series, parse_main_dataset, parse_omi_prices, parse_transactions_by_size,
};
use crate::merge::merge_side_datasets;
use crate::types::{HousingData, MacroData, OmiData};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

pub trait TextSource {
    fn fetch(&self, path: &Path) -> Result<Arc<str>>;
}

/// Reads UTF-8 files below `root`. Successful reads are memoized by path;
/// failures are not, so a later call retries.
pub struct FileSource {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl TextSource for FileSource {
    fn fetch(&self, path: &Path) -> Result<Arc<str>> {
        let full = self.root.join(path);
        if let Some(text) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&full)
        {
            return Ok(Arc::clone(text));
        }
        let text: Arc<str> = std::fs::read_to_string(&full)
            .map_err(|source| IngestError::Fetch {
                path: full.clone(),
                source,
            })?
            .into();
        log::debug!("read {} ({} bytes)", full.display(), text.len());
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(full, Arc::clone(&text));
        Ok(text)
    }
}

/// Load and merge the housing-cycle group.
///
/// All six texts are fetched first; if any fetch fails nothing is parsed and
/// the empty `HousingData` is returned.
pub fn load_housing_data(source: &impl TextSource, paths: &DataPaths) -> HousingData {
    match fetch_all(source, &paths.housing_group()) {
        Ok(texts) => {
            let [main, by_size, leading, lagging, affordability, health] = texts;
            let mut regional_data = parse_main_dataset(&main);
            merge_side_datasets(
                &mut regional_data,
                &parse_transactions_by_size(&by_size),
                &parse_leading_model(&leading),
            );
            let data = HousingData {
                regional_data,
                lagging_model_data: parse_lagging_model(&lagging),
                affordability_mutuo_90mq: parse_affordability(&affordability),
                health_index_data: parse_health_index(&health),
            };
            log::info!(
                "housing data: {} regions, {} lagging rows, {} affordability rows, {} health regions",
                data.regional_data.len(),
                data.lagging_model_data.len(),
                data.affordability_mutuo_90mq.len(),
                data.health_index_data.len()
            );
            data
        }
        Err(e) => {
            log::error!("housing data unavailable: {}", e);
            HousingData::default()
        }
    }
}

fn fetch_all<const N: usize>(source: &impl TextSource, paths: &[&PathBuf; N]) -> Result<[Arc<str>; N]> {
    let mut texts: Vec<Arc<str>> = Vec::with_capacity(N);
    for path in paths {
        texts.push(source.fetch(path)?);
    }
    texts.try_into().map_err(|_| {
        IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "fetched text count mismatch",
        ))
    })
}

/// Load every macro series that can be read; unreadable ones are left out.
pub fn load_macro_data(source: &impl TextSource, paths: &DataPaths) -> MacroData {
    paths
        .macro_series
        .iter()
        .filter_map(|(key, path)| match source.fetch(path) {
            Ok(text) => Some((key.to_string(), parse_macro_series(&text))),
            Err(e) => {
                log::error!("macro series '{}' unavailable: {}", key, e);
                None
            }
        })
        .collect()
}

pub fn load_omi_data(source: &impl TextSource, paths: &DataPaths) -> OmiData {
    match source.fetch(&paths.omi) {
        Ok(text) => parse_omi_prices(&text),
        Err(e) => {
            log::error!("OMI data unavailable: {}", e);
            OmiData::new()
        }
    }
}

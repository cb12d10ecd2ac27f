// Locations of the CSV resources, relative to the data directory.
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "Dati_Grafici";
pub const DATA_DIR_ENV: &str = "HOUSING_CYCLE_DATA_DIR";

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub main: PathBuf,
    pub by_size: PathBuf,
    pub leading: PathBuf,
    pub lagging: PathBuf,
    pub affordability: PathBuf,
    pub health_index: PathBuf,
    /// Series key -> file. Keys are the names the presentation layer uses.
    pub macro_series: Vec<(&'static str, PathBuf)>,
    pub omi: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        let macro_dir = PathBuf::from("Macro_data");
        Self {
            main: "dataset_transazioni_prezzi_per_regione_e_italia.csv".into(),
            by_size: "transazioni_per_regione_2011_2024_unico.csv".into(),
            leading: "risultati_modello_leading_zscore_shift.csv".into(),
            lagging: "risultati_modello_lagging.csv".into(),
            affordability: "affordability_mutuo_90mq.csv".into(),
            health_index: "risultati_indice_salute_mercato_immobiliare.csv".into(),
            macro_series: vec![
                ("cpi", macro_dir.join("CPI_Monthly_Dataset.csv")),
                ("punPsv", macro_dir.join("Dataset_PUN___PSV.csv")),
                ("gdpGrowth", macro_dir.join("GDP_Growth_Rates_2013_2025.csv")),
                (
                    "bondYield10Y",
                    macro_dir.join("Rendimenti_Titoli_di_Stato_10Y__dal_2019_.csv"),
                ),
                (
                    "interbankRates",
                    macro_dir.join("Tassi_Interbancari_USA_ed_Europa__Mensile_.csv"),
                ),
                ("commoditiesIndex", macro_dir.join("Commodities_Index_dal_2019.csv")),
            ],
            omi: "dati_completi_omi_2011_2024.csv".into(),
        }
    }
}

impl DataPaths {
    /// The six files that make up the housing-cycle group, in load order.
    pub fn housing_group(&self) -> [&PathBuf; 6] {
        [
            &self.main,
            &self.by_size,
            &self.leading,
            &self.lagging,
            &self.affordability,
            &self.health_index,
        ]
    }
}

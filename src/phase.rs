// Housing-cycle phase catalog and the classification thresholds.
use serde::Serialize;

/// Transaction-growth cut points (% year over year), from percentile analysis
/// of the historical series.
pub mod transaction_thresholds {
    pub const STRONG_POS: f64 = 20.13;
    pub const MILD_POS: f64 = 8.04;
    pub const MILD_NEG: f64 = -7.47;
    pub const STRONG_NEG: f64 = -13.35;
}

/// Real price-change cut points (% year over year).
pub mod price_thresholds {
    pub const STRONG_POS: f64 = 1.26;
    pub const MILD_POS: f64 = 0.20;
    pub const MILD_NEG: f64 = -1.75;
    pub const STRONG_NEG: f64 = -2.89;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Phase {
    Indeterminate = 0,
    Expansion = 1,
    Slowdown = 2,
    Contraction = 3,
    Recession = 4,
    Recovery = 5,
    NewExpansion = 6,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Indeterminate,
        Phase::Expansion,
        Phase::Slowdown,
        Phase::Contraction,
        Phase::Recession,
        Phase::Recovery,
        Phase::NewExpansion,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Phase> {
        Phase::ALL.get(id as usize).copied()
    }

    pub fn detail(self) -> &'static PhaseDetail {
        &PHASE_DETAILS[self as usize]
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDetail {
    pub id: u8,
    pub name: &'static str,
    pub short_name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl PhaseDetail {
    pub fn phase(&self) -> Phase {
        Phase::from_id(self.id).unwrap_or(Phase::Indeterminate)
    }
}

/// Indexed by `Phase as usize`.
pub static PHASE_DETAILS: [PhaseDetail; 7] = [
    PhaseDetail {
        id: 0,
        name: "Indeterminata",
        short_name: "INDET.",
        color: "#9E9E9E",
        description: "Dati insufficienti o segnali contrastanti.",
    },
    PhaseDetail {
        id: 1,
        name: "Espansione",
        short_name: "ESPANS.",
        color: "#C6FF00",
        description: "Aumento transazioni e prezzi, forte domanda.",
    },
    PhaseDetail {
        id: 2,
        name: "Rallentamento",
        short_name: "RALL.",
        color: "#FFC107",
        description: "Transazioni in calo/stasi, prezzi ancora su.",
    },
    PhaseDetail {
        id: 3,
        name: "Contrazione",
        short_name: "CONTR.",
        color: "#FF9800",
        description: "Calo transazioni, prezzi stabili/lieve calo.",
    },
    PhaseDetail {
        id: 4,
        name: "Recessione",
        short_name: "RECESS.",
        color: "#F44336",
        description: "Significativo calo transazioni e prezzi.",
    },
    PhaseDetail {
        id: 5,
        name: "Ripresa",
        short_name: "RIPRESA",
        color: "#4CAF50",
        description: "Transazioni in aumento, prezzi stabili/fine calo.",
    },
    PhaseDetail {
        id: 6,
        name: "Nuova Espansione",
        short_name: "N.ESPANS.",
        color: "#8BC34A",
        description: "Aumento consolidato, nuovo ciclo.",
    },
];

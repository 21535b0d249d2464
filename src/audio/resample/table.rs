//! Filter tables and quality selection.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use super::design::{self, DesignedFilter};
use crate::audio::constants::{
    LOW_BETA, LOW_NMULT, LOW_ROLLOFF, MEDIUM_BETA, MEDIUM_NMULT, MEDIUM_ROLLOFF, NA, NPC,
};
use crate::common::errors::ConfigError;

/// One wing of a symmetric low-pass impulse response plus its difference
/// table. Cloning shares the coefficient storage.
#[derive(Clone, PartialEq)]
pub struct FilterTable {
    nwing: u16,
    nmult: u16,
    imp: Arc<[i16]>,
    imp_d: Arc<[i16]>,
    lp_scl: u16,
}

impl FilterTable {
    /// Build a table from caller-supplied coefficients.
    ///
    /// `nwing` is the number of entries the kernels walk; it may be shorter
    /// than the coefficient slices but never longer.
    pub fn new(
        nwing: u16,
        nmult: u16,
        imp: Vec<i16>,
        imp_d: Vec<i16>,
        lp_scl: u16,
    ) -> Result<Self, ConfigError> {
        if imp.len() != imp_d.len() {
            return Err(ConfigError::InvalidTable(format!(
                "{} coefficients but {} differences",
                imp.len(),
                imp_d.len()
            )));
        }
        if nwing == 0 || usize::from(nwing) > imp.len() {
            return Err(ConfigError::InvalidTable(format!(
                "wing length {nwing} outside 1..={}",
                imp.len()
            )));
        }
        if nmult == 0 {
            return Err(ConfigError::InvalidTable("filter length must be positive".into()));
        }
        if lp_scl == 0 {
            return Err(ConfigError::InvalidTable("unity-gain scale must be positive".into()));
        }

        Ok(Self {
            nwing,
            nmult,
            imp: imp.into(),
            imp_d: imp_d.into(),
            lp_scl,
        })
    }

    /// Build a table from coefficients alone, deriving the difference table.
    pub fn from_coefficients(nmult: u16, imp: Vec<i16>, lp_scl: u16) -> Result<Self, ConfigError> {
        let nwing = u16::try_from(imp.len()).map_err(|_| {
            ConfigError::InvalidTable(format!("{} coefficients exceed the table limit", imp.len()))
        })?;
        let imp_d = design::differences(&imp)?;
        Self::new(nwing, nmult, imp, imp_d, lp_scl)
    }

    /// Design a Kaiser-windowed low-pass table.
    pub fn design(nmult: u16, rolloff: f64, beta: f64) -> Result<Self, ConfigError> {
        let DesignedFilter { imp, imp_d, lp_scl } = design::design(nmult, rolloff, beta)?;
        let nwing = imp.len() as u16;
        Self::new(nwing, nmult, imp, imp_d, lp_scl)
    }

    /// Short 13-tap table.
    pub fn low() -> Self {
        LOW_TABLE.clone()
    }

    /// Longer 21-tap table.
    pub fn medium() -> Self {
        MEDIUM_TABLE.clone()
    }

    pub fn nwing(&self) -> u16 {
        self.nwing
    }

    pub fn nmult(&self) -> u16 {
        self.nmult
    }

    pub fn imp(&self) -> &[i16] {
        &self.imp[..usize::from(self.nwing)]
    }

    pub fn imp_d(&self) -> &[i16] {
        &self.imp_d[..usize::from(self.nwing)]
    }

    pub fn lp_scl(&self) -> u16 {
        self.lp_scl
    }

    /// Most input frames one wing touches when the table is walked with a
    /// step of `dhb` (table entries `<< NA`) per input frame.
    pub fn wing_reach(&self, dhb: u32) -> usize {
        let span = usize::from(self.nwing) << NA;
        span.div_ceil(dhb.max(1) as usize)
    }

    /// Filter half-length in input frames, as used for the overlap reach.
    pub(crate) fn half_length(&self) -> f64 {
        (f64::from(self.nmult) + 1.0) / 2.0
    }
}

impl fmt::Debug for FilterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterTable")
            .field("nwing", &self.nwing)
            .field("nmult", &self.nmult)
            .field("lp_scl", &self.lp_scl)
            .field("periods", &(usize::from(self.nwing) / NPC))
            .finish()
    }
}

fn builtin(nmult: u16, rolloff: f64, beta: f64) -> FilterTable {
    // Fixed, known-good parameters: design cannot fail for them.
    FilterTable::design(nmult, rolloff, beta).unwrap_or_else(|e| {
        unreachable!("built-in filter table {nmult} taps failed to design: {e}")
    })
}

static LOW_TABLE: LazyLock<FilterTable> =
    LazyLock::new(|| builtin(LOW_NMULT, LOW_ROLLOFF, LOW_BETA));

static MEDIUM_TABLE: LazyLock<FilterTable> =
    LazyLock::new(|| builtin(MEDIUM_NMULT, MEDIUM_ROLLOFF, MEDIUM_BETA));

/// Data-less quality selector, as read from configuration or the command
/// line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Linear interpolation, no filter table.
    #[default]
    Basic,
    Low,
    Medium,
    /// Caller-supplied table.
    Custom,
}

impl FromStr for QualityLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "basic" => Ok(Self::Basic),
            "l" | "low" => Ok(Self::Low),
            "m" | "medium" => Ok(Self::Medium),
            "c" | "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::UnknownQuality(s.to_string())),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Resolved quality: each filtered variant carries its table.
#[derive(Debug, Clone, PartialEq)]
pub enum Quality {
    Basic,
    Low,
    Medium,
    Custom(FilterTable),
}

impl Quality {
    /// Combine a selector with an optional caller table.
    ///
    /// A supplied table overrides Low and Medium; Basic ignores it.
    pub fn resolve(level: QualityLevel, custom: Option<FilterTable>) -> Result<Self, ConfigError> {
        match (level, custom) {
            (QualityLevel::Basic, _) => Ok(Self::Basic),
            (_, Some(table)) => Ok(Self::Custom(table)),
            (QualityLevel::Low, None) => Ok(Self::Low),
            (QualityLevel::Medium, None) => Ok(Self::Medium),
            (QualityLevel::Custom, None) => Err(ConfigError::MissingCustomTable),
        }
    }

    pub fn level(&self) -> QualityLevel {
        match self {
            Self::Basic => QualityLevel::Basic,
            Self::Low => QualityLevel::Low,
            Self::Medium => QualityLevel::Medium,
            Self::Custom(_) => QualityLevel::Custom,
        }
    }

    /// Table bound by this quality, or `None` for linear interpolation.
    pub fn table(&self) -> Option<FilterTable> {
        match self {
            Self::Basic => None,
            Self::Low => Some(FilterTable::low()),
            Self::Medium => Some(FilterTable::medium()),
            Self::Custom(table) => Some(table.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::constants::UNIT_STEP;

    #[test]
    fn builtins_have_expected_reach() {
        let low = FilterTable::low();
        assert_eq!(low.nmult(), 13);
        assert_eq!(low.nwing(), 1536);
        assert_eq!(low.wing_reach(UNIT_STEP), 6);

        let medium = FilterTable::medium();
        assert_eq!(medium.nmult(), 21);
        assert_eq!(medium.nwing(), 2560);
        assert_eq!(medium.wing_reach(UNIT_STEP), 10);
        // Halving the step doubles the reach.
        assert_eq!(medium.wing_reach(UNIT_STEP / 2), 20);
    }

    #[test]
    fn builtins_are_shared() {
        let a = FilterTable::low();
        let b = FilterTable::low();
        assert!(Arc::ptr_eq(&a.imp, &b.imp));
    }

    #[test]
    fn rejects_inconsistent_tables() {
        assert!(matches!(
            FilterTable::new(2, 3, vec![1, 2, 3], vec![1, 1], 100),
            Err(ConfigError::InvalidTable(_))
        ));
        assert!(matches!(
            FilterTable::new(4, 3, vec![1, 2, 3], vec![1, 1, -3], 100),
            Err(ConfigError::InvalidTable(_))
        ));
        assert!(matches!(
            FilterTable::new(3, 3, vec![1, 2, 3], vec![1, 1, -3], 0),
            Err(ConfigError::InvalidTable(_))
        ));
        assert!(FilterTable::new(3, 3, vec![1, 2, 3], vec![1, 1, -3], 100).is_ok());
    }

    #[test]
    fn from_coefficients_derives_differences() {
        let t = FilterTable::from_coefficients(3, vec![10, 7, 4], 200).unwrap();
        assert_eq!(t.imp_d(), &[-3, -3, -4]);
        assert_eq!(t.nwing(), 3);
    }

    #[test]
    fn parses_selectors() {
        assert_eq!("b".parse::<QualityLevel>().unwrap(), QualityLevel::Basic);
        assert_eq!("L".parse::<QualityLevel>().unwrap(), QualityLevel::Low);
        assert_eq!("medium".parse::<QualityLevel>().unwrap(), QualityLevel::Medium);
        assert!(matches!(
            "q".parse::<QualityLevel>(),
            Err(ConfigError::UnknownQuality(s)) if s == "q"
        ));
    }

    #[test]
    fn resolve_quality() {
        let custom = FilterTable::from_coefficients(3, vec![10, 7, 4], 200).unwrap();

        assert_eq!(Quality::resolve(QualityLevel::Basic, Some(custom.clone())).unwrap(), Quality::Basic);
        assert_eq!(Quality::resolve(QualityLevel::Low, None).unwrap(), Quality::Low);
        assert_eq!(
            Quality::resolve(QualityLevel::Medium, Some(custom.clone())).unwrap(),
            Quality::Custom(custom.clone())
        );
        assert_eq!(
            Quality::resolve(QualityLevel::Custom, None),
            Err(ConfigError::MissingCustomTable)
        );
        assert!(Quality::Basic.table().is_none());
        assert_eq!(Quality::Custom(custom.clone()).table(), Some(custom));
    }
}
